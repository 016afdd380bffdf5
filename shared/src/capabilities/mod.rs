//! Effects the shell executes on the core's behalf.
//!
//! HTTP goes through `crux_http`, the persisted session through `crux_kv`.
//! Requests are built in [`crate::api`] and answered with the aliases below.

pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::error::KeyValueError;
pub use crux_kv::KeyValue;

// The Effect derive wires capabilities to this app type by name.
use crate::app::App;
use crate::event::Event;

/// What an HTTP request resolves to once the shell answers it.
pub type HttpResult = crux_http::Result<crux_http::Response<Vec<u8>>>;

/// A key-value read, or the value a write replaced.
pub type KvResult = Result<Option<Vec<u8>>, KeyValueError>;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub render: Render<Event>,
}
