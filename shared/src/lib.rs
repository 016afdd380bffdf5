//! Shared core for the casebook client.
//!
//! Keeps the session credential, the local case list and the edit drafts in
//! step with the REST backend. Platform shells render [`ViewModel`] and
//! execute the HTTP and key-value effects this core requests.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]

pub mod api;
pub mod app;
pub mod auth;
pub mod capabilities;
pub mod cases;
pub mod config;
pub mod error;
pub mod event;
pub mod in_flight;
pub mod model;
pub mod repository;
pub mod session;
pub mod view;

pub use api::{ApiClient, ApiPath};
pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{BaseUrl, ClientConfig};
pub use error::{ApiError, AuthError, ConfigError, FetchError, MutationError, Notification, NotificationKind};
pub use event::Event;
pub use model::{AuthField, AuthMode, Case, CaseDraft, CaseField, CaseId, EditDraft, Model};
pub use view::{CaseView, ViewModel, ViewState};

pub use crux_core::{render::Render, App as CruxApp, Core};
