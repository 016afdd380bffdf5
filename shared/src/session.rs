//! The active credential and its durable copy.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::capabilities::{KeyValue, KvResult};
use crate::event::Event;

/// Storage key of the persisted token.
pub const TOKEN_KEY: &str = "session:token";

/// Opaque token issued by `/login` and sent back as a header.
///
/// Never empty and always printable ASCII. `Debug` is redacted and the
/// buffer is wiped on drop.
#[derive(Debug)]
pub struct Credential(SecretString);

impl Credential {
    /// Returns `None` for a blank token or one that cannot travel in a
    /// header value.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_graphic()) {
            return None;
        }
        Some(Self(SecretString::new(token)))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

#[derive(Debug, Default)]
pub struct SessionStore {
    credential: Option<Credential>,
    restored: bool,
    // Set by a login or logout after the startup read was issued. The read
    // then describes an older session and is discarded.
    changed_since_restore: bool,
}

impl SessionStore {
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// True once the startup read has resolved, whatever its outcome.
    pub fn is_restored(&self) -> bool {
        self.restored
    }

    pub fn restore(&mut self, kv: &KeyValue<Event>) {
        self.changed_since_restore = false;
        kv.get(TOKEN_KEY.to_string(), Event::SessionRestored);
    }

    /// Adopts the persisted token, if any. Storage failures, a missing key
    /// and unreadable or empty values all leave the session anonymous.
    ///
    /// Returns true when a credential was restored.
    pub fn on_restored(&mut self, result: KvResult) -> bool {
        self.restored = true;

        if self.changed_since_restore || self.credential.is_some() {
            debug!("session changed while restoring, ignoring persisted token");
            return false;
        }

        let bytes = match result {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("no persisted session");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "session restore failed, continuing anonymously");
                return false;
            }
        };

        let Ok(token) = String::from_utf8(bytes) else {
            warn!("persisted session token is not UTF-8, ignoring it");
            return false;
        };

        match Credential::new(token) {
            Some(credential) => {
                info!("session restored");
                self.credential = Some(credential);
                true
            }
            None => {
                debug!("persisted session token is empty or unusable");
                false
            }
        }
    }

    /// Activates `credential` and writes it through to durable storage.
    pub fn set_credential(&mut self, credential: Credential, kv: &KeyValue<Event>) {
        let bytes = credential.expose().as_bytes().to_vec();
        self.credential = Some(credential);
        self.changed_since_restore = true;
        kv.set(TOKEN_KEY.to_string(), bytes, Event::SessionPersisted);
    }

    /// Forgets the active credential and deletes the durable copy.
    pub fn clear(&mut self, kv: &KeyValue<Event>) {
        self.credential = None;
        self.changed_since_restore = true;
        kv.delete(TOKEN_KEY.to_string(), Event::SessionCleared);
    }

    /// Write failures only cost persistence across restarts; the in-memory
    /// session stays as set.
    pub fn on_persisted(result: &KvResult) {
        match result {
            Ok(_) => debug!("session persisted"),
            Err(e) => warn!(error = %e, "failed to persist session"),
        }
    }

    pub fn on_cleared(result: &KvResult) {
        match result {
            Ok(_) => debug!("persisted session removed"),
            Err(e) => warn!(error = %e, "failed to remove persisted session"),
        }
    }
}
