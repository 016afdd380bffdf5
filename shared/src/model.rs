use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

use crate::config::ClientConfig;
use crate::error::Notification;
use crate::in_flight::InFlight;
use crate::repository::CaseRepository;
use crate::session::SessionStore;

/// Server-assigned case identifier (the backend's `_id`). Opaque and immutable.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A legal case record as the backend stores it.
///
/// The backend names the identifier `_id`; `id` is accepted when decoding
/// so fixtures and other backends can use either spelling.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Case {
    #[serde(rename = "_id", alias = "id")]
    pub id: CaseId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl Case {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: CaseId::new(id),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// The "new case" form. Sent as the POST body verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseDraft {
    pub title: String,
    pub content: String,
}

impl CaseDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.content.is_empty()
    }

    pub fn set(&mut self, field: CaseField, value: String) {
        match field {
            CaseField::Title => self.title = value,
            CaseField::Content => self.content = value,
        }
    }
}

/// A local copy of one case open in the edit overlay. Never touches the
/// case list until the server acknowledges the update.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct EditDraft {
    pub id: CaseId,
    pub title: String,
    pub content: String,
}

impl EditDraft {
    pub fn from_case(case: &Case) -> Self {
        Self {
            id: case.id.clone(),
            title: case.title.clone(),
            content: case.content.clone(),
        }
    }

    pub fn set(&mut self, field: CaseField, value: String) {
        match field {
            CaseField::Title => self.title = value,
            CaseField::Content => self.content = value,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseField {
    Title,
    Content,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthField {
    Username,
    Password,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub username: String,
    pub password: String,
}

impl AuthForm {
    pub fn set(&mut self, field: AuthField, value: String) {
        match field {
            AuthField::Username => self.username = value,
            AuthField::Password => self.password = value,
        }
    }

    /// Wipes the typed password from memory.
    pub fn clear_password(&mut self) {
        self.password.zeroize();
    }
}

// Never print the password.
impl fmt::Debug for AuthForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthForm")
            .field("mode", &self.mode)
            .field("username", &self.username)
            .field("password_present", &!self.password.is_empty())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: ClientConfig,
    pub session: SessionStore,
    pub repository: CaseRepository,
    pub in_flight: InFlight,

    // Forms
    pub auth_form: AuthForm,
    pub new_case: CaseDraft,
    pub editing: Option<EditDraft>,

    pub notification: Option<Notification>,

    /// Set once `BackendConfigured` succeeds; environment overrides then
    /// no longer apply.
    pub configured_by_shell: bool,
}

impl Model {
    pub fn is_authenticated(&self) -> bool {
        self.session.credential().is_some()
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
    }

    /// Drops everything that belonged to the previous session.
    pub fn reset_session_state(&mut self) {
        self.repository.clear();
        self.in_flight.reset();
        self.new_case = CaseDraft::default();
        self.editing = None;
    }
}
