use serde::{Deserialize, Serialize};

use crate::capabilities::{HttpResult, KvResult};
use crate::in_flight::Ticket;
use crate::model::{AuthField, CaseDraft, CaseField, CaseId, EditDraft};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum Event {
    // ===== Lifecycle =====
    /// Shell is up; restore the persisted session.
    Started,
    BackendConfigured {
        base_url: String,
        request_timeout_ms: Option<u64>,
    },

    // ===== Authentication =====
    AuthFieldChanged {
        field: AuthField,
        value: String,
    },
    AuthModeToggled,
    AuthSubmitted,
    LogoutRequested,

    // ===== Cases =====
    RefreshRequested,
    NewCaseFieldChanged {
        field: CaseField,
        value: String,
    },
    CreateSubmitted,
    EditStarted {
        id: CaseId,
    },
    EditFieldChanged {
        field: CaseField,
        value: String,
    },
    EditSubmitted,
    EditCancelled,
    DeleteRequested {
        id: CaseId,
    },

    NotificationDismissed,

    // ===== Capability responses (never sent by the shell) =====
    #[serde(skip)]
    SessionRestored(KvResult),
    #[serde(skip)]
    SessionPersisted(KvResult),
    #[serde(skip)]
    SessionCleared(KvResult),
    #[serde(skip)]
    LoginResponse { ticket: Ticket, result: HttpResult },
    #[serde(skip)]
    RegisterResponse { ticket: Ticket, result: HttpResult },
    #[serde(skip)]
    CasesFetched { ticket: Ticket, result: HttpResult },
    #[serde(skip)]
    CaseCreated {
        ticket: Ticket,
        submitted: CaseDraft,
        result: HttpResult,
    },
    #[serde(skip)]
    CaseUpdated {
        ticket: Ticket,
        submitted: EditDraft,
        result: HttpResult,
    },
    #[serde(skip)]
    CaseDeleted {
        ticket: Ticket,
        id: CaseId,
        result: HttpResult,
    },
}

impl Event {
    /// Stable name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::BackendConfigured { .. } => "backend_configured",
            Self::AuthFieldChanged { .. } => "auth_field_changed",
            Self::AuthModeToggled => "auth_mode_toggled",
            Self::AuthSubmitted => "auth_submitted",
            Self::LogoutRequested => "logout_requested",
            Self::RefreshRequested => "refresh_requested",
            Self::NewCaseFieldChanged { .. } => "new_case_field_changed",
            Self::CreateSubmitted => "create_submitted",
            Self::EditStarted { .. } => "edit_started",
            Self::EditFieldChanged { .. } => "edit_field_changed",
            Self::EditSubmitted => "edit_submitted",
            Self::EditCancelled => "edit_cancelled",
            Self::DeleteRequested { .. } => "delete_requested",
            Self::NotificationDismissed => "notification_dismissed",
            Self::SessionRestored(_) => "session_restored",
            Self::SessionPersisted(_) => "session_persisted",
            Self::SessionCleared(_) => "session_cleared",
            Self::LoginResponse { .. } => "login_response",
            Self::RegisterResponse { .. } => "register_response",
            Self::CasesFetched { .. } => "cases_fetched",
            Self::CaseCreated { .. } => "case_created",
            Self::CaseUpdated { .. } => "case_updated",
            Self::CaseDeleted { .. } => "case_deleted",
        }
    }

    /// True for events produced by capability responses rather than the user.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::SessionRestored(_)
                | Self::SessionPersisted(_)
                | Self::SessionCleared(_)
                | Self::LoginResponse { .. }
                | Self::RegisterResponse { .. }
                | Self::CasesFetched { .. }
                | Self::CaseCreated { .. }
                | Self::CaseUpdated { .. }
                | Self::CaseDeleted { .. }
        )
    }
}
