use serde::{Deserialize, Serialize};

use crate::error::Notification;
use crate::in_flight::{OpKind, ResourceKey};
use crate::model::{AuthMode, Case, CaseDraft, EditDraft, Model};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CaseView {
    pub id: String,
    pub title: String,
    pub content: String,
    /// Update or delete currently waiting on the server.
    pub pending: Option<OpKind>,
}

impl CaseView {
    fn new(case: &Case, pending: Option<OpKind>) -> Self {
        Self {
            id: case.id.to_string(),
            title: case.title.clone(),
            content: case.content.clone(),
            pending,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ViewState {
    /// The persisted session has not been read yet.
    Restoring,
    Anonymous {
        mode: AuthMode,
        username: String,
        has_password: bool,
        busy: bool,
    },
    Authenticated {
        cases: Vec<CaseView>,
        new_case: CaseDraft,
        editing: Option<EditDraft>,
        refreshing: bool,
        creating: bool,
        saving: bool,
    },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ViewModel {
    pub state: ViewState,
    pub notification: Option<Notification>,
    /// How long the shell should let each HTTP request run before failing it
    /// with a timeout.
    pub request_timeout_ms: u64,
}

impl ViewModel {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, ViewState::Authenticated { .. })
    }
}

impl From<&Model> for ViewModel {
    fn from(model: &Model) -> Self {
        let state = if model.is_authenticated() {
            authenticated(model)
        } else if model.session.is_restored() {
            ViewState::Anonymous {
                mode: model.auth_form.mode,
                username: model.auth_form.username.clone(),
                has_password: !model.auth_form.password.is_empty(),
                busy: model.in_flight.pending_kind(&ResourceKey::Session).is_some(),
            }
        } else {
            ViewState::Restoring
        };

        Self {
            state,
            notification: model.notification.clone(),
            request_timeout_ms: model.config.request_timeout_ms,
        }
    }
}

fn authenticated(model: &Model) -> ViewState {
    let cases = model
        .repository
        .cases()
        .iter()
        .map(|case| {
            let pending = model
                .in_flight
                .pending_kind(&ResourceKey::Case(case.id.clone()));
            CaseView::new(case, pending)
        })
        .collect();

    let saving = model.editing.as_ref().is_some_and(|draft| {
        model
            .in_flight
            .is_pending(OpKind::Update, &ResourceKey::Case(draft.id.clone()))
    });

    ViewState::Authenticated {
        cases,
        new_case: model.new_case.clone(),
        editing: model.editing.clone(),
        refreshing: model
            .in_flight
            .is_pending(OpKind::Refresh, &ResourceKey::CaseList),
        creating: model
            .in_flight
            .is_pending(OpKind::Create, &ResourceKey::NewCase),
        saving,
    }
}
