//! Binds the new-case and edit drafts to repository requests.
//!
//! Drafts are only ever cleared by a successful acknowledgment, and only if
//! the user has not changed them since they were submitted.

use tracing::{debug, info, instrument, warn};

use crate::api::{into_body, ApiClient};
use crate::capabilities::{Capabilities, HttpResult};
use crate::error::{ApiError, FetchError, MutationError, Notification};
use crate::in_flight::{Admission, OpKind, ResourceKey, Ticket};
use crate::model::{CaseDraft, CaseField, CaseId, EditDraft, Model};
use crate::repository::CaseRepository;

pub const FETCH_FAILURE: &str = "Error fetching cases";
pub const CREATE_FAILURE: &str = "Error adding case";
pub const UPDATE_FAILURE: &str = "Error editing case";
pub const DELETE_FAILURE: &str = "Error deleting case";

// ===== Refresh =====

pub fn refresh(model: &mut Model, caps: &Capabilities) {
    if !model.is_authenticated() {
        debug!("refresh blocked, not signed in");
        notify_fetch_error(model, &FetchError::NotAuthenticated);
        return;
    }

    let ticket = match model.in_flight.admit(OpKind::Refresh, ResourceKey::CaseList) {
        Admission::Admitted(ticket) => ticket,
        Admission::Superseded { ticket, .. } => {
            debug!("older refresh superseded");
            ticket
        }
        Admission::Rejected { in_flight } => {
            debug!(%in_flight, "refresh rejected");
            return;
        }
    };

    let sent = {
        let api = ApiClient::new(&caps.http, &model.config, model.session.credential());
        CaseRepository::refresh(&api, ticket)
    };

    if let Err(e) = sent {
        model.in_flight.abandon(&ResourceKey::CaseList, ticket);
        notify_fetch_error(model, &FetchError::Transport(e));
    }
}

#[instrument(skip_all)]
pub fn on_fetched(model: &mut Model, ticket: Ticket, result: HttpResult) {
    if !model
        .in_flight
        .complete(OpKind::Refresh, &ResourceKey::CaseList, ticket)
    {
        debug!(?ticket, "stale case list dropped");
        return;
    }

    let outcome = into_body(result)
        .map_err(FetchError::Transport)
        .and_then(|body| model.repository.on_refreshed(&body));

    match outcome {
        Ok(count) => info!(count, "cases refreshed"),
        Err(e) => notify_fetch_error(model, &e),
    }
}

// ===== Create =====

pub fn set_new_case_field(model: &mut Model, field: CaseField, value: String) {
    model.new_case.set(field, value);
}

pub fn submit_new_case(model: &mut Model, caps: &Capabilities) {
    let ticket = match admit(model, OpKind::Create, ResourceKey::NewCase) {
        Ok(ticket) => ticket,
        Err(e) => return notify_mutation_error(model, CREATE_FAILURE, &e),
    };

    let draft = model.new_case.clone();
    let sent = {
        let api = ApiClient::new(&caps.http, &model.config, model.session.credential());
        CaseRepository::create(&api, ticket, draft)
    };

    if let Err(e) = sent {
        abandon(model, &ResourceKey::NewCase, ticket, CREATE_FAILURE, e);
    }
}

#[instrument(skip_all)]
pub fn on_created(model: &mut Model, ticket: Ticket, submitted: &CaseDraft, result: HttpResult) {
    if !model
        .in_flight
        .complete(OpKind::Create, &ResourceKey::NewCase, ticket)
    {
        debug!(?ticket, "stale create acknowledgment dropped");
        return;
    }

    let outcome = into_body(result)
        .map_err(MutationError::Transport)
        .and_then(|body| model.repository.on_created(&body));

    match outcome {
        Ok(case) => {
            info!(id = %case.id, "case added");
            if &model.new_case == submitted {
                model.new_case = CaseDraft::default();
            } else {
                debug!("new case draft changed since submit, keeping it");
            }
        }
        Err(e) => notify_mutation_error(model, CREATE_FAILURE, &e),
    }
}

// ===== Edit =====

pub fn start_edit(model: &mut Model, id: &CaseId) {
    match model.repository.get(id) {
        Some(case) => model.editing = Some(EditDraft::from_case(case)),
        None => {
            warn!(%id, "cannot edit a case that is not in the list");
            notify_mutation_error(model, UPDATE_FAILURE, &MutationError::NoDraft);
        }
    }
}

pub fn set_edit_field(model: &mut Model, field: CaseField, value: String) {
    match model.editing.as_mut() {
        Some(draft) => draft.set(field, value),
        None => debug!("edit field changed with no case open"),
    }
}

pub fn cancel_edit(model: &mut Model) {
    model.editing = None;
}

pub fn submit_edit(model: &mut Model, caps: &Capabilities) {
    let Some(draft) = model.editing.clone() else {
        return notify_mutation_error(model, UPDATE_FAILURE, &MutationError::NoDraft);
    };

    let resource = ResourceKey::Case(draft.id.clone());
    let ticket = match admit(model, OpKind::Update, resource.clone()) {
        Ok(ticket) => ticket,
        Err(e) => return notify_mutation_error(model, UPDATE_FAILURE, &e),
    };

    let sent = {
        let api = ApiClient::new(&caps.http, &model.config, model.session.credential());
        CaseRepository::update(&api, ticket, draft)
    };

    if let Err(e) = sent {
        abandon(model, &resource, ticket, UPDATE_FAILURE, e);
    }
}

#[instrument(skip_all, fields(id = %submitted.id))]
pub fn on_updated(model: &mut Model, ticket: Ticket, submitted: &EditDraft, result: HttpResult) {
    let resource = ResourceKey::Case(submitted.id.clone());
    if !model.in_flight.complete(OpKind::Update, &resource, ticket) {
        apply_superseded_update(model, ticket, submitted, result);
        return;
    }

    let outcome = into_body(result)
        .map_err(MutationError::Transport)
        .and_then(|body| model.repository.on_updated(submitted, &body));

    match outcome {
        Ok(_) => {
            info!("case updated");
            if model.editing.as_ref() == Some(submitted) {
                model.editing = None;
            } else {
                debug!("edit draft changed since submit, keeping it open");
            }
        }
        Err(e) => notify_mutation_error(model, UPDATE_FAILURE, &e),
    }
}

/// A delete can supersede a pending update of the same case. The server may
/// still have applied that update, and if the delete then fails the list
/// must show the acknowledged values. Acks from an older session, or for a
/// case the list no longer holds, are dropped.
fn apply_superseded_update(
    model: &mut Model,
    ticket: Ticket,
    submitted: &EditDraft,
    result: HttpResult,
) {
    if ticket.epoch != model.in_flight.epoch() || model.repository.get(&submitted.id).is_none() {
        debug!(?ticket, "stale update acknowledgment dropped");
        return;
    }

    match into_body(result).map_err(MutationError::Transport) {
        Ok(body) => match model.repository.on_updated(submitted, &body) {
            Ok(_) => debug!("superseded update applied to the list"),
            Err(e) => debug!(error = %e, "superseded update acknowledgment unreadable"),
        },
        Err(e) => debug!(error = %e, "superseded update failed"),
    }
}

// ===== Delete =====

pub fn delete(model: &mut Model, caps: &Capabilities, id: CaseId) {
    let resource = ResourceKey::Case(id.clone());
    let ticket = match admit(model, OpKind::Delete, resource.clone()) {
        Ok(ticket) => ticket,
        Err(e) => return notify_mutation_error(model, DELETE_FAILURE, &e),
    };

    let sent = {
        let api = ApiClient::new(&caps.http, &model.config, model.session.credential());
        CaseRepository::remove(&api, ticket, id)
    };

    if let Err(e) = sent {
        abandon(model, &resource, ticket, DELETE_FAILURE, e);
    }
}

#[instrument(skip_all, fields(id = %id))]
pub fn on_deleted(model: &mut Model, ticket: Ticket, id: &CaseId, result: HttpResult) {
    let resource = ResourceKey::Case(id.clone());
    if !model.in_flight.complete(OpKind::Delete, &resource, ticket) {
        debug!(?ticket, "stale delete acknowledgment dropped");
        return;
    }

    // A 404 means the server no longer has the case, which is the state a
    // delete asks for.
    let outcome = match into_body(result) {
        Err(ApiError::Status { status: 404, .. }) => {
            debug!("case already gone on the server");
            Ok(())
        }
        other => other.map(|_| ()),
    };

    match outcome {
        Ok(()) => {
            let existed = model.repository.on_removed(id);
            info!(existed, "case deleted");
            if model.editing.as_ref().is_some_and(|d| &d.id == id) {
                model.editing = None;
            }
        }
        Err(e) => notify_mutation_error(model, DELETE_FAILURE, &MutationError::Transport(e)),
    }
}

// ===== Helpers =====

fn admit(model: &mut Model, kind: OpKind, resource: ResourceKey) -> Result<Ticket, MutationError> {
    if !model.is_authenticated() {
        debug!(%kind, "mutation blocked, not signed in");
        return Err(MutationError::NotAuthenticated);
    }

    match model.in_flight.admit(kind, resource) {
        Admission::Admitted(ticket) => Ok(ticket),
        Admission::Superseded { ticket, previous } => {
            debug!(%kind, %previous, "pending request superseded");
            Ok(ticket)
        }
        Admission::Rejected { in_flight } => {
            debug!(%kind, %in_flight, "mutation rejected");
            Err(MutationError::Duplicate {
                operation: in_flight,
            })
        }
    }
}

fn abandon(
    model: &mut Model,
    resource: &ResourceKey,
    ticket: Ticket,
    context: &str,
    error: ApiError,
) {
    model.in_flight.abandon(resource, ticket);
    notify_mutation_error(model, context, &MutationError::Transport(error));
}

fn notify_fetch_error(model: &mut Model, error: &FetchError) {
    warn!(error = %error, "case fetch failed");
    model.notify(Notification::failure(
        FETCH_FAILURE,
        &error.user_facing_message(),
    ));
}

fn notify_mutation_error(model: &mut Model, context: &str, error: &MutationError) {
    warn!(error = %error, context, "case mutation failed");
    model.notify(Notification::failure(context, &error.user_facing_message()));
}
