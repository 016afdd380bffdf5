mod common;

use assert_matches::assert_matches;
use common::*;
use shared::api::AUTH_HEADER;
use shared::in_flight::ResourceKey;
use shared::{Case, CaseDraft, CaseField, CaseId, EditDraft, Event, Model};

fn signed_in(cases: serde_json::Value) -> (Tester, Model) {
    let app = Tester::default();
    let mut model = Model::default();
    start_anonymous(&app, &mut model);
    sign_in(&app, &mut model, "tok123", cases);
    model.notification = None;
    (app, model)
}

fn one_case() -> serde_json::Value {
    serde_json::json!([{"_id": "1", "title": "A", "content": "x"}])
}

fn type_new_case(app: &Tester, model: &mut Model, title: &str, content: &str) {
    app.update(
        Event::NewCaseFieldChanged {
            field: CaseField::Title,
            value: title.into(),
        },
        model,
    );
    app.update(
        Event::NewCaseFieldChanged {
            field: CaseField::Content,
            value: content.into(),
        },
        model,
    );
}

fn edit_title(app: &Tester, model: &mut Model, id: &str, title: &str) {
    app.update(Event::EditStarted { id: CaseId::new(id) }, model);
    app.update(
        Event::EditFieldChanged {
            field: CaseField::Title,
            value: title.into(),
        },
        model,
    );
}

fn send(app: &Tester, model: &mut Model, event: Event) -> HttpCall {
    single_http(app.update(event, model).effects)
}

fn delete(app: &Tester, model: &mut Model, id: &str) -> HttpCall {
    send(app, model, Event::DeleteRequested { id: CaseId::new(id) })
}

#[test]
fn create_appends_the_server_case_and_resets_the_draft() {
    let (app, mut model) = signed_in(one_case());
    type_new_case(&app, &mut model, "New", "Body");

    let mut create = send(&app, &mut model, Event::CreateSubmitted);
    assert_eq!(create.operation.method, "POST");
    assert_eq!(create.operation.url, "http://localhost:5002/api/cases");
    assert_eq!(header(&create.operation, AUTH_HEADER), Some("tok123"));
    assert_eq!(
        body_json(&create.operation),
        serde_json::json!({"title": "New", "content": "Body"})
    );
    // Nothing changes until the server answers.
    assert_eq!(model.repository.len(), 1);

    respond(
        &app,
        &mut model,
        &mut create,
        json(201, serde_json::json!({"_id": "2", "title": "New", "content": "Body"})),
    );

    assert_eq!(model.repository.len(), 2);
    assert_eq!(
        model.repository.cases().last(),
        Some(&Case::new("2", "New", "Body"))
    );
    assert_eq!(model.new_case, CaseDraft::default());
}

#[test]
fn failed_create_keeps_draft_and_list() {
    let (app, mut model) = signed_in(one_case());
    type_new_case(&app, &mut model, "New", "Body");
    let mut create = send(&app, &mut model, Event::CreateSubmitted);

    respond(&app, &mut model, &mut create, text(500, "Server Error"));

    assert_eq!(model.new_case, CaseDraft::new("New", "Body"));
    assert_eq!(model.repository.cases(), &[Case::new("1", "A", "x")]);
    assert_eq!(
        model.notification.unwrap().message,
        "Error adding case: Server Error"
    );
}

#[test]
fn draft_edited_after_submit_survives_success() {
    let (app, mut model) = signed_in(serde_json::json!([]));
    type_new_case(&app, &mut model, "New", "Body");
    let mut create = send(&app, &mut model, Event::CreateSubmitted);
    type_new_case(&app, &mut model, "Next", "Draft");

    respond(
        &app,
        &mut model,
        &mut create,
        ok_json(serde_json::json!({"_id": "2", "title": "New", "content": "Body"})),
    );

    assert_eq!(model.repository.len(), 1);
    assert_eq!(model.new_case, CaseDraft::new("Next", "Draft"));
}

#[test]
fn double_create_is_rejected() {
    let (app, mut model) = signed_in(serde_json::json!([]));
    type_new_case(&app, &mut model, "New", "Body");

    app.update(Event::CreateSubmitted, &mut model);
    let update = app.update(Event::CreateSubmitted, &mut model);

    assert!(http_requests(&update.effects).is_empty());
    assert_eq!(
        model.notification.unwrap().message,
        "Error adding case: Please wait for the current request to finish."
    );
}

#[test]
fn update_replaces_the_case_and_closes_the_overlay() {
    let (app, mut model) = signed_in(serde_json::json!([
        {"_id": "1", "title": "A", "content": "x"},
        {"_id": "2", "title": "B", "content": "y"},
    ]));

    app.update(Event::EditStarted { id: CaseId::new("1") }, &mut model);
    assert_eq!(
        model.editing,
        Some(EditDraft::from_case(&Case::new("1", "A", "x")))
    );

    edit_title(&app, &mut model, "1", "A2");
    // Editing never touches the list.
    assert_eq!(model.repository.cases()[0].title, "A");

    let mut update = send(&app, &mut model, Event::EditSubmitted);
    assert_eq!(update.operation.method, "PUT");
    assert_eq!(update.operation.url, "http://localhost:5002/api/cases/1");
    assert_eq!(
        body_json(&update.operation),
        serde_json::json!({"_id": "1", "title": "A2", "content": "x"})
    );

    respond(
        &app,
        &mut model,
        &mut update,
        ok_json(serde_json::json!({"_id": "1", "title": "A2", "content": "x"})),
    );

    assert_eq!(
        model.repository.cases(),
        &[Case::new("1", "A2", "x"), Case::new("2", "B", "y")]
    );
    assert!(model.editing.is_none());
}

#[test]
fn failed_update_keeps_overlay_and_list() {
    let (app, mut model) = signed_in(one_case());
    app.update(Event::EditStarted { id: CaseId::new("1") }, &mut model);
    app.update(
        Event::EditFieldChanged {
            field: CaseField::Content,
            value: "changed".into(),
        },
        &mut model,
    );
    let mut update = send(&app, &mut model, Event::EditSubmitted);
    let submitted = model.editing.clone().unwrap();

    respond(
        &app,
        &mut model,
        &mut update,
        failed(crux_http::HttpError::Io("connection refused".into())),
    );

    assert_eq!(model.editing, Some(submitted));
    assert_eq!(model.repository.cases(), &[Case::new("1", "A", "x")]);
    assert!(model
        .notification
        .unwrap()
        .message
        .starts_with("Error editing case: Unable to reach the server"));
}

#[test]
fn second_update_of_the_same_case_is_rejected() {
    let (app, mut model) = signed_in(one_case());
    app.update(Event::EditStarted { id: CaseId::new("1") }, &mut model);
    app.update(Event::EditSubmitted, &mut model);

    let update = app.update(Event::EditSubmitted, &mut model);
    assert!(http_requests(&update.effects).is_empty());
    assert!(model.editing.is_some());
}

#[test]
fn cancel_discards_the_edit_draft() {
    let (app, mut model) = signed_in(one_case());
    edit_title(&app, &mut model, "1", "Discarded");
    app.update(Event::EditCancelled, &mut model);

    assert!(model.editing.is_none());
    assert_eq!(model.repository.cases(), &[Case::new("1", "A", "x")]);
}

#[test]
fn remove_drops_the_case() {
    let (app, mut model) = signed_in(serde_json::json!([
        {"_id": "1", "title": "A", "content": "x"},
        {"_id": "2", "title": "B", "content": "y"},
    ]));

    let mut remove = delete(&app, &mut model, "1");
    assert_eq!(remove.operation.method, "DELETE");
    assert_eq!(remove.operation.url, "http://localhost:5002/api/cases/1");
    assert!(remove.operation.body.is_empty());

    respond(
        &app,
        &mut model,
        &mut remove,
        ok_json(serde_json::json!({"message": "Case deleted"})),
    );

    assert_eq!(model.repository.len(), 1);
    assert!(model.repository.get(&CaseId::new("1")).is_none());
}

#[test]
fn removing_an_unknown_case_succeeds() {
    let (app, mut model) = signed_in(one_case());
    let mut remove = delete(&app, &mut model, "42");

    respond(&app, &mut model, &mut remove, text(200, ""));

    assert_eq!(model.repository.cases(), &[Case::new("1", "A", "x")]);
    assert!(model.notification.is_none());
}

#[test]
fn delete_of_a_case_the_server_already_lost_removes_it() {
    let (app, mut model) = signed_in(one_case());
    let mut remove = delete(&app, &mut model, "1");

    respond(&app, &mut model, &mut remove, text(404, "Case not found"));

    assert!(model.repository.is_empty());
    assert!(model.notification.is_none());
}

#[test]
fn failed_delete_keeps_the_case() {
    let (app, mut model) = signed_in(one_case());
    let mut remove = delete(&app, &mut model, "1");

    respond(&app, &mut model, &mut remove, text(500, "Server Error"));

    assert_eq!(model.repository.len(), 1);
    assert_eq!(
        model.notification.unwrap().message,
        "Error deleting case: Server Error"
    );
}

#[test]
fn delete_supersedes_a_pending_update() {
    let (app, mut model) = signed_in(one_case());
    app.update(Event::EditStarted { id: CaseId::new("1") }, &mut model);
    let mut update = send(&app, &mut model, Event::EditSubmitted);
    let mut remove = delete(&app, &mut model, "1");

    respond(
        &app,
        &mut model,
        &mut remove,
        ok_json(serde_json::json!({"message": "Case deleted"})),
    );
    assert!(model.repository.is_empty());
    assert!(model.editing.is_none());

    // The update landed late; it must not resurrect the case.
    respond(
        &app,
        &mut model,
        &mut update,
        ok_json(serde_json::json!({"_id": "1", "title": "A", "content": "x"})),
    );
    assert!(model.repository.is_empty());
}

#[test]
fn superseded_update_still_lands_when_the_delete_fails() {
    let (app, mut model) = signed_in(one_case());
    edit_title(&app, &mut model, "1", "A2");
    let mut update = send(&app, &mut model, Event::EditSubmitted);
    let mut remove = delete(&app, &mut model, "1");

    respond(
        &app,
        &mut model,
        &mut update,
        ok_json(serde_json::json!({"_id": "1", "title": "A2", "content": "x"})),
    );
    respond(&app, &mut model, &mut remove, text(500, "Server Error"));

    assert_eq!(model.repository.cases(), &[Case::new("1", "A2", "x")]);
    assert_eq!(
        model.notification.unwrap().message,
        "Error deleting case: Server Error"
    );
}

#[test]
fn superseded_update_that_failed_leaves_the_case_alone() {
    let (app, mut model) = signed_in(one_case());
    edit_title(&app, &mut model, "1", "A2");
    let mut update = send(&app, &mut model, Event::EditSubmitted);
    let mut remove = delete(&app, &mut model, "1");

    respond(&app, &mut model, &mut update, text(500, "Server Error"));
    assert!(model.notification.is_none());
    respond(&app, &mut model, &mut remove, text(500, "Server Error"));

    assert_eq!(model.repository.cases(), &[Case::new("1", "A", "x")]);
}

#[test]
fn edits_are_rejected_while_a_delete_is_pending() {
    let (app, mut model) = signed_in(one_case());
    app.update(Event::EditStarted { id: CaseId::new("1") }, &mut model);
    app.update(Event::DeleteRequested { id: CaseId::new("1") }, &mut model);

    let update = app.update(Event::EditSubmitted, &mut model);
    assert!(http_requests(&update.effects).is_empty());
    assert_eq!(
        model.notification.unwrap().message,
        "Error editing case: Please wait for the current request to finish."
    );
}

#[test]
fn newer_refresh_wins() {
    let (app, mut model) = signed_in(one_case());

    let mut older = send(&app, &mut model, Event::RefreshRequested);
    let mut newer = send(&app, &mut model, Event::RefreshRequested);

    respond(
        &app,
        &mut model,
        &mut newer,
        ok_json(serde_json::json!([
            {"_id": "1", "title": "A", "content": "x"},
            {"_id": "3", "title": "C", "content": "z"},
        ])),
    );
    respond(&app, &mut model, &mut older, ok_json(serde_json::json!([])));

    assert_eq!(model.repository.len(), 2);
}

#[test]
fn malformed_case_list_keeps_the_current_one() {
    let (app, mut model) = signed_in(one_case());
    let mut refresh = send(&app, &mut model, Event::RefreshRequested);

    respond(
        &app,
        &mut model,
        &mut refresh,
        text(200, "<html>maintenance</html>"),
    );

    assert_eq!(model.repository.len(), 1);
    assert_eq!(
        model.notification.unwrap().message,
        "Error fetching cases: The server returned an unreadable case list."
    );
}

#[test]
fn expired_session_is_reported_on_refresh() {
    let (app, mut model) = signed_in(one_case());
    let mut refresh = send(&app, &mut model, Event::RefreshRequested);

    respond(&app, &mut model, &mut refresh, text(401, "Unauthorized"));

    assert_eq!(model.repository.len(), 1);
    assert_eq!(
        model.notification.unwrap().message,
        "Error fetching cases: The server rejected your session. Please log in again."
    );
}

#[test]
fn mutations_are_blocked_after_logout() {
    let (app, mut model) = signed_in(one_case());
    app.update(Event::LogoutRequested, &mut model);

    type_new_case(&app, &mut model, "New", "Body");
    let update = app.update(Event::CreateSubmitted, &mut model);
    assert!(http_requests(&update.effects).is_empty());
    assert_eq!(
        model.notification.clone().unwrap().message,
        "Error adding case: Please log in to change cases."
    );

    let update = app.update(Event::DeleteRequested { id: CaseId::new("1") }, &mut model);
    assert!(http_requests(&update.effects).is_empty());
    assert_matches!(
        model
            .in_flight
            .pending_kind(&ResourceKey::Case(CaseId::new("1"))),
        None
    );
}

#[test]
fn case_ids_are_percent_encoded_in_paths() {
    let (app, mut model) = signed_in(serde_json::json!([
        {"_id": "a/b", "title": "A", "content": "x"}
    ]));

    let remove = delete(&app, &mut model, "a/b");
    assert_eq!(remove.operation.url, "http://localhost:5002/api/cases/a%2Fb");
}
