#![allow(dead_code)]

use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use crux_kv::error::KeyValueError;
use crux_kv::value::Value;
use crux_kv::{KeyValueOperation, KeyValueResponse, KeyValueResult};
use shared::{App, AuthField, Effect, Event, Model};

pub type Tester = AppTester<App, Effect>;
pub type HttpCall = Request<HttpRequest>;
pub type KvCall = Request<KeyValueOperation>;

// ===== Inspecting effects =====

pub fn http_requests(effects: &[Effect]) -> Vec<HttpRequest> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

pub fn kv_operations(effects: &[Effect]) -> Vec<KeyValueOperation> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::KeyValue(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

pub fn renders(effects: &[Effect]) -> bool {
    effects.iter().any(|e| matches!(e, Effect::Render(_)))
}

/// Takes the HTTP requests out of `effects` so they can be answered.
pub fn take_http(effects: Vec<Effect>) -> Vec<HttpCall> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn take_kv(effects: Vec<Effect>) -> Vec<KvCall> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::KeyValue(request) => Some(request),
            _ => None,
        })
        .collect()
}

/// The only HTTP request in `effects`.
pub fn single_http(effects: Vec<Effect>) -> HttpCall {
    let mut requests = take_http(effects);
    assert_eq!(requests.len(), 1, "expected exactly one HTTP request");
    requests.remove(0)
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

pub fn body_json(request: &HttpRequest) -> serde_json::Value {
    serde_json::from_slice(&request.body).expect("body is JSON")
}

// ===== Answering effects =====

/// Answers `request` as the shell would and feeds the resulting events back
/// into the app. Returns every effect those events produced.
pub fn respond(
    app: &Tester,
    model: &mut Model,
    request: &mut HttpCall,
    result: HttpResult,
) -> Vec<Effect> {
    let update = app.resolve(request, result).expect("request resolves");
    feed(app, model, update.events, update.effects)
}

pub fn respond_kv(
    app: &Tester,
    model: &mut Model,
    request: &mut KvCall,
    result: KeyValueResult,
) -> Vec<Effect> {
    let update = app.resolve(request, result).expect("request resolves");
    feed(app, model, update.events, update.effects)
}

fn feed(
    app: &Tester,
    model: &mut Model,
    events: Vec<Event>,
    mut effects: Vec<Effect>,
) -> Vec<Effect> {
    for event in events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

pub fn ok_json(value: serde_json::Value) -> HttpResult {
    json(200, value)
}

pub fn json(status: u16, value: serde_json::Value) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(status).json(value).build())
}

pub fn text(status: u16, body: &str) -> HttpResult {
    HttpResult::Ok(HttpResponse::status(status).body(body).build())
}

pub fn failed(error: crux_http::HttpError) -> HttpResult {
    HttpResult::Err(error)
}

pub fn stored(value: Option<&str>) -> KeyValueResult {
    KeyValueResult::Ok {
        response: KeyValueResponse::Get {
            value: value.map(|v| v.as_bytes().to_vec()).into(),
        },
    }
}

pub fn written() -> KeyValueResult {
    KeyValueResult::Ok {
        response: KeyValueResponse::Set {
            previous: Value::None,
        },
    }
}

pub fn deleted() -> KeyValueResult {
    KeyValueResult::Ok {
        response: KeyValueResponse::Delete {
            previous: Value::None,
        },
    }
}

pub fn storage_error(message: &str) -> KeyValueResult {
    KeyValueResult::Err {
        error: KeyValueError::Io {
            message: message.into(),
        },
    }
}

// ===== Flows =====

/// Starts the app and answers the session read with `token`.
/// Returns the effects of the restore.
pub fn start(app: &Tester, model: &mut Model, token: Option<&str>) -> Vec<Effect> {
    let update = app.update(Event::Started, model);
    let mut reads = take_kv(update.effects);
    assert_eq!(reads.len(), 1, "expected the session read");
    respond_kv(app, model, &mut reads[0], stored(token))
}

/// Starts the app with nothing persisted.
pub fn start_anonymous(app: &Tester, model: &mut Model) {
    start(app, model, None);
}

pub fn fill_credentials(app: &Tester, model: &mut Model, username: &str, password: &str) {
    app.update(
        Event::AuthFieldChanged {
            field: AuthField::Username,
            value: username.into(),
        },
        model,
    );
    app.update(
        Event::AuthFieldChanged {
            field: AuthField::Password,
            value: password.into(),
        },
        model,
    );
}

/// Logs in with `token`, lets the write-through succeed and answers the
/// follow-up refresh with `cases`.
pub fn sign_in(app: &Tester, model: &mut Model, token: &str, cases: serde_json::Value) {
    fill_credentials(app, model, "alice", "secret");
    let update = app.update(Event::AuthSubmitted, model);
    let mut login = single_http(update.effects);

    let effects = respond(
        app,
        model,
        &mut login,
        ok_json(serde_json::json!({ "token": token })),
    );
    let (mut refresh, mut write) = split(effects);
    respond_kv(app, model, &mut write, written());
    respond(app, model, &mut refresh, ok_json(cases));
}

/// Splits the effects of an accepted login into its refresh and its write.
pub fn split(effects: Vec<Effect>) -> (HttpCall, KvCall) {
    let mut http = Vec::new();
    let mut kv = Vec::new();
    for effect in effects {
        match effect {
            Effect::Http(request) => http.push(request),
            Effect::KeyValue(request) => kv.push(request),
            Effect::Render(_) => {}
        }
    }
    assert_eq!((http.len(), kv.len()), (1, 1), "expected one refresh and one write");
    (http.remove(0), kv.remove(0))
}
