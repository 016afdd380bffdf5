//! Login, registration, logout and startup session restore.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::api::{into_body, ApiClient, ApiPath};
use crate::capabilities::{Capabilities, HttpResult, KvResult};
use crate::cases;
use crate::error::{ApiError, AuthError, Notification};
use crate::event::Event;
use crate::in_flight::{Admission, OpKind, ResourceKey, Ticket};
use crate::model::{AuthMode, Model};
use crate::session::Credential;

pub const LOGIN_SUCCESS: &str = "Login successful!";
pub const REGISTER_SUCCESS: &str = "Registration successful! Please log in.";
pub const LOGIN_FAILURE: &str = "Error logging in";
pub const REGISTER_FAILURE: &str = "Error registering";

#[derive(Serialize)]
struct CredentialsBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenBody {
    #[serde(default)]
    token: Option<String>,
}

/// Reads the persisted credential. The outcome arrives as
/// [`Event::SessionRestored`].
pub fn restore(model: &mut Model, caps: &Capabilities) {
    debug!("restoring session");
    model.session.restore(&caps.kv);
}

pub fn on_restored(model: &mut Model, caps: &Capabilities, result: KvResult) {
    if model.session.on_restored(result) {
        cases::refresh(model, caps);
    }
}

/// Logs in or registers depending on the form's mode.
pub fn submit(model: &mut Model, caps: &Capabilities) {
    match model.auth_form.mode {
        AuthMode::Login => login(model, caps),
        AuthMode::Register => register(model, caps),
    }
}

pub fn login(model: &mut Model, caps: &Capabilities) {
    let Some(ticket) = admit(model, OpKind::Login, LOGIN_FAILURE) else {
        return;
    };

    let request = ApiClient::new(&caps.http, &model.config, model.session.credential())
        .post(&ApiPath::Login, &credentials_body(model));

    match request {
        Ok(request) => {
            info!(username = %model.auth_form.username, "logging in");
            request.send(move |result| Event::LoginResponse { ticket, result });
        }
        Err(e) => abandon(model, ticket, LOGIN_FAILURE, AuthError::Transport(e)),
    }
}

pub fn register(model: &mut Model, caps: &Capabilities) {
    let Some(ticket) = admit(model, OpKind::Register, REGISTER_FAILURE) else {
        return;
    };

    let request = ApiClient::new(&caps.http, &model.config, model.session.credential())
        .post(&ApiPath::Register, &credentials_body(model));

    match request {
        Ok(request) => {
            info!(username = %model.auth_form.username, "registering");
            request.send(move |result| Event::RegisterResponse { ticket, result });
        }
        Err(e) => abandon(model, ticket, REGISTER_FAILURE, AuthError::Transport(e)),
    }
}

#[instrument(skip_all)]
pub fn on_login_response(model: &mut Model, caps: &Capabilities, ticket: Ticket, result: HttpResult) {
    if !model
        .in_flight
        .complete(OpKind::Login, &ResourceKey::Session, ticket)
    {
        debug!(?ticket, "stale login response dropped");
        return;
    }

    match parse_token(result) {
        Ok(credential) => {
            info!("login succeeded");
            model.reset_session_state();
            model.session.set_credential(credential, &caps.kv);
            model.auth_form.clear_password();
            model.notify(Notification::success(LOGIN_SUCCESS));
            cases::refresh(model, caps);
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            model.notify(Notification::failure(LOGIN_FAILURE, &e.user_facing_message()));
        }
    }
}

#[instrument(skip_all)]
pub fn on_register_response(model: &mut Model, ticket: Ticket, result: HttpResult) {
    if !model
        .in_flight
        .complete(OpKind::Register, &ResourceKey::Session, ticket)
    {
        debug!(?ticket, "stale registration response dropped");
        return;
    }

    match into_body(result) {
        Ok(_) => {
            info!("registration succeeded");
            model.auth_form.mode = AuthMode::Login;
            model.auth_form.clear_password();
            model.notify(Notification::success(REGISTER_SUCCESS));
        }
        Err(e) => {
            let error = AuthError::from_api(e, false);
            warn!(error = %error, "registration failed");
            model.notify(Notification::failure(
                REGISTER_FAILURE,
                &error.user_facing_message(),
            ));
        }
    }
}

/// Ends the session locally. The backend keeps no session state, so no
/// request is made.
pub fn logout(model: &mut Model, caps: &Capabilities) {
    info!("logging out");
    model.session.clear(&caps.kv);
    model.reset_session_state();
    model.auth_form.mode = AuthMode::Login;
    model.auth_form.clear_password();
}

fn credentials_body(model: &Model) -> CredentialsBody<'_> {
    CredentialsBody {
        username: &model.auth_form.username,
        password: &model.auth_form.password,
    }
}

fn admit(model: &mut Model, kind: OpKind, context: &str) -> Option<Ticket> {
    match model.in_flight.admit(kind, ResourceKey::Session) {
        Admission::Rejected { in_flight } => {
            debug!(%kind, %in_flight, "sign-in request rejected");
            model.notify(Notification::failure(
                context,
                &AuthError::Busy.user_facing_message(),
            ));
            None
        }
        admitted => admitted.ticket(),
    }
}

fn abandon(model: &mut Model, ticket: Ticket, context: &str, error: AuthError) {
    warn!(error = %error, "sign-in request could not be built");
    model.in_flight.abandon(&ResourceKey::Session, ticket);
    model.notify(Notification::failure(context, &error.user_facing_message()));
}

fn parse_token(result: HttpResult) -> Result<Credential, AuthError> {
    let body = into_body(result).map_err(|e| AuthError::from_api(e, true))?;
    let body: TokenBody = serde_json::from_slice(&body)
        .map_err(|e| AuthError::Transport(ApiError::InvalidResponse(e.to_string())))?;
    body.token
        .and_then(Credential::new)
        .ok_or(AuthError::MissingToken)
}
