use tracing::{debug, info, warn};

use crate::auth;
use crate::capabilities::Capabilities;
use crate::cases;
use crate::config::ClientConfig;
use crate::error::Notification;
use crate::event::Event;
use crate::model::Model;
use crate::session::SessionStore;
use crate::view::ViewModel;

#[derive(Default)]
pub struct App;

impl App {
    fn configure(model: &mut Model, base_url: &str, request_timeout_ms: Option<u64>) {
        let timeout = request_timeout_ms.unwrap_or(model.config.request_timeout_ms);
        match ClientConfig::new(base_url, timeout) {
            Ok(config) => {
                info!(base_url = %config.base_url, timeout_ms = config.request_timeout_ms, "backend configured");
                model.config = config;
                model.configured_by_shell = true;
            }
            Err(e) => {
                warn!(error = %e, "backend configuration rejected");
                model.notify(Notification::error(format!(
                    "Invalid backend configuration: {e}"
                )));
            }
        }
    }

    /// Applies environment overrides unless a shell already configured the
    /// backend explicitly, even if it chose the default values.
    fn configure_from_env(model: &mut Model, lookup: impl Fn(&str) -> Option<String>) {
        if model.configured_by_shell {
            debug!("backend set by the shell, ignoring environment");
            return;
        }
        match ClientConfig::from_lookup(lookup) {
            Ok(config) => model.config = config,
            Err(e) => warn!(error = %e, "ignoring invalid backend environment"),
        }
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        if event.is_internal() {
            debug!(event = event.name(), "capability response");
        } else {
            debug!(event = event.name(), "user event");
        }

        match event {
            Event::Started => {
                Self::configure_from_env(model, |name| std::env::var(name).ok());
                auth::restore(model, caps);
            }
            Event::BackendConfigured {
                base_url,
                request_timeout_ms,
            } => Self::configure(model, &base_url, request_timeout_ms),

            Event::AuthFieldChanged { field, value } => model.auth_form.set(field, value),
            Event::AuthModeToggled => model.auth_form.mode = model.auth_form.mode.toggled(),
            Event::AuthSubmitted => auth::submit(model, caps),
            Event::LogoutRequested => auth::logout(model, caps),

            Event::RefreshRequested => cases::refresh(model, caps),
            Event::NewCaseFieldChanged { field, value } => {
                cases::set_new_case_field(model, field, value);
            }
            Event::CreateSubmitted => cases::submit_new_case(model, caps),
            Event::EditStarted { id } => cases::start_edit(model, &id),
            Event::EditFieldChanged { field, value } => cases::set_edit_field(model, field, value),
            Event::EditSubmitted => cases::submit_edit(model, caps),
            Event::EditCancelled => cases::cancel_edit(model),
            Event::DeleteRequested { id } => cases::delete(model, caps, id),

            Event::NotificationDismissed => model.notification = None,

            Event::SessionRestored(result) => auth::on_restored(model, caps, result),
            Event::SessionPersisted(result) => {
                SessionStore::on_persisted(&result);
                return;
            }
            Event::SessionCleared(result) => {
                SessionStore::on_cleared(&result);
                return;
            }
            Event::LoginResponse { ticket, result } => {
                auth::on_login_response(model, caps, ticket, result);
            }
            Event::RegisterResponse { ticket, result } => {
                auth::on_register_response(model, ticket, result);
            }
            Event::CasesFetched { ticket, result } => cases::on_fetched(model, ticket, result),
            Event::CaseCreated {
                ticket,
                submitted,
                result,
            } => cases::on_created(model, ticket, &submitted, result),
            Event::CaseUpdated {
                ticket,
                submitted,
                result,
            } => cases::on_updated(model, ticket, &submitted, result),
            Event::CaseDeleted { ticket, id, result } => {
                cases::on_deleted(model, ticket, &id, result);
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from(model)
    }
}
