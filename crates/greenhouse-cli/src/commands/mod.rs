//! Command implementations for the CLI.

mod history;
mod login;
mod password;
mod settings;
mod status;

pub use history::cmd_history;
pub use login::{cmd_login, cmd_logout};
pub use password::cmd_change_password;
pub use settings::{SettingsAction, cmd_settings};
pub use status::cmd_status;

use std::sync::Arc;

use greenhouse_core::api::SensorApi;
use greenhouse_core::events::EventDispatcher;
use greenhouse_core::session::SessionStore;

/// Shared handles every command operates on.
pub struct AppContext {
    pub api: Arc<dyn SensorApi>,
    pub session: Arc<SessionStore>,
    pub events: EventDispatcher,
}

/// Error message when a command requires an authenticated session.
pub(crate) const NOT_LOGGED_IN: &str = "Not logged in. Run 'greenhouse login' first.";

/// Error message when the backend rejects the stored token.
pub(crate) const SESSION_EXPIRED: &str =
    "Session expired or invalid. Run 'greenhouse login' to sign in again.";
