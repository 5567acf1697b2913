use crate::error::Result;
use crate::provider::Notifier;

pub const GENERIC_FAILURE: &str = "GitGlance: the command failed. See the output log for details.";

/// Run a user command at the UI boundary.
///
/// Failures are logged in full and reported to the user with a generic
/// message; nothing propagates past this point.
pub fn run_command<T>(
    name: &str,
    notifier: &dyn Notifier,
    command: impl FnOnce() -> Result<T>,
) -> Option<T> {
    match command() {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(command = name, error = %err, "command failed");
            notifier.show_error_message(GENERIC_FAILURE);
            None
        }
    }
}
