use tracing::error;

use crate::config::DEFAULT_VIEW_OUTPUT_LABEL;

/// Follow-up command offered alongside a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAction {
    /// Open the output channel
    ViewOutput { label: String },
}

impl NotificationAction {
    pub fn view_output() -> Self {
        NotificationAction::ViewOutput {
            label: DEFAULT_VIEW_OUTPUT_LABEL.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            NotificationAction::ViewOutput { label } => label,
        }
    }
}

/// Surfaces errors to the user.
pub trait Notifier: Send + Sync {
    fn show_error(&self, message: &str, action: Option<&NotificationAction>);
}

/// Reports notifications through the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_error(&self, message: &str, action: Option<&NotificationAction>) {
        match action {
            Some(action) => error!(action = action.label(), "{}", message),
            None => error!("{}", message),
        }
    }
}
