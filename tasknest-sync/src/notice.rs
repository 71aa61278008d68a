/// User-facing notifications
///
/// Every user action on a screen ends with exactly one notice: a success
/// confirmation or an error message. Errors never propagate past the screen
/// that caught them; the presentation layer drains the notice channel and
/// shows an alert.

use serde::Serialize;
use tasknest_shared::backend::BackendError;
use tasknest_shared::models::RecordKind;
use tasknest_shared::SyncError;
use tokio::sync::mpsc;

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User action a notice reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Load,
    Create,
    Update,
    Delete,
    AttachImage,
    DetachImage,
    SignIn,
    SignUp,
    SignOut,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub action: Action,
    pub title: String,
    pub message: String,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Notice {
    /// Success confirmation for a record action
    pub fn record_success(kind: RecordKind, action: Action) -> Self {
        let subject = capitalize(kind.as_str());
        let message = match action {
            Action::Create => format!("{} added successfully!", subject),
            Action::Update => format!("{} updated successfully!", subject),
            Action::Delete => format!("{} deleted successfully!", subject),
            Action::AttachImage => "Image added to the task.".to_string(),
            Action::DetachImage => "Image removed from the task.".to_string(),
            _ => format!("{} action completed.", subject),
        };

        Notice {
            level: NoticeLevel::Success,
            action,
            title: "Success".to_string(),
            message,
        }
    }

    /// Error message for a failed record action
    pub fn record_failure(kind: RecordKind, action: Action, err: &SyncError) -> Self {
        let message = match err {
            SyncError::Unauthenticated => err.user_message().to_string(),
            SyncError::Validation(_) => {
                format!("The {} name cannot be empty.", kind.as_str())
            }
            SyncError::Upload(_) => "Could not upload the image.".to_string(),
            SyncError::Backend(BackendError::Auth(auth)) => auth.user_message().to_string(),
            SyncError::Backend(_) => match action {
                Action::Load => format!("Could not load {}.", kind.plural()),
                Action::Create => format!("Could not add the {}.", kind.as_str()),
                Action::Update => format!("Could not update the {}.", kind.as_str()),
                Action::Delete => format!("Could not delete the {}.", kind.as_str()),
                Action::AttachImage => "Could not add the image.".to_string(),
                Action::DetachImage => "Could not remove the image.".to_string(),
                _ => err.user_message().to_string(),
            },
        };

        Notice::error(action, message)
    }

    /// Success confirmation for an account action
    pub fn account_success(action: Action, message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Success,
            action,
            title: "Success".to_string(),
            message: message.into(),
        }
    }

    /// Error message for a failed account action
    pub fn account_failure(action: Action, err: &SyncError) -> Self {
        Notice::error(action, err.user_message())
    }

    fn error(action: Action, message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            action,
            title: "Error".to_string(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Where a screen sends its notices
#[derive(Debug, Clone)]
pub struct NoticeSink {
    sender: Option<mpsc::UnboundedSender<Notice>>,
}

impl NoticeSink {
    /// Creates a sink and the receiver the presentation layer drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            NoticeSink {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// A sink that drops every notice
    pub fn discard() -> Self {
        NoticeSink { sender: None }
    }

    /// Emits a notice
    pub fn emit(&self, notice: Notice) {
        if notice.is_error() {
            tracing::debug!(action = ?notice.action, message = %notice.message, "Error notice");
        }

        if let Some(sender) = &self.sender {
            if sender.send(notice).is_err() {
                tracing::debug!("Notice receiver dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasknest_shared::models::validate_name;
    use tasknest_shared::UploadError;

    #[test]
    fn test_success_messages() {
        assert_eq!(
            Notice::record_success(RecordKind::Project, Action::Create).message,
            "Project added successfully!"
        );
        assert_eq!(
            Notice::record_success(RecordKind::Column, Action::Update).message,
            "Column updated successfully!"
        );
        assert_eq!(
            Notice::record_success(RecordKind::Task, Action::Delete).message,
            "Task deleted successfully!"
        );
    }

    #[test]
    fn test_validation_message_names_the_record() {
        let err: SyncError = validate_name(" ").unwrap_err().into();
        let notice = Notice::record_failure(RecordKind::Column, Action::Create, &err);
        assert!(notice.is_error());
        assert_eq!(notice.message, "The column name cannot be empty.");
    }

    #[test]
    fn test_backend_message_depends_on_action() {
        let err: SyncError = BackendError::Unavailable("offline".to_string()).into();
        assert_eq!(
            Notice::record_failure(RecordKind::Project, Action::Create, &err).message,
            "Could not add the project."
        );
        assert_eq!(
            Notice::record_failure(RecordKind::Task, Action::Load, &err).message,
            "Could not load tasks."
        );
        assert_eq!(
            Notice::record_failure(RecordKind::Task, Action::DetachImage, &err).message,
            "Could not remove the image."
        );
    }

    #[test]
    fn test_upload_and_auth_messages() {
        let upload: SyncError = UploadError::UnsupportedUri("x://".to_string()).into();
        assert_eq!(
            Notice::record_failure(RecordKind::Task, Action::AttachImage, &upload).message,
            "Could not upload the image."
        );

        let unauthenticated = SyncError::Unauthenticated;
        assert_eq!(
            Notice::record_failure(RecordKind::Project, Action::Load, &unauthenticated).message,
            "User not authenticated."
        );
    }

    #[tokio::test]
    async fn test_sink_delivers_in_order() {
        let (sink, mut receiver) = NoticeSink::channel();
        sink.emit(Notice::record_success(RecordKind::Project, Action::Create));
        sink.emit(Notice::record_success(RecordKind::Project, Action::Delete));

        assert_eq!(receiver.recv().await.unwrap().action, Action::Create);
        assert_eq!(receiver.recv().await.unwrap().action, Action::Delete);
    }

    #[test]
    fn test_discard_sink_accepts_notices() {
        NoticeSink::discard().emit(Notice::record_success(RecordKind::Task, Action::Create));
    }
}
