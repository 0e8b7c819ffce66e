use crate::api::client::ApiError;
use thiserror::Error;

/// Failures of the user-facing operations. Each aborts the operation and
/// leaves the session exactly as it was.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Error loading users: {0}")]
    LoadUsers(#[source] ApiError),
    #[error("Error loading messages: {0}")]
    LoadMessages(#[source] ApiError),
    #[error("Please select a chat first.")]
    NoActiveContact,
    #[error("Error sending message: {0}")]
    Send(#[source] ApiError),
    #[error("Error deleting message: {0}")]
    Delete(#[source] ApiError),
    #[error("Error logging out: {0}")]
    Logout(#[source] ApiError),
    #[error("Error updating profile: {0}")]
    UpdateProfile(#[source] ApiError),
    #[error("Error editing user: {0}")]
    EditUser(#[source] ApiError),
    #[error("Error deleting user: {0}")]
    RemoveUser(#[source] ApiError),
    #[error("Could not read attachment: {0}")]
    Attachment(#[from] std::io::Error),
}

impl ChatError {
    /// Text shown to the user in a toast.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::LoadUsers(_) => "Error loading users".into(),
            ChatError::LoadMessages(_) => "Error loading messages".into(),
            ChatError::NoActiveContact => self.to_string(),
            ChatError::Send(err) => err
                .server_message()
                .unwrap_or("Error sending message.")
                .to_string(),
            ChatError::Delete(_) => "Error deleting message".into(),
            ChatError::Logout(_) => "Error logging out".into(),
            ChatError::UpdateProfile(_) => "Error updating profile".into(),
            ChatError::EditUser(_) => "Error editing user".into(),
            ChatError::RemoveUser(err) => err
                .server_message()
                .unwrap_or("Error deleting user")
                .to_string(),
            ChatError::Attachment(err) => format!("Could not read attachment: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn send_error_prefers_server_text() {
        let err = ChatError::Send(ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Receiver does not exist".into()),
        });
        assert_eq!(err.user_message(), "Receiver does not exist");
    }

    #[test]
    fn send_error_falls_back_to_generic_text() {
        let err = ChatError::Send(ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        });
        assert_eq!(err.user_message(), "Error sending message.");
    }

    #[test]
    fn other_failures_use_fixed_text() {
        let status = || ApiError::Status { status: StatusCode::UNAUTHORIZED, message: Some("Unauthorized".into()) };
        assert_eq!(ChatError::LoadUsers(status()).user_message(), "Error loading users");
        assert_eq!(ChatError::Logout(status()).user_message(), "Error logging out");
        assert_eq!(ChatError::NoActiveContact.user_message(), "Please select a chat first.");
        assert_eq!(ChatError::UpdateProfile(status()).user_message(), "Error updating profile");
    }

    #[test]
    fn user_removal_shows_server_reason() {
        let err = ChatError::RemoveUser(ApiError::Status {
            status: StatusCode::NOT_FOUND,
            message: Some("User not found".into()),
        });
        assert_eq!(err.user_message(), "User not found");
    }
}
