//! Error types that are turned into replies rather than crashing the command.

use serenity::http::HttpError;
use serenity::model::ModelError;

/// Why a single call against the guild failed.
///
/// Every store call is converted into one of these once, so callers match on the kind instead of
/// digging through serenity's error tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("missing permissions ({0})")]
    PermissionDenied(String),
    #[error("not found ({0})")]
    NotFound(String),
    #[error("Discord is unavailable ({0})")]
    Transient(String),
    #[error("{0} is not supported here")]
    Unsupported(&'static str),
    #[error("{0}")]
    Unexpected(String),
}

impl From<serenity::Error> for StoreError {
    fn from(err: serenity::Error) -> Self {
        match &err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
                let detail = response.error.message.clone();
                match response.status_code.as_u16() {
                    401 | 403 => StoreError::PermissionDenied(detail),
                    404 => StoreError::NotFound(detail),
                    429 | 500..=599 => StoreError::Transient(detail),
                    _ => StoreError::Unexpected(detail),
                }
            }
            serenity::Error::Http(HttpError::Request(_)) => StoreError::Transient(err.to_string()),
            serenity::Error::Model(ModelError::InvalidPermissions { .. })
            | serenity::Error::Model(ModelError::Hierarchy) => {
                StoreError::PermissionDenied(err.to_string())
            }
            _ => StoreError::Unexpected(err.to_string()),
        }
    }
}

/// Problems with what the user asked for.  These abort the command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    UserInput(String),
    #[error("This command can only be used in a server.")]
    NotInGuild,
    #[error("You need a moderator role to use this command.")]
    NotAuthorized,
}

/// Shorthand for the common `Err(CommandError::UserInput(..).into())`.
pub fn user_input<T>(reason: impl Into<String>) -> anyhow::Result<T> {
    Err(CommandError::UserInput(reason.into()).into())
}

/// Human-readable text for an error that escaped a command.
pub fn describe(err: &anyhow::Error) -> String {
    if let Some(err) = err.downcast_ref::<CommandError>() {
        return err.to_string();
    }
    match err.downcast_ref::<StoreError>() {
        Some(StoreError::PermissionDenied(_)) => {
            "I don't have the permissions required to do that.".to_owned()
        }
        Some(err) => format!("An error occurred: {}", err),
        None => format!("An error occurred: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_input_is_shown_verbatim() {
        let err = user_input::<()>("Category 'Lounge' not found.").unwrap_err();
        assert_eq!(describe(&err), "Category 'Lounge' not found.");
    }

    #[test]
    fn permission_denied_gets_a_friendly_reply() {
        let err = anyhow::Error::from(StoreError::PermissionDenied("50013".into()));
        assert_eq!(
            describe(&err),
            "I don't have the permissions required to do that."
        );
    }

    #[test]
    fn other_errors_are_stringified() {
        let err = anyhow::anyhow!("socket closed");
        assert_eq!(describe(&err), "An error occurred: socket closed");

        let err = anyhow::Error::from(StoreError::Transient("bad gateway".into()));
        assert_eq!(
            describe(&err),
            "An error occurred: Discord is unavailable (bad gateway)"
        );
    }

    #[test]
    fn model_permission_errors_are_permission_denied() {
        let err = serenity::Error::Model(ModelError::Hierarchy);
        assert!(matches!(
            StoreError::from(err),
            StoreError::PermissionDenied(_)
        ));
    }

    #[test]
    fn unknown_serenity_errors_are_unexpected() {
        let err = serenity::Error::Other("boom");
        assert_eq!(StoreError::from(err), StoreError::Unexpected("boom".into()));
    }
}
