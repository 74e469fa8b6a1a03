use thiserror::Error;

use crate::capabilities::chat::ChatError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Chat platform error: {0}")]
    Chat(#[from] ChatError),

    #[error("Discord client error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("Short ID encoding failed: {0}")]
    ShortId(#[from] sqids::Error),

    #[error("Invalid short ID: {0}")]
    InvalidShortId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Input and absence errors are surfaced to the caller but never logged as errors
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Error::InvalidShortId(_) | Error::InvalidInput(_) | Error::NotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_errors() {
        assert!(Error::InvalidShortId("zz".to_string()).is_expected());
        assert!(Error::NotFound("infraction".to_string()).is_expected());
        assert!(Error::invalid_input("weight").is_expected());
        assert!(!Error::Config("DISCORD_TOKEN".to_string()).is_expected());
        assert!(!Error::Chat(ChatError::UnknownBan).is_expected());
    }

    #[test]
    fn test_error_display() {
        let error = Error::InvalidShortId("jjjjj".to_string());
        assert_eq!(error.to_string(), "Invalid short ID: jjjjj");

        let error = Error::NotFound("temp ban".to_string());
        assert_eq!(error.to_string(), "Not found: temp ban");
    }
}
