use secrets_apdu_core::{ResponseError, StatusError, StatusWord, TransportError};

use crate::tlv::Tag;
use crate::types::Algorithm;

/// Result type for secrets applet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for secrets applet operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Errors from the APDU layer
    #[error(transparent)]
    Apdu(secrets_apdu_core::Error),

    /// Transport-related errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The card answered with a non-success status word
    #[error(transparent)]
    Status(#[from] StatusError),

    /// A TLV structure could not be decoded
    #[error("Malformed TLV: {0}")]
    MalformedTlv(&'static str),

    /// A fixed size field had an unexpected size
    #[error("Wrong length")]
    WrongLength,

    /// The response contained a tag that is not valid in this context
    #[error("Unknown tag {0}")]
    UnknownTag(Tag),

    /// The response did not contain any value
    #[error("No values found in response")]
    NoValuesFound,

    /// The credential identifier exceeds the applet limit
    #[error("Name too long ({0} > 64)")]
    NameTooLong(usize),

    /// Digit count outside of what the credential kind allows
    #[error("Invalid number of digits: {0}")]
    InvalidDigitCount(u8),

    /// The algorithm is not supported by the firmware
    #[error("{0} is not supported by the firmware")]
    UnsupportedAlgorithm(Algorithm),

    /// No PIN has been configured on the card
    #[error("No PIN has been configured")]
    NoPinConfigured,

    /// The application has not been selected yet
    #[error("Application not selected")]
    NotSelected,

    /// The applet does not offer this feature
    #[error("Not supported: {0}")]
    NotSupported(&'static str),

    /// The card failed to prove knowledge of the access key
    #[error("Authentication failed")]
    AuthenticationFailed,
}

impl Error {
    /// Status word reported by the card, if this error originates from one
    pub fn status_word(&self) -> Option<StatusWord> {
        match self {
            Self::Status(e) => Some(e.status),
            Self::Apdu(e) => match e.root() {
                secrets_apdu_core::Error::Status(e)
                | secrets_apdu_core::Error::Response(ResponseError::Status(e)) => Some(e.status),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the card rejected the operation for lack of PIN verification
    pub fn is_security_status(&self) -> bool {
        self.status_word()
            .is_some_and(|sw| sw.is_security_condition_not_satisfied())
    }
}

impl From<secrets_apdu_core::Error> for Error {
    fn from(error: secrets_apdu_core::Error) -> Self {
        // Status words are surfaced directly so callers can match on them
        match error.root() {
            secrets_apdu_core::Error::Status(e)
            | secrets_apdu_core::Error::Response(ResponseError::Status(e)) => Self::Status(*e),
            _ => Self::Apdu(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrets_apdu_core::prelude::status;

    #[test]
    fn test_status_errors_are_flattened() {
        let apdu = secrets_apdu_core::Error::from(StatusError::from(
            status::SECURITY_CONDITION_NOT_SATISFIED,
        ))
        .with_context("Failed to send command");

        let error = Error::from(apdu);
        assert!(matches!(error, Error::Status(_)));
        assert!(error.is_security_status());
        assert_eq!(error.to_string(), "Card returned 6982: Security status not satisfied");
    }

    #[test]
    fn test_other_errors_have_no_status() {
        let error = Error::from(secrets_apdu_core::Error::ChainLimitExceeded);
        assert!(matches!(error, Error::Apdu(_)));
        assert_eq!(error.status_word(), None);
        assert_eq!(Error::UnknownTag(Tag::Key).to_string(), "Unknown tag 0x73");
    }
}
