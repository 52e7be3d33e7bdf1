//! Error types for the MOAC toolkit

use thiserror::Error;

/// Main error type for the toolkit
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MoacError {
    #[error("{0} is invalid moac address.")]
    InvalidAddress(String),

    #[error("{0} is invalid moac secret.")]
    InvalidSecret(String),

    #[error("{0} is invalid amount.")]
    InvalidAmount(String),

    #[error("{0} is invalid hash.")]
    InvalidHash(String),

    #[error("{0} is invalid jingtum address.")]
    InvalidJingtumAddress(String),

    /// Error reported by the node or the transport, message kept verbatim
    #[error("{0}")]
    Rpc(String),

    #[error("ABI error: {0}")]
    Abi(String),

    #[error("No ABI entry named {name} accepting {arity} argument(s)")]
    FunctionNotFound { name: String, arity: usize },

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MoacError {
    /// Check if the error was raised by input validation, before any RPC call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MoacError::InvalidAddress(_)
                | MoacError::InvalidSecret(_)
                | MoacError::InvalidAmount(_)
                | MoacError::InvalidHash(_)
                | MoacError::InvalidJingtumAddress(_)
        )
    }
}

/// Result type for toolkit operations
pub type MoacResult<T> = Result<T, MoacError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        let err = MoacError::InvalidAddress("0x12".to_string());
        assert_eq!(err.to_string(), "0x12 is invalid moac address.");
        assert!(err.is_validation());

        let err = MoacError::InvalidAmount("-1".to_string());
        assert_eq!(err.to_string(), "-1 is invalid amount.");
    }

    #[test]
    fn test_rpc_message_is_verbatim() {
        let err = MoacError::Rpc("request nonce in error".to_string());
        assert_eq!(err.to_string(), "request nonce in error");
        assert!(!err.is_validation());
    }
}
