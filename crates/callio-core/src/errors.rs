use thiserror::Error;

use crate::engine::EngineError;
use crate::token::TokenError;

#[derive(Debug, Error)]
pub enum CallioError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("token fetch failed: {0}")]
    TokenFetch(String),
    #[error("engine operation failed: {0}")]
    Engine(#[from] EngineError),
}

impl From<TokenError> for CallioError {
    fn from(err: TokenError) -> Self {
        CallioError::TokenFetch(err.to_string())
    }
}
