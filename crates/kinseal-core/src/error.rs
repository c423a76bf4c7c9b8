use thiserror::Error;

pub type KinsealResult<T> = Result<T, KinsealError>;

#[derive(Debug, Error)]
pub enum KinsealError {
    #[error("crypto error: {0}")]
    Crypto(#[from] kinseal_crypto::CryptoError),

    #[error("config error: {0}")]
    Config(String),

    #[error("key file error: {0}")]
    KeyFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
