use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("rejected by validation: {0}")]
    Rejected(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(String),
    #[error("crypto error: {0}")]
    Crypto(String),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}
