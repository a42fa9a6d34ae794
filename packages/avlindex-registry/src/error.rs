use thiserror::Error;

use crate::validation::ValidationError;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    Engine(#[from] avlindex_core::Error),
    #[error("invalid citizen: {0}")]
    Validation(#[from] ValidationError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}
