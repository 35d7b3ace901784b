use core_types::FetchError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}
