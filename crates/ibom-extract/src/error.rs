use crate::lzstring::DecompressError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no PCB data found in HTML")]
    PayloadNotFound,

    #[error("could not recover PCB document: {0}")]
    Decompression(#[from] DecompressError),

    #[error("corrupt payload after decompression: {0}")]
    CorruptPayload(#[source] serde_json::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
