use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to open capture device {index}: {reason}")]
    DeviceOpen { index: u32, reason: String },

    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
