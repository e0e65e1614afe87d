use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("invalid length")]
    InvalidLength,
    #[error("unsupported fragment version: {0}")]
    UnsupportedVersion(u8),
    #[error("corrupt fragment: {0}")]
    Corrupt(#[from] bincode::Error),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("state serialization failed: {0}")]
    Serialize(#[from] bincode::Error),
}
