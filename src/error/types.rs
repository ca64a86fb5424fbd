use thiserror::Error;

pub type UplinkResult<T> = ::std::result::Result<T, UploadError>;

/// Local rejection of an upload request. No network call has been made when
/// one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File can not be empty")]
    EmptyFile,
    #[error("File size {0} bytes exceeds the 5MB limit")]
    FileTooLarge(usize),
    #[error("File name is missing")]
    MissingFilename,
    #[error("Only JPG, JPEG, PNG and GIF files are allowed")]
    DisallowedExtension,
    #[error("File must be a valid image")]
    NotAnImage,
}

/// Failure raised after the asset store was contacted.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Asset store rejected the upload: {0}")]
    Provider(String),
    #[error("Asset store response has no secure_url string")]
    UploadResponseMalformed,
    #[error("Upload cancelled")]
    Cancelled,
    #[error("Upload timed out")]
    Timeout,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout
        } else if e.is_decode() {
            StoreError::UploadResponseMalformed
        } else {
            StoreError::Provider(e.to_string())
        }
    }
}
