//! This module provides the checks an upload request must pass before anything
//! is sent to the asset store.
use crate::{
    api::object::UploadRequest,
    constant::{ALLOWED_EXTENSIONS, MAX_FILE_SIZE},
    error::ValidationError,
};

/// Check the given value is not empty.
fn is_not_empty(value: String, error_msg: &'static str) -> Result<String, &'static str> {
    if value.is_empty() {
        return Err(error_msg);
    }
    Ok(value)
}

pub(crate) fn is_cloud_name_not_empty(cloud_name: String) -> Result<String, &'static str> {
    is_not_empty(cloud_name, "cloud name must not be empty.")
}

pub(crate) fn is_api_key_not_empty(api_key: String) -> Result<String, &'static str> {
    is_not_empty(api_key, "api key must not be empty.")
}

pub(crate) fn is_api_secret_not_empty(api_secret: String) -> Result<String, &'static str> {
    is_not_empty(api_secret, "api secret must not be empty.")
}

/// Check the payload is not empty.
fn is_payload_not_empty(request: &UploadRequest) -> Result<(), ValidationError> {
    if request.bytes.is_empty() {
        return Err(ValidationError::EmptyFile);
    }
    Ok(())
}

/// Check the payload fits in [`MAX_FILE_SIZE`].
fn is_size_within_limit(request: &UploadRequest) -> Result<(), ValidationError> {
    let size = request.size();
    if size > MAX_FILE_SIZE {
        return Err(ValidationError::FileTooLarge(size));
    }
    Ok(())
}

fn is_file_name_present(request: &UploadRequest) -> Result<&str, ValidationError> {
    request
        .file_name
        .as_deref()
        .ok_or(ValidationError::MissingFilename)
}

fn is_extension_allowed(file_name: &str) -> Result<String, ValidationError> {
    match file_extension(file_name) {
        Some(extension) if ALLOWED_EXTENSIONS.contains(&extension.as_str()) => Ok(extension),
        _ => Err(ValidationError::DisallowedExtension),
    }
}

/// Only the declared type is inspected, file content is never sniffed.
fn is_image_content_type(request: &UploadRequest) -> Result<(), ValidationError> {
    match request.content_type.as_deref() {
        Some(content_type) if content_type.starts_with("image") => Ok(()),
        _ => Err(ValidationError::NotAnImage),
    }
}

/// Extract the extension of `file_name`: everything from the last `.` to the
/// end, lower-cased. Returns `None` when the name has no `.` at all.
///
/// # Example
///
/// ```
/// use image_uplink::api::file_extension;
///
/// assert_eq!(file_extension("photo.JPG").as_deref(), Some(".jpg"));
/// assert_eq!(file_extension("archive.tar.gz").as_deref(), Some(".gz"));
/// assert_eq!(file_extension("doc"), None);
/// ```
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rfind('.')
        .map(|index| file_name[index..].to_lowercase())
}

/// Validate an upload request, stopping at the first failing check.
///
/// Checks run in a fixed order so the reported reason is deterministic:
/// emptiness, size, file name, extension, declared content type.
pub fn validate(request: &UploadRequest) -> Result<(), ValidationError> {
    is_payload_not_empty(request)?;
    is_size_within_limit(request)?;
    let file_name = is_file_name_present(request)?;
    is_extension_allowed(file_name)?;
    is_image_content_type(request)?;
    Ok(())
}
