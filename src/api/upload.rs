//! This module contains the image upload pipeline: validate, name, send, and
//! reduce the store response to a secure url.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    api::{
        AssetStore, Destination, UploadOptions, UploadRequest, UploadResult,
        validator::{file_extension, validate},
    },
    constant::STORAGE_KEY_PREFIX,
    error::{StoreError, UplinkResult, ValidationError},
};

/// Storage key for a folder scoped upload: `img_<uuid v4><extension>`.
pub fn generate_storage_key(extension: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}{}{extension}", Uuid::new_v4())
}

/// A single upload of one request to one destination.
pub struct UploadImageOperation<'a, S: ?Sized> {
    store: &'a S,
    request: UploadRequest,
    destination: Destination,
}

impl<'a, S: AssetStore + ?Sized> UploadImageOperation<'a, S> {
    pub fn new(store: &'a S, request: UploadRequest, destination: Destination) -> Self {
        Self {
            store,
            request,
            destination,
        }
    }

    /// Validate the request and build the options for the store call.
    /// A folder scoped upload gets a freshly generated storage key each time.
    pub fn prepare(&self) -> Result<UploadOptions, ValidationError> {
        validate(&self.request)?;
        let request = &self.request;
        let options = match self.destination {
            Destination::Root => UploadOptions::new()
                .file_name(request.file_name.clone())
                .content_type(request.content_type.clone())
                .build(),
            Destination::Folder(ref folder) => {
                let extension = request
                    .file_name
                    .as_deref()
                    .and_then(file_extension)
                    .ok_or(ValidationError::DisallowedExtension)?;
                UploadOptions::new()
                    .folder(Some(folder.clone()))
                    .public_id(Some(generate_storage_key(&extension)))
                    .use_filename(Some(false))
                    .unique_filename(Some(false))
                    .overwrite(Some(false))
                    .file_name(request.file_name.clone())
                    .content_type(request.content_type.clone())
                    .build()
            }
        };
        Ok(options)
    }

    /// Send the payload once and extract the secure url.
    pub async fn send(&self, options: &UploadOptions) -> Result<UploadResult, StoreError> {
        let response = self
            .store
            .upload(self.request.bytes.clone(), options)
            .await?;
        UploadResult::from_response(&response)
    }
}

/// Entry point for callers: validates and uploads images to an [`AssetStore`].
///
/// The uploader keeps no state between calls and can be shared across tasks.
pub struct Uploader<S> {
    store: S,
    timeout: Option<Duration>,
}

impl<S: AssetStore> Uploader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            timeout: None,
        }
    }

    /// Deadline applied to the store call by [`Uploader::upload`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upload `request` to `destination`.
    pub async fn upload(
        &self,
        request: UploadRequest,
        destination: Destination,
    ) -> UplinkResult<UploadResult> {
        self.upload_with(request, destination, &CancellationToken::new(), self.timeout)
            .await
    }

    /// Upload with caller controlled cancellation and deadline.
    ///
    /// Validation always runs first, so an invalid request is reported as a
    /// [`ValidationError`] even if `cancel` already fired.
    pub async fn upload_with(
        &self,
        request: UploadRequest,
        destination: Destination,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> UplinkResult<UploadResult> {
        let operation = UploadImageOperation::new(&self.store, request, destination);
        let options = operation.prepare().inspect_err(|e| {
            tracing::debug!("upload rejected: {}", e);
        })?;

        let send = async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(StoreError::Cancelled),
                result = operation.send(&options) => result,
            }
        };
        let result = match timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .unwrap_or(Err(StoreError::Timeout)),
            None => send.await,
        };

        match result {
            Ok(result) => {
                tracing::debug!(
                    "uploaded {:?} to {}",
                    options.public_id(),
                    result.secure_url
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!("upload to {} failed: {}", operation.destination, e);
                Err(e.into())
            }
        }
    }
}
