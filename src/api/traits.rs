use bytes::Bytes;

use crate::api::{UploadOptions, object::StoreResponse};
use crate::error::StoreError;

/// Remote media store accepting one payload per call.
///
/// Implementations must send the payload exactly once, honour every option
/// in [`UploadOptions`] and report any rejection (duplicate key with
/// `overwrite=false`, auth, quota, network) as a [`StoreError`].
#[async_trait::async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(
        &self,
        bytes: Bytes,
        options: &UploadOptions,
    ) -> Result<StoreResponse, StoreError>;
}

#[async_trait::async_trait]
impl<S: AssetStore + ?Sized> AssetStore for std::sync::Arc<S> {
    async fn upload(
        &self,
        bytes: Bytes,
        options: &UploadOptions,
    ) -> Result<StoreResponse, StoreError> {
        (**self).upload(bytes, options).await
    }
}
