pub mod api;
mod auth;
pub mod client;
pub(crate) mod constant;
pub mod error;
pub mod util;
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use api::{
    AssetStore, Destination, HttpAssetStore, StoreConfig, StoreResponse, UploadImageOperation,
    UploadOptions, UploadRequest, UploadResult, Uploader, validate,
};
pub use auth::{Sha1Signer, SignatureService, Signer};
pub use constant::MAX_FILE_SIZE;
pub use error::{StoreError, UplinkResult, UploadError, ValidationError};
