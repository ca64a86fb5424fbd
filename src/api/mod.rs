pub mod object;
mod store;
mod traits;
mod upload;
mod validator;

pub use object::{Destination, StoreConfig, StoreResponse, UploadOptions, UploadRequest, UploadResult};

/// Re-export store module
pub use store::HttpAssetStore;
/// Re-export trait module
pub use traits::AssetStore;
/// Re-export upload module
pub use upload::{UploadImageOperation, Uploader, generate_storage_key};
/// Re-export validator module
pub use validator::{file_extension, validate};
