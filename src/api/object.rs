use std::fmt::{Display, Formatter};

use anyhow::Error;
use builder_pattern::Builder;
use bytes::Bytes;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    api::validator::{is_api_key_not_empty, is_api_secret_not_empty, is_cloud_name_not_empty},
    constant::{CLOUDINARY_URL_ENV, DEFAULT_ENDPOINT, QUALITY_AUTO_GOOD, RESOURCE_TYPE_AUTO},
    error::StoreError,
};

/// Raw response body returned by an asset store.
pub type StoreResponse = Map<String, Value>;

/// A single file handed over by the caller.
#[derive(Debug, Clone, Builder)]
pub struct UploadRequest {
    /// Required: File content.
    #[into]
    pub bytes: Bytes,

    /// Original file name, only used to derive the extension.
    #[default(None)]
    pub file_name: Option<String>,

    /// Declared MIME type (eg: `image/png`).
    #[default(None)]
    pub content_type: Option<String>,
}

impl UploadRequest {
    /// Declared size of the payload in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Where an upload lands in the asset store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Destination {
    /// Provider root, the store picks the storage identity.
    #[default]
    Root,
    /// Folder scoped upload with a generated storage key.
    Folder(String),
}

impl From<Option<String>> for Destination {
    fn from(folder: Option<String>) -> Self {
        folder.map_or(Destination::Root, Destination::Folder)
    }
}

impl From<&str> for Destination {
    fn from(folder: &str) -> Self {
        Destination::Folder(folder.to_string())
    }
}

impl Display for Destination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Root => write!(f, "<root>"),
            Destination::Folder(folder) => write!(f, "{folder}"),
        }
    }
}

/// Options for one upload call. Fields left as `None` are not sent.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct UploadOptions {
    /// Target folder, empty means provider root.
    #[public]
    #[default(None)]
    folder: Option<String>,

    /// Storage key (`public_id`).
    #[public]
    #[default(None)]
    public_id: Option<String>,

    #[public]
    #[default(None)]
    use_filename: Option<bool>,

    #[public]
    #[default(None)]
    unique_filename: Option<bool>,

    #[public]
    #[default(None)]
    overwrite: Option<bool>,

    /// Resource type, part of the upload url rather than the form.
    #[public]
    #[into]
    #[default(RESOURCE_TYPE_AUTO.into())]
    resource_type: String,

    #[public]
    #[default(Some(QUALITY_AUTO_GOOD.into()))]
    quality: Option<String>,

    /// Multipart file name hint, never used for storage naming.
    #[public]
    #[default(None)]
    file_name: Option<String>,

    /// Declared MIME type of the payload.
    #[public]
    #[default(None)]
    content_type: Option<String>,
}

impl UploadOptions {
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    pub fn use_filename(&self) -> Option<bool> {
        self.use_filename
    }

    pub fn unique_filename(&self) -> Option<bool> {
        self.unique_filename
    }

    pub fn overwrite(&self) -> Option<bool> {
        self.overwrite
    }

    pub fn resource_type(&self) -> &str {
        self.resource_type.as_str()
    }

    pub fn quality(&self) -> Option<&str> {
        self.quality.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Render the options as provider form parameters, in a stable order.
    /// `resource_type` and the transport hints are not included.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref folder) = self.folder
            && !folder.is_empty()
        {
            params.push(("folder", folder.clone()));
        }
        if let Some(ref public_id) = self.public_id {
            params.push(("public_id", public_id.clone()));
        }
        let flags = [
            ("use_filename", self.use_filename),
            ("unique_filename", self.unique_filename),
            ("overwrite", self.overwrite),
        ];
        for (name, flag) in flags {
            if let Some(flag) = flag {
                params.push((name, flag.to_string()));
            }
        }
        if let Some(ref quality) = self.quality {
            params.push(("quality", quality.clone()));
        }
        params
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub secure_url: String,
}

impl UploadResult {
    /// Pull `secure_url` out of a store response. Anything but a string is
    /// reported as [`StoreError::UploadResponseMalformed`].
    pub fn from_response(response: &StoreResponse) -> Result<Self, StoreError> {
        match response.get("secure_url") {
            Some(Value::String(secure_url)) => Ok(Self {
                secure_url: secure_url.clone(),
            }),
            other => {
                tracing::error!("Unexpected secure_url in store response: {:?}", other);
                Err(StoreError::UploadResponseMalformed)
            }
        }
    }
}

/// Configuration for the Cloudinary compatible upload api.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Api endpoint, without the version path.
    #[into]
    #[default(DEFAULT_ENDPOINT.into())]
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Cloud (account) name.
    #[validator(is_cloud_name_not_empty)]
    #[into]
    pub cloud_name: String,

    #[validator(is_api_key_not_empty)]
    #[into]
    pub api_key: String,

    #[validator(is_api_secret_not_empty)]
    #[into]
    #[serde(skip_serializing)]
    pub api_secret: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl StoreConfig {
    /// Parse a `cloudinary://<api_key>:<api_secret>@<cloud_name>` url.
    /// An `upload_prefix` query parameter overrides the endpoint.
    pub fn from_url(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url)?;
        if url.scheme() != "cloudinary" {
            return Err(Error::msg(format!(
                "unsupported scheme [{}], expected cloudinary",
                url.scheme()
            )));
        }
        let cloud_name = url.host_str().unwrap_or_default();
        let api_key = urlencoding::decode(url.username())?;
        let api_secret = url
            .password()
            .map(urlencoding::decode)
            .transpose()?
            .unwrap_or_default();
        let endpoint = url
            .query_pairs()
            .find(|(key, _)| key == "upload_prefix")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(default_endpoint);

        Ok(StoreConfig::new()
            .endpoint(endpoint)
            .cloud_name(cloud_name)
            .map_err(Error::msg)?
            .api_key(api_key.into_owned())
            .map_err(Error::msg)?
            .api_secret(api_secret.into_owned())
            .map_err(Error::msg)?
            .build())
    }

    /// Read the configuration from the `CLOUDINARY_URL` environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let url = std::env::var(CLOUDINARY_URL_ENV)
            .map_err(|e| Error::msg(format!("{CLOUDINARY_URL_ENV} is not usable: {e}")))?;
        Self::from_url(&url)
    }

    /// Full upload url for the given resource type.
    pub fn upload_url(&self, resource_type: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.cloud_name),
            urlencoding::encode(resource_type)
        )
    }
}
