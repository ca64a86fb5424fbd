//! This module contains the http asset store talking to a Cloudinary compatible
//! upload api.

use anyhow::Error;
use bytes::Bytes;
use chrono::Utc;
use mediatype::MediaType;
use reqwest::multipart::{Form, Part};

use crate::{
    SignatureService,
    api::{AssetStore, StoreConfig, UploadOptions, object::StoreResponse},
    client::HttpClient,
    constant::DEFAULT_PART_NAME,
    error::StoreError,
};

#[derive(Clone)]
pub struct HttpAssetStore {
    config: StoreConfig,
    client: HttpClient,
    signer: SignatureService,
}

impl HttpAssetStore {
    pub fn new(config: StoreConfig, client: HttpClient) -> Self {
        Self {
            config,
            client,
            signer: SignatureService,
        }
    }

    /// Create a store with the default http client.
    pub fn from_config(config: StoreConfig) -> Result<Self, Error> {
        Ok(Self::new(config, HttpClient::builder().build()?))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Build the signed multipart form for one upload.
    fn form(&self, bytes: Bytes, options: &UploadOptions) -> Form {
        let mut params = options.params();
        params.push(("timestamp", Utc::now().timestamp().to_string()));
        let signature = self.signer.signature(&params, &self.config.api_secret);

        params
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .part("file", file_part(bytes, options))
    }
}

/// Declared content type rendered back by `mediatype`, `None` when absent or
/// unparsable.
fn part_media_type(options: &UploadOptions) -> Option<String> {
    let content_type = options.content_type()?;
    match MediaType::parse(content_type) {
        Ok(media_type) => Some(media_type.to_string()),
        Err(e) => {
            tracing::debug!("Media type parse error: {:?}, sending as octet-stream", e);
            None
        }
    }
}

/// Wrap the payload as the `file` part, tagged with the declared media type
/// when it parses.
fn file_part(bytes: Bytes, options: &UploadOptions) -> Part {
    let length = bytes.len() as u64;
    let file_name = options
        .file_name()
        .unwrap_or(DEFAULT_PART_NAME)
        .to_string();
    let part = Part::stream_with_length(bytes.clone(), length).file_name(file_name.clone());
    let Some(media_type) = part_media_type(options) else {
        return part;
    };
    part.mime_str(&media_type).unwrap_or_else(|e| {
        tracing::debug!("mime {} rejected by reqwest: {:?}", media_type, e);
        Part::stream_with_length(bytes, length).file_name(file_name)
    })
}

#[async_trait::async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(
        &self,
        bytes: Bytes,
        options: &UploadOptions,
    ) -> Result<StoreResponse, StoreError> {
        let url = self.config.upload_url(options.resource_type());
        tracing::debug!(
            "upload {} bytes to {} with public_id {:?}",
            bytes.len(),
            url,
            options.public_id()
        );
        let form = self.form(bytes, options);
        self.client.send_form(url.as_str(), form).await
    }
}
