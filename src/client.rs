use std::time::Duration;

use anyhow::Error;
use reqwest::{Client, ClientBuilder, multipart::Form};
use serde::Deserialize;
use serde_json::Value;
use std::result::Result;

use crate::{api::StoreResponse, error::StoreError};

#[repr(transparent)]
#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
}

pub struct HttpClientBuilder {
    builder: ClientBuilder,
}

/// Error body returned by the provider on a rejected upload.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            builder: ClientBuilder::new()
                .connect_timeout(Duration::from_secs(5))
                // read timeout set to 30 seconds.
                .read_timeout(Duration::from_secs(30))
                // whole request deadline.
                .timeout(Duration::from_secs(120))
                // 5 minutes not working then release connection.
                .pool_idle_timeout(Duration::from_secs(300))
                .pool_max_idle_per_host(5)
                .user_agent(format!("image-uplink/{}", crate::VERSION)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.builder = self.builder.timeout(timeout);
        self
    }

    pub fn build(self) -> Result<HttpClient, Error> {
        Ok(HttpClient {
            inner: self.builder.build()?,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Post a multipart form and decode the json object the provider answers
    /// with. Exactly one request is sent, failures are never retried.
    pub async fn send_form(&self, url: &str, form: Form) -> Result<StoreResponse, StoreError> {
        let response = self.inner.post(url).multipart(form).send().await?;
        let status = response.status();
        if status.is_success() {
            // 2xx
            return match response.json::<Value>().await? {
                Value::Object(body) => {
                    tracing::debug!("upload response: {:?}", body);
                    Ok(body)
                }
                other => {
                    tracing::error!("upload response is not a json object: {:?}", other);
                    Err(StoreError::UploadResponseMalformed)
                }
            };
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderErrorBody>(&body)
            .map(|body| body.error.message)
            .unwrap_or_else(|_| format!("provider responded with status {status}"));
        tracing::error!("upload to {} failed with {}: {}", url, status, message);
        Err(StoreError::Provider(message))
    }
}
