//! HTTP implementation of the downstream collaborator.

use std::time::Duration;

use crate::config::DownstreamConfig;
use crate::downstream::{Downstream, DownstreamError, Payload};

/// GETs a JSON document from a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpDownstream {
    client: reqwest::Client,
    url: String,
}

impl HttpDownstream {
    pub fn new(config: &DownstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Downstream for HttpDownstream {
    async fn fetch(&self) -> Result<Payload, DownstreamError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownstreamError::Status(status.as_u16()));
        }

        Ok(response.json::<Payload>().await?)
    }
}
