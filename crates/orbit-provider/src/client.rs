//! Reqwest implementation of [`ChatProvider`].
//!
//! Every request carries the configured bearer token and is bounded by a
//! client-level timeout; a timed-out call surfaces as
//! [`ProviderError::Timeout`] and is handled exactly like any other failure.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    error::ProviderError,
    types::{AddedMember, CreatedSpace, SpaceMetadata},
    ChatProvider,
};

/// Async HTTP client for the external chat provider.
pub struct ProviderClient {
    base_url: String,
    token: String,
    http: Client,
}

impl ProviderClient {
    /// Create a client for the given provider endpoint.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Orbit-Sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Protocol(e.to_string()))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self { base_url, token: token.into(), http })
    }

    /// Build a client from the global application config.
    pub fn from_config(
        config: &orbit_common::config::ProviderConfig,
    ) -> Result<Self, ProviderError> {
        Self::new(
            config.base_url.clone(),
            config.token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn parse<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let resp = resp.error_for_status()?;
        Ok(resp.json().await?)
    }

    async fn ack(resp: reqwest::Response) -> Result<(), ProviderError> {
        resp.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl ChatProvider for ProviderClient {
    async fn create_space(&self, metadata: &SpaceMetadata) -> Result<CreatedSpace, ProviderError> {
        let url = self.url("/api/v1/rooms");
        debug!("Provider POST {url}");
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(metadata)
            .send()
            .await?;
        Self::parse(resp).await
    }

    async fn add_member(
        &self,
        external_space_id: &str,
        user_identifier: &str,
    ) -> Result<String, ProviderError> {
        // PUT: add-if-absent, safe to repeat on retry.
        let url = self.url(&format!(
            "/api/v1/rooms/{}/members/{}",
            urlencoded(external_space_id),
            urlencoded(user_identifier)
        ));
        debug!("Provider PUT {url}");
        let resp = self.http.put(&url).bearer_auth(&self.token).send().await?;
        let added: AddedMember = Self::parse(resp).await?;
        Ok(added.member_ref)
    }

    async fn remove_member(
        &self,
        external_space_id: &str,
        external_member_ref: &str,
    ) -> Result<(), ProviderError> {
        let url = self.url(&format!(
            "/api/v1/rooms/{}/members/{}",
            urlencoded(external_space_id),
            urlencoded(external_member_ref)
        ));
        debug!("Provider DELETE {url}");
        let resp = self.http.delete(&url).bearer_auth(&self.token).send().await?;
        Self::ack(resp).await
    }

    async fn update_space(
        &self,
        external_space_id: &str,
        metadata: &SpaceMetadata,
    ) -> Result<(), ProviderError> {
        let url = self.url(&format!("/api/v1/rooms/{}", urlencoded(external_space_id)));
        debug!("Provider PATCH {url}");
        let resp = self
            .http
            .patch(&url)
            .bearer_auth(&self.token)
            .json(metadata)
            .send()
            .await?;
        Self::ack(resp).await
    }

    async fn delete_space(&self, external_space_id: &str) -> Result<(), ProviderError> {
        let url = self.url(&format!("/api/v1/rooms/{}", urlencoded(external_space_id)));
        debug!("Provider DELETE {url}");
        let resp = self.http.delete(&url).bearer_auth(&self.token).send().await?;
        Self::ack(resp).await
    }
}

fn urlencoded(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}
