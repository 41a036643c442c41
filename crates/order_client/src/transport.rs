use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use shared::protocol::{ActionResponse, DeleteOrderRequest, MoveOrderRequest, OrderFields};
use tracing::debug;
use url::Url;

use crate::{config::Settings, OrderApi};

/// `OrderApi` over HTTP. Response status codes are not interpreted: the body
/// is decoded as an `ActionResponse` either way.
#[derive(Debug, Clone)]
pub struct HttpOrderApi {
    http: Client,
    base_url: Url,
}

impl HttpOrderApi {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("failed to build http client")?;
        Self::with_client(http, &settings.server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self> {
        let base_url = Url::parse(server_url.trim_end_matches('/'))
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path '{path}'"))
    }

    async fn send(&self, path: &str, request: RequestBuilder) -> Result<ActionResponse> {
        debug!(endpoint = path, "sending order request");
        let res = request
            .send()
            .await
            .with_context(|| format!("request to {path} failed"))?;
        let status = res.status();
        res.json::<ActionResponse>()
            .await
            .with_context(|| format!("{path} returned an undecodable body (http {status})"))
    }

    async fn post_json<T: serde::Serialize + Sync>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ActionResponse> {
        let url = self.endpoint(path)?;
        self.send(path, self.http.post(url).json(body)).await
    }

    async fn post_form(&self, path: &str, fields: &OrderFields) -> Result<ActionResponse> {
        let url = self.endpoint(path)?;
        self.send(path, self.http.post(url).form(fields)).await
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn move_order(&self, request: &MoveOrderRequest) -> Result<ActionResponse> {
        self.post_json("/move_order", request).await
    }

    async fn delete_order(&self, request: &DeleteOrderRequest) -> Result<ActionResponse> {
        self.post_json("/delete_order", request).await
    }

    async fn update_order(&self, fields: &OrderFields) -> Result<ActionResponse> {
        self.post_form("/update_order", fields).await
    }

    async fn auto_save_order(&self, fields: &OrderFields) -> Result<ActionResponse> {
        self.post_form("/auto_save_order", fields).await
    }

    async fn save_draft(&self, fields: &OrderFields) -> Result<ActionResponse> {
        self.post_form("/save_draft", fields).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
