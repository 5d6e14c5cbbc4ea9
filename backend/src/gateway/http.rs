//! Upstream estate API gateway over HTTP.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::config::UpstreamConfig;
use super::error::{GatewayError, GatewayResult};
use super::pass_gateway::PassGateway;
use crate::models::{ApiResponse, GatePassCheckinResponse, GateStatusMap, Visitor, VisitorId};
use crate::routes::passes::{visitors_path, CheckinRequest, CHECKIN_PATH, CHECKOUT_PATH, VISITORS_PATH};
use crate::routes::visitors::{visitor_detail_path, VISITOR_DETAIL_PATH};

/// Gateway backed by the estate REST API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    config: UpstreamConfig,
}

impl HttpGateway {
    pub fn new(config: UpstreamConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// `prefix` followed by `segment` as a single percent-encoded path segment,
    /// so operator input can never select a different route.
    fn segment_url(&self, prefix: &str, segment: &str) -> GatewayResult<Url> {
        let mut url = Url::parse(&self.url(prefix)).map_err(|e| {
            GatewayError::configuration(format!("Invalid upstream URL: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| GatewayError::configuration("Upstream URL cannot carry a path"))?
            .push(segment);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
        path: &str,
    ) -> GatewayResult<T> {
        log::debug!("{} -> {}", operation, path);
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| GatewayError::from(e).with_operation(operation, path))?;
        let body = read_body(response)
            .await
            .map_err(|e| e.with_operation(operation, path))?;
        serde_json::from_value(body)
            .map_err(|e| GatewayError::from(e).with_operation(operation, path))
    }

    async fn post_pass(
        &self,
        path: &str,
        operation: &str,
        request: &CheckinRequest,
    ) -> GatewayResult<GatePassCheckinResponse> {
        let envelope: ApiResponse<GatePassCheckinResponse> = self
            .send(self.client.post(self.url(path)).json(request), operation, path)
            .await?;
        Ok(envelope.into_data())
    }
}

/// Decode a response body, turning non-2xx statuses into transport errors that
/// keep the JSON error body.
async fn read_body(response: Response) -> GatewayResult<Value> {
    let status = response.status();
    let text = response.text().await?;
    let body: Option<Value> = serde_json::from_str(&text).ok();

    if !status.is_success() {
        if status.as_u16() == 404 && body.is_none() {
            return Err(GatewayError::not_found(format!("upstream answered {}", status)));
        }
        return Err(GatewayError::transport(
            format!("upstream answered {}", status),
            Some(status.as_u16()),
            body,
        ));
    }

    body.ok_or_else(|| GatewayError::decode(format!("response is not JSON: {}", text.trim())))
}

#[async_trait]
impl PassGateway for HttpGateway {
    async fn health_check(&self) -> GatewayResult<bool> {
        match self.client.head(&self.config.base_url).send().await {
            Ok(response) => Ok(!response.status().is_server_error()),
            Err(e) if e.is_connect() || e.is_timeout() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn check_in(&self, request: &CheckinRequest) -> GatewayResult<GatePassCheckinResponse> {
        self.post_pass(CHECKIN_PATH, "check_in", request).await
    }

    async fn check_out(&self, request: &CheckinRequest) -> GatewayResult<GatePassCheckinResponse> {
        self.post_pass(CHECKOUT_PATH, "check_out", request).await
    }

    async fn list_visitors(&self, base_code: &str) -> GatewayResult<Vec<Visitor>> {
        let path = visitors_path(base_code);
        let url = self
            .segment_url(VISITORS_PATH, base_code)
            .map_err(|e| e.with_operation("list_visitors", &path))?;
        let envelope: ApiResponse<Option<Vec<Visitor>>> = self
            .send(self.client.get(url), "list_visitors", &path)
            .await?;
        Ok(envelope.into_data().unwrap_or_default())
    }

    async fn fetch_gate_statuses(&self, visitor_id: &VisitorId) -> GatewayResult<GateStatusMap> {
        let path = visitor_detail_path(visitor_id.as_str());
        let url = self
            .segment_url(VISITOR_DETAIL_PATH, visitor_id.as_str())
            .map_err(|e| e.with_operation("fetch_gate_statuses", &path))?;
        let payload: Value = self
            .send(self.client.get(url), "fetch_gate_statuses", &path)
            .await?;
        GateStatusMap::from_visitor_payload(&payload)
            .map_err(|e| GatewayError::from(e).with_operation("fetch_gate_statuses", &path))?
            .ok_or_else(|| {
                GatewayError::not_found(format!("Visitor {} has no gate map", visitor_id))
                    .with_operation("fetch_gate_statuses", &path)
            })
    }
}
