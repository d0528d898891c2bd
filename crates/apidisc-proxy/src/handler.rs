//! HTTP discovery handler implementation

use std::time::Duration;

use apidisc_core::{
    ApiGroupDiscoveryList, ApiResourceList, DiscoveryHandler, DiscoveryRequest,
    DiscoveryResponse, HandlerError, HandlerResult, AGGREGATED_CONTENT_TYPE,
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ProxyError, ProxyResult};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `Accept` header of an aggregated request: the aggregated format first,
/// plain JSON as fallback
pub const AGGREGATED_ACCEPT: &str =
    "application/json;g=apidiscovery.k8s.io;v=v2beta1;as=APIGroupDiscoveryList,application/json";

/// Content type marker of an aggregated response
const AGGREGATED_MARKER: &str = "as=APIGroupDiscoveryList";

fn transport_error(err: reqwest::Error) -> HandlerError {
    if err.is_timeout() {
        HandlerError::Timeout
    } else if err.is_decode() {
        HandlerError::Decode(err.to_string())
    } else {
        HandlerError::Transport(err.to_string())
    }
}

async fn status_error(response: Response) -> HandlerError {
    let status = response.status();
    let message = response
        .text()
        .await
        .ok()
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));
    HandlerError::Status {
        status: status.as_u16(),
        message,
    }
}

fn quote(etag: &str) -> String {
    if etag.starts_with('"') || etag.starts_with("W/") {
        etag.to_string()
    } else {
        format!("\"{}\"", etag)
    }
}

fn unquote(etag: &str) -> String {
    let etag = etag.strip_prefix("W/").unwrap_or(etag);
    etag.trim_matches('"').to_string()
}

/// Discovery handler for a backend served over HTTP
#[derive(Debug, Clone)]
pub struct HttpDiscoveryHandler {
    client: Client,
    base_url: Url,
}

impl HttpDiscoveryHandler {
    /// Create a handler for the server at `base_url`
    /// (e.g. "http://127.0.0.1:9000")
    pub fn new(base_url: &str) -> ProxyResult<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a handler with custom timeouts
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> ProxyResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ProxyError::NotABase(base_url.to_string()));
        }
        // keep any path prefix when joining relative paths
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> HandlerResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| HandlerError::Internal(format!("invalid discovery path {}: {}", path, e)))
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_aggregated(&self, etag: Option<String>) -> HandlerResult<DiscoveryResponse> {
        let url = self.endpoint("apis")?;
        let mut request = self.client.get(url).header(ACCEPT, AGGREGATED_ACCEPT);
        if let Some(etag) = &etag {
            request = request.header(IF_NONE_MATCH, quote(etag));
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(status = %status, "Aggregated discovery response");

        match status {
            StatusCode::NOT_MODIFIED => Ok(DiscoveryResponse::NotModified),
            StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => Ok(DiscoveryResponse::Unsupported),
            status if status.is_success() => {
                let aggregated = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|ct| ct.contains(AGGREGATED_MARKER));
                if !aggregated {
                    return Ok(DiscoveryResponse::Unsupported);
                }

                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(unquote)
                    .filter(|tag| !tag.is_empty());
                let body = response.bytes().await.map_err(transport_error)?;
                let document: ApiGroupDiscoveryList = serde_json::from_slice(&body)?;
                Ok(DiscoveryResponse::Aggregated { document, etag })
            }
            _ => Err(status_error(response).await),
        }
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_legacy(&self, group: &str, version: &str) -> HandlerResult<DiscoveryResponse> {
        let path = if group.is_empty() {
            format!("api/{}", version)
        } else {
            format!("apis/{}/{}", group, version)
        };
        let url = self.endpoint(&path)?;

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        debug!(status = %status, "Legacy discovery response");

        match status {
            StatusCode::NOT_FOUND => Ok(DiscoveryResponse::Unsupported),
            status if status.is_success() => {
                let body = response.bytes().await.map_err(transport_error)?;
                let list: ApiResourceList = serde_json::from_slice(&body)?;
                Ok(DiscoveryResponse::Legacy(list))
            }
            _ => Err(status_error(response).await),
        }
    }
}

#[async_trait]
impl DiscoveryHandler for HttpDiscoveryHandler {
    async fn serve(&self, request: DiscoveryRequest) -> HandlerResult<DiscoveryResponse> {
        match request {
            DiscoveryRequest::Aggregated { etag } => self.fetch_aggregated(etag).await,
            DiscoveryRequest::Legacy { group, version } => {
                self.fetch_legacy(&group, &version).await
            }
        }
    }
}
