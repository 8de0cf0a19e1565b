//! HTTP client for the CMC Cloud REST API.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::ApiConfig;
use crate::error::ApiError;

const PROJECT_HEADER: &str = "x-project-id";
const REGION_HEADER: &str = "x-region-id";

/// Authenticated REST client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CmcClient {
    client: reqwest::Client,
    base_url: String,
}

impl CmcClient {
    /// Create a new client with auth, project and region headers set.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|_| ApiError::Config("invalid API key format".into()))?,
        );
        headers.insert(
            HeaderName::from_static(PROJECT_HEADER),
            HeaderValue::from_str(&config.project_id)
                .map_err(|_| ApiError::Config("invalid project id".into()))?,
        );
        headers.insert(
            HeaderName::from_static(REGION_HEADER),
            HeaderValue::from_str(&config.region_id)
                .map_err(|_| ApiError::Config("invalid region id".into()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).send().await?;
        self.handle_response(path, response).await
    }

    /// Make a GET request with query parameters.
    pub async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        debug!(path, "GET");
        let response = self.client.get(self.url(path)).query(query).send().await?;
        self.handle_response(path, response).await
    }

    /// Make a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        self.handle_response(path, response).await
    }

    /// Make a POST request and discard the acknowledgement body.
    pub async fn post_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        self.handle_ack(path, response).await
    }

    /// Make a PUT request and discard the acknowledgement body.
    pub async fn put_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        debug!(path, "PUT");
        let response = self.client.put(self.url(path)).json(body).send().await?;
        self.handle_ack(path, response).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        debug!(path, "DELETE");
        let response = self.client.delete(self.url(path)).send().await?;
        self.handle_ack(path, response).await
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(self.handle_error(path, response).await);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn handle_ack(&self, path: &str, response: reqwest::Response) -> Result<(), ApiError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.handle_error(path, response).await)
        }
    }

    /// Turn an error response into an [`ApiError`].
    async fn handle_error(&self, path: &str, response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        if status == 404 {
            return ApiError::NotFound {
                path: path.to_string(),
            };
        }

        let body = response.text().await.unwrap_or_default();
        error!(status, path, body = %body, "API request failed");

        match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(parsed) => ApiError::api(
                status,
                parsed.code.unwrap_or_else(|| "unknown".to_string()),
                parsed
                    .message
                    .or(parsed.error)
                    .unwrap_or_else(|| "Unknown error".to_string()),
            ),
            Err(_) if body.trim().is_empty() => ApiError::api(status, "unknown", "Unknown error"),
            Err(_) => ApiError::api(status, "unknown", body.trim()),
        }
    }
}

/// API error response structure.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}
