use crate::api::models::{
    AddConnectionResponse, ChatRequest, ConnectionList, ConnectionTest, NewConnection,
    QueryResult,
};
use crate::error::ApiError;
use crate::utils::error_helpers::{
    convert_json_error, convert_request_error, convert_timeout_error, extract_error_message,
};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const USER_AGENT: &str = concat!("askdb/", env!("CARGO_PKG_VERSION"));

const CHAT_ENDPOINT: &str = "/api/chat";
const DATABASES_ENDPOINT: &str = "/api/databases";
const VALIDATE_ENDPOINT: &str = "/api/validate-connection";

/// HTTP client for the query engine server
#[derive(Debug, Clone)]
pub struct QueryEngineClient {
    client: Client,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl QueryEngineClient {
    // Create client with default settings
    pub fn new(base_url: String) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(base_url: String, timeout_secs: u64) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Http {
                status: 0,
                endpoint: "client_init".to_string(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(QueryEngineClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        })
    }

    pub fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    /// URL of one registered connection, with the id escaped as a single path segment
    pub fn connection_url(&self, id: &str) -> Result<Url, ApiError> {
        let invalid = |message: String| ApiError::Http {
            status: 0,
            endpoint: DATABASES_ENDPOINT.to_string(),
            message,
        };
        let mut url = Url::parse(&format!("{}{}", self.base_url, DATABASES_ENDPOINT))
            .map_err(|e| invalid(format!("Invalid server URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("Server URL cannot hold a path: {}", self.base_url)))?
            .push(id);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response, ApiError> {
        log::debug!("Sending request to {}", endpoint);
        request
            .send()
            .await
            .map_err(|e| convert_request_error(e, endpoint, self.timeout_secs))
    }

    pub async fn handle_response<T>(&self, response: Response, endpoint: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| convert_json_error(e, endpoint))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = extract_error_message(&error_text);
            log::debug!("{} failed with status {}: {}", endpoint, status, message);

            match status.as_u16() {
                401 | 403 => Err(ApiError::Unauthorized {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                    server_message: message,
                }),
                408 | 504 if message.is_empty() => {
                    Err(convert_timeout_error(endpoint, self.timeout_secs))
                }
                _ => Err(ApiError::Http {
                    status: status.as_u16(),
                    endpoint: endpoint.to_string(),
                    message,
                }),
            }
        }
    }

    /// Ask a natural-language question against a connection
    pub async fn chat(&self, request: &ChatRequest) -> Result<QueryResult, ApiError> {
        let response = self
            .send(
                self.build_request(Method::POST, CHAT_ENDPOINT).json(request),
                CHAT_ENDPOINT,
            )
            .await?;
        self.handle_response(response, CHAT_ENDPOINT).await
    }

    pub async fn list_connections(&self) -> Result<ConnectionList, ApiError> {
        let response = self
            .send(
                self.build_request(Method::GET, DATABASES_ENDPOINT),
                DATABASES_ENDPOINT,
            )
            .await?;
        self.handle_response(response, DATABASES_ENDPOINT).await
    }

    /// Register a connection, returning the id the server assigned
    pub async fn add_connection(&self, connection: &NewConnection) -> Result<String, ApiError> {
        let response = self
            .send(
                self.build_request(Method::POST, DATABASES_ENDPOINT)
                    .json(connection),
                DATABASES_ENDPOINT,
            )
            .await?;
        let added: AddConnectionResponse =
            self.handle_response(response, DATABASES_ENDPOINT).await?;
        Ok(added.connection_id)
    }

    pub async fn delete_connection(&self, id: &str) -> Result<(), ApiError> {
        let endpoint = format!("{}/{}", DATABASES_ENDPOINT, id);
        let url = self.connection_url(id)?;
        let response = self
            .send(self.client.request(Method::DELETE, url), &endpoint)
            .await?;
        let _: serde_json::Value = self.handle_response(response, &endpoint).await?;
        Ok(())
    }

    pub async fn test_connection(
        &self,
        connection: &NewConnection,
    ) -> Result<ConnectionTest, ApiError> {
        let response = self
            .send(
                self.build_request(Method::POST, VALIDATE_ENDPOINT)
                    .json(connection),
                VALIDATE_ENDPOINT,
            )
            .await?;
        self.handle_response(response, VALIDATE_ENDPOINT).await
    }
}
