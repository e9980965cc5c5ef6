//! Seams between the session/catalog state machines and the remote service.
//!
//! Both traits are implemented by [`QueryEngineClient`]; tests plug in
//! in-memory doubles.

use crate::api::client::QueryEngineClient;
use crate::api::models::{ChatRequest, ConnectionList, ConnectionTest, NewConnection, QueryResult};
use crate::error::ApiError;
use async_trait::async_trait;

/// Remote natural-language query operation
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn ask(&self, request: ChatRequest) -> Result<QueryResult, ApiError>;
}

/// Remote connection registry
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn list(&self) -> Result<ConnectionList, ApiError>;

    async fn add(&self, connection: &NewConnection) -> Result<String, ApiError>;

    async fn delete(&self, id: &str) -> Result<(), ApiError>;

    async fn test(&self, connection: &NewConnection) -> Result<ConnectionTest, ApiError>;
}

#[async_trait]
impl QueryBackend for QueryEngineClient {
    async fn ask(&self, request: ChatRequest) -> Result<QueryResult, ApiError> {
        self.chat(&request).await
    }
}

#[async_trait]
impl CatalogBackend for QueryEngineClient {
    async fn list(&self) -> Result<ConnectionList, ApiError> {
        self.list_connections().await
    }

    async fn add(&self, connection: &NewConnection) -> Result<String, ApiError> {
        self.add_connection(connection).await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.delete_connection(id).await
    }

    async fn test(&self, connection: &NewConnection) -> Result<ConnectionTest, ApiError> {
        self.test_connection(connection).await
    }
}
