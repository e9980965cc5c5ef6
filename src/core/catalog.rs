//! Connection catalog: a client-side snapshot of the server's connection
//! registry plus the currently selected connection.

use std::sync::Arc;

use crate::api::models::{ConnectionInfo, ConnectionTest, NewConnection};
use crate::core::backend::CatalogBackend;
use crate::error::{AppError, CatalogError};
use crate::utils::retry::{RetryConfig, RetryExecutor};
use crate::utils::validation::validate_connection_draft;

/// A registered database connection, as listed by the server
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: String,
    pub name: String,
    pub database_name: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_type: Option<String>,
}

impl Connection {
    fn from_info(id: String, info: ConnectionInfo) -> Self {
        Self {
            id,
            name: info.name,
            database_name: info.database,
            host: info.host,
            port: info.port,
            db_type: info.db_type,
        }
    }

    /// `host:port` when both are known
    pub fn address(&self) -> Option<String> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) => Some(format!("{}:{}", host, port)),
            (Some(host), None) => Some(host.clone()),
            _ => None,
        }
    }
}

pub struct ConnectionCatalog {
    backend: Arc<dyn CatalogBackend>,
    connections: Vec<Connection>,
    selected: Option<String>,
    /// Last draft that passed a connection test
    validated: Option<NewConnection>,
    retry: RetryConfig,
}

impl ConnectionCatalog {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self {
            backend,
            connections: Vec::new(),
            selected: None,
            validated: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Connections ordered by name, then id
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn ids(&self) -> Vec<String> {
        self.connections.iter().map(|c| c.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn selected(&self) -> Option<&Connection> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: &str) -> Result<&Connection, CatalogError> {
        let index = self
            .connections
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CatalogError::UnknownConnection { id: id.to_string() })?;
        self.selected = Some(id.to_string());
        Ok(&self.connections[index])
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Replace the snapshot with the server's current list
    pub async fn refresh(&mut self) -> Result<&[Connection], AppError> {
        let backend = Arc::clone(&self.backend);
        let list = RetryExecutor::new(self.retry.clone())
            .execute(|| {
                let backend = Arc::clone(&backend);
                async move { backend.list().await }
            })
            .await?;

        let mut connections: Vec<Connection> = list
            .connections
            .into_iter()
            .map(|(id, info)| Connection::from_info(id, info))
            .collect();
        connections.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        log::debug!("Catalog refreshed: {} connection(s)", connections.len());
        self.connections = connections;

        // A selection that vanished server-side is dropped
        if self.selected.as_deref().is_some_and(|id| self.get(id).is_none()) {
            self.selected = None;
        }

        Ok(&self.connections)
    }

    /// Ask the server to try the connection. A passing draft is remembered
    /// so that [`ConnectionCatalog::add`] accepts it.
    pub async fn test(&mut self, draft: &NewConnection) -> Result<ConnectionTest, AppError> {
        validate_connection_draft(draft)?;
        let outcome = self.backend.test(draft).await?;

        if outcome.valid {
            self.validated = Some(draft.clone());
        } else {
            log::debug!(
                "Connection test failed for '{}': {}",
                draft.name,
                outcome.error.as_deref().unwrap_or("no reason given")
            );
            self.validated = None;
        }
        Ok(outcome)
    }

    /// Register a connection that passed [`ConnectionCatalog::test`] with
    /// identical settings. Returns the new id.
    pub async fn add(&mut self, draft: NewConnection) -> Result<String, AppError> {
        validate_connection_draft(&draft)?;
        if self.validated.as_ref() != Some(&draft) {
            return Err(CatalogError::NotValidated { name: draft.name }.into());
        }

        let id = self.backend.add(&draft).await?;
        log::debug!("Connection '{}' added as {}", draft.name, id);
        self.validated = None;
        self.refresh().await?;
        Ok(id)
    }

    /// Remove a connection; deleting the selected one clears the selection
    pub async fn delete(&mut self, id: &str) -> Result<(), AppError> {
        self.backend.delete(id).await?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        self.refresh().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ConnectionList;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory registry standing in for the server
    #[derive(Default)]
    struct MemoryBackend {
        entries: Mutex<HashMap<String, ConnectionInfo>>,
        next_id: Mutex<u32>,
        reject_tests: bool,
    }

    impl MemoryBackend {
        fn with(entries: &[(&str, &str, &str)]) -> Arc<Self> {
            let backend = Self::default();
            {
                let mut map = backend.entries.lock().unwrap();
                for (id, name, database) in entries {
                    map.insert(id.to_string(), info(name, database));
                }
            }
            Arc::new(backend)
        }
    }

    fn info(name: &str, database: &str) -> ConnectionInfo {
        ConnectionInfo {
            name: name.to_string(),
            database: database.to_string(),
            host: Some("localhost".to_string()),
            port: Some(5432),
            db_type: Some("postgresql".to_string()),
        }
    }

    #[async_trait]
    impl CatalogBackend for MemoryBackend {
        async fn list(&self) -> Result<ConnectionList, ApiError> {
            Ok(ConnectionList {
                connections: self.entries.lock().unwrap().clone(),
            })
        }

        async fn add(&self, connection: &NewConnection) -> Result<String, ApiError> {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let id = format!("new-{}", next);
            self.entries
                .lock()
                .unwrap()
                .insert(id.clone(), info(&connection.name, &connection.database));
            Ok(id)
        }

        async fn delete(&self, id: &str) -> Result<(), ApiError> {
            match self.entries.lock().unwrap().remove(id) {
                Some(_) => Ok(()),
                None => Err(ApiError::Http {
                    status: 404,
                    endpoint: format!("/api/databases/{}", id),
                    message: format!("Connection {} not found", id),
                }),
            }
        }

        async fn test(&self, _connection: &NewConnection) -> Result<ConnectionTest, ApiError> {
            if self.reject_tests {
                Ok(ConnectionTest {
                    valid: false,
                    error: Some("password authentication failed".to_string()),
                })
            } else {
                Ok(ConnectionTest {
                    valid: true,
                    error: None,
                })
            }
        }
    }

    fn draft(name: &str) -> NewConnection {
        NewConnection {
            name: name.to_string(),
            host: "localhost".to_string(),
            port: 5432,
            username: "admin".to_string(),
            password: "secret".to_string(),
            database: "shop".to_string(),
            db_type: "postgresql".to_string(),
        }
    }

    #[tokio::test]
    async fn test_refresh_orders_by_name() {
        let backend = MemoryBackend::with(&[("b", "Zeta", "z"), ("a", "Alpha", "a"), ("c", "Alpha", "c")]);
        let mut catalog = ConnectionCatalog::new(backend);

        let ids: Vec<String> = catalog
            .refresh()
            .await
            .unwrap()
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(
            catalog.get("a").and_then(|c| c.address()),
            Some("localhost:5432".to_string())
        );
    }

    #[tokio::test]
    async fn test_select_requires_known_id() {
        let backend = MemoryBackend::with(&[("a", "Alpha", "a")]);
        let mut catalog = ConnectionCatalog::new(backend);
        catalog.refresh().await.unwrap();

        assert!(matches!(
            catalog.select("missing"),
            Err(CatalogError::UnknownConnection { .. })
        ));
        assert!(catalog.selected().is_none());

        assert_eq!(catalog.select("a").unwrap().name, "Alpha");
        assert_eq!(catalog.selected_id(), Some("a"));

        catalog.clear_selection();
        assert!(catalog.selected().is_none());
    }

    #[tokio::test]
    async fn test_add_requires_passing_test() {
        let backend = MemoryBackend::with(&[]);
        let mut catalog = ConnectionCatalog::new(backend);

        let result = catalog.add(draft("Prod")).await;
        assert!(matches!(
            result,
            Err(AppError::Catalog(CatalogError::NotValidated { .. }))
        ));

        assert!(catalog.test(&draft("Prod")).await.unwrap().valid);

        // Changing any field after the test invalidates it
        let mut edited = draft("Prod");
        edited.port = 5433;
        assert!(catalog.add(edited).await.is_err());

        let id = catalog.add(draft("Prod")).await.unwrap();
        assert_eq!(catalog.get(&id).map(|c| c.name.as_str()), Some("Prod"));

        // The validation is consumed by the add
        assert!(catalog.add(draft("Prod")).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_test_blocks_add() {
        let backend = Arc::new(MemoryBackend {
            reject_tests: true,
            ..Default::default()
        });
        let mut catalog = ConnectionCatalog::new(backend);

        let outcome = catalog.test(&draft("Prod")).await.unwrap();
        assert!(!outcome.valid);
        assert_eq!(
            outcome.error.as_deref(),
            Some("password authentication failed")
        );
        assert!(catalog.add(draft("Prod")).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_draft_is_not_sent() {
        let backend = MemoryBackend::with(&[]);
        let mut catalog = ConnectionCatalog::new(backend);

        let mut bad = draft("Prod");
        bad.database = String::new();
        assert!(matches!(
            catalog.test(&bad).await,
            Err(AppError::Catalog(CatalogError::InvalidDraft { .. }))
        ));
    }

    #[tokio::test]
    async fn test_delete_selected_clears_selection() {
        let backend = MemoryBackend::with(&[("a", "Alpha", "a"), ("b", "Beta", "b")]);
        let mut catalog = ConnectionCatalog::new(backend);
        catalog.refresh().await.unwrap();

        catalog.select("b").unwrap();
        catalog.delete("a").await.unwrap();
        assert_eq!(catalog.selected_id(), Some("b"));
        assert_eq!(catalog.connections().len(), 1);

        catalog.delete("b").await.unwrap();
        assert!(catalog.selected_id().is_none());
        assert!(catalog.connections().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_surfaces_api_error() {
        let backend = MemoryBackend::with(&[]);
        let mut catalog =
            ConnectionCatalog::new(backend).with_retry_config(RetryConfig::none());

        let err = catalog.delete("ghost").await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::Http { status: 404, .. })));
    }
}
