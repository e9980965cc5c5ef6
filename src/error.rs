use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("DisplayError: {0}")]
    Display(#[from] DisplayError),
    #[error("CatalogError: {0}")]
    Catalog(#[from] CatalogError),
    #[error("UtilsError: {0}")]
    Utils(#[from] UtilsError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("No database connection selected")]
    NoConnection { available: Vec<String> },
    #[error("Query failed: {detail}")]
    QueryFailed { detail: String },
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("HTTP error: {status} {message}")]
    Http {
        status: u16,
        endpoint: String,
        message: String,
    },
    #[error("Authentication failed")]
    Unauthorized {
        status: u16,
        endpoint: String,
        server_message: String,
    },
}

impl ApiError {
    /// Human-readable failure text, preferring what the server said.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Http { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Http { status, .. } => format!("request failed with status {}", status),
            ApiError::Unauthorized { server_message, .. } if !server_message.is_empty() => {
                server_message.clone()
            }
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration save failed: {message}")]
    ConfigSaveFailed { message: String },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Table formatting failed: {0}")]
    TableFormat(String),
    #[error("Terminal output error: {0}")]
    TerminalOutput(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },
    #[error("Unknown configuration key '{key}'")]
    UnknownKey { key: String },
    #[error("Invalid configuration value for '{field}': {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Connection '{id}' not found")]
    UnknownConnection { id: String },
    #[error("Connection '{name}' must pass a connection test before it can be added")]
    NotValidated { name: String },
    #[error("Invalid connection field '{field}': {reason}")]
    InvalidDraft { field: String, reason: String },
    #[error("Connection test failed: {reason}")]
    TestFailed { reason: String },
}

#[derive(Error, Debug)]
pub enum UtilsError {
    #[error("Validation error: {message}")]
    Validation { message: String },
    #[error("Input processing error: {message}")]
    InputProcessing { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) => match api_error {
                ApiError::Unauthorized { .. } => ErrorSeverity::High,
                ApiError::Timeout { .. } => ErrorSeverity::Medium,
                ApiError::Http { status, .. } if *status >= 500 => ErrorSeverity::High,
                ApiError::Http { status: 0, .. } => ErrorSeverity::Critical,
                _ => ErrorSeverity::Medium,
            },
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Display(_) => ErrorSeverity::Low,
            AppError::Catalog(catalog_error) => match catalog_error {
                CatalogError::TestFailed { .. } => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            AppError::Utils(_) => ErrorSeverity::Low,
        }
    }

    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Cli(CliError::NoConnection { .. }) => {
                "No database connection selected".to_string()
            }
            AppError::Api(api_error) => api_error.detail(),
            AppError::Cli(CliError::QueryFailed { detail }) => format!("Query failed: {}", detail),
            AppError::Catalog(CatalogError::UnknownConnection { id }) => {
                format!("Connection {} not found", id)
            }
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Cli(CliError::NoConnection { available }) if available.is_empty() => {
                Some("'askdb connections add' to register a database first".to_string())
            }
            AppError::Cli(CliError::NoConnection { available }) => Some(format!(
                "pass --connection <id> (available: {})",
                available.join(", ")
            )),
            AppError::Api(ApiError::Http { status: 0, .. }) => {
                Some("Check that the query engine server is running and reachable".to_string())
            }
            AppError::Api(ApiError::Timeout { .. }) => {
                Some("The query engine is slow to answer; raise timeout_seconds".to_string())
            }
            AppError::Catalog(CatalogError::NotValidated { .. }) => {
                Some("'askdb connections test' the same settings first".to_string())
            }
            AppError::Catalog(CatalogError::UnknownConnection { .. }) => {
                Some("'askdb connections list' to see available connections".to_string())
            }
            AppError::Config(ConfigError::UnknownKey { .. }) => Some(
                "valid keys: server_url, timeout_seconds, default_connection, use_colors"
                    .to_string(),
            ),
            _ => None,
        }
    }
}
