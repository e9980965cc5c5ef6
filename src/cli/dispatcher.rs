use std::path::PathBuf;
use std::sync::Arc;

use crate::api::client::{DEFAULT_TIMEOUT_SECS, QueryEngineClient};
use crate::cli::command_handlers::{AskHandler, ConfigHandler, ConnectionHandler};
use crate::cli::main_types::{Commands, ConnectionCommands};
use crate::cli::repl::Repl;
use crate::core::catalog::ConnectionCatalog;
use crate::core::session::ConversationSession;
use crate::display::{ResultPresenter, ResultTab, colors_supported};
use crate::error::{AppError, CliError};
use crate::storage::config::{Config, Profile};
use crate::utils::validation::validate_url;

/// Settings from the command line that override the profile
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub profile: Option<String>,
    pub server_url: Option<String>,
    pub no_color: bool,
}

pub struct Dispatcher {
    config: Config,
    config_path: Option<PathBuf>,
    profile_name: String,
    profile: Profile,
    server_url: String,
    use_colors: bool,
}

impl Dispatcher {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        overrides: Overrides,
    ) -> Result<Self, AppError> {
        let profile_name = config.active_profile_name(overrides.profile.as_deref());
        let profile = config.resolve(overrides.profile.as_deref())?;
        let server_url = overrides
            .server_url
            .unwrap_or_else(|| profile.server_url.clone());
        let use_colors =
            !overrides.no_color && profile.use_colors.unwrap_or(true) && colors_supported();

        log::debug!("Using profile '{}' against {}", profile_name, server_url);

        Ok(Self {
            config,
            config_path,
            profile_name,
            profile,
            server_url,
            use_colors,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    fn client(&self) -> Result<Arc<QueryEngineClient>, AppError> {
        validate_url(&self.server_url)?;
        let timeout = self.profile.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Arc::new(QueryEngineClient::with_timeout(
            self.server_url.clone(),
            timeout,
        )?))
    }

    fn presenter(&self) -> ResultPresenter {
        ResultPresenter::new().with_colors(self.use_colors)
    }

    pub async fn dispatch(&mut self, command: Commands) -> Result<(), AppError> {
        match command {
            Commands::Config { command } => {
                let handler = ConfigHandler::new(self.config_path.clone());
                handler.handle(command, &mut self.config, &self.profile_name)
            }
            Commands::Connections { command } => self.handle_connections(command).await,
            Commands::Ask {
                question,
                connection,
                tab,
                all,
            } => {
                let tabs: Vec<ResultTab> = if all {
                    ResultTab::ALL.to_vec()
                } else {
                    vec![tab]
                };
                self.handle_ask(&question, connection, &tabs).await
            }
            Commands::Chat { connection } => self.handle_chat(connection).await,
        }
    }

    async fn handle_connections(&self, command: ConnectionCommands) -> Result<(), AppError> {
        let client = self.client()?;
        let mut catalog = ConnectionCatalog::new(client);
        ConnectionHandler::new(self.use_colors)
            .handle(
                command,
                &mut catalog,
                self.profile.default_connection.as_deref(),
            )
            .await
    }

    async fn handle_ask(
        &self,
        question: &str,
        connection: Option<String>,
        tabs: &[ResultTab],
    ) -> Result<(), AppError> {
        let client = self.client()?;
        let mut catalog = ConnectionCatalog::new(client.clone());
        catalog.refresh().await?;

        let connection_id = self.choose_connection(&mut catalog, connection)?;
        let mut session = ConversationSession::new(client);
        session.set_active_connection(Some(connection_id));

        let mut presenter = self.presenter();
        let spinner = atty::is(atty::Stream::Stderr);
        let output = AskHandler::new(self.use_colors, spinner)
            .handle(&mut session, &mut presenter, question, tabs)
            .await?;
        println!("{}", output);
        Ok(())
    }

    async fn handle_chat(&self, connection: Option<String>) -> Result<(), AppError> {
        let client = self.client()?;
        let mut catalog = ConnectionCatalog::new(client.clone());
        let mut session = ConversationSession::new(client);

        // The chat can start without a connection; /use picks one later
        match catalog.refresh().await {
            Ok(_) => match self.choose_connection(&mut catalog, connection) {
                Ok(id) => session.set_active_connection(Some(id)),
                Err(e) => log::warn!("{}", e.display_friendly()),
            },
            Err(e) => log::warn!("Could not load connections: {}", e.display_friendly()),
        }

        let spinner = atty::is(atty::Stream::Stderr);
        Repl::new(session, catalog, self.presenter(), self.use_colors, spinner)
            .run()
            .await
    }

    /// Explicit id, else the profile default, else the only registered
    /// connection. The choice must exist in the refreshed catalog.
    fn choose_connection(
        &self,
        catalog: &mut ConnectionCatalog,
        requested: Option<String>,
    ) -> Result<String, AppError> {
        let candidate = requested
            .or_else(|| self.profile.default_connection.clone())
            .or_else(|| match catalog.connections() {
                [only] => Some(only.id.clone()),
                _ => None,
            });

        match candidate {
            Some(id) => Ok(catalog.select(&id)?.id.clone()),
            None => Err(CliError::NoConnection {
                available: catalog.ids(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(profile: Profile) -> Config {
        let mut config = Config::default();
        config.set_profile("default".to_string(), profile);
        config
    }

    #[test]
    fn test_server_url_override() {
        let config = config_with(Profile::default());
        let overrides = Overrides {
            server_url: Some("http://engine.test:9000".to_string()),
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(config, None, overrides).unwrap();
        assert_eq!(dispatcher.server_url(), "http://engine.test:9000");
        assert_eq!(dispatcher.profile_name(), "default");
    }

    #[test]
    fn test_profile_server_url_used_by_default() {
        let config = config_with(Profile {
            server_url: "http://engine.internal:8000".to_string(),
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(config, None, Overrides::default()).unwrap();
        assert_eq!(dispatcher.server_url(), "http://engine.internal:8000");
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let overrides = Overrides {
            profile: Some("staging".to_string()),
            ..Default::default()
        };
        assert!(Dispatcher::new(Config::default(), None, overrides).is_err());
    }

    #[test]
    fn test_invalid_server_url_rejected_before_requests() {
        let overrides = Overrides {
            server_url: Some("engine.test".to_string()),
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(Config::default(), None, overrides).unwrap();
        assert!(dispatcher.client().is_err());
    }
}
