use std::path::PathBuf;

use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::api::models::NewConnection;
use crate::cli::main_types::{ConfigCommands, ConnectionArgs, ConnectionCommands};
use crate::core::catalog::{Connection, ConnectionCatalog};
use crate::core::session::{ConversationSession, RejectReason, SubmitOutcome};
use crate::display::{
    OperationStatus, ProgressSpinner, ResultPresenter, ResultTab, TranscriptView, display_status,
};
use crate::error::{AppError, CatalogError, CliError, UtilsError};
use crate::storage::config::Config;

/// Standard port for a database type; sqlite has none
pub fn default_port(db_type: &str) -> u16 {
    match db_type {
        "postgresql" => 5432,
        "mysql" => 3306,
        _ => 0,
    }
}

/// Build a draft from command-line arguments, prompting for the password
/// when a networked database was given none
pub fn build_draft(args: ConnectionArgs) -> Result<NewConnection, AppError> {
    let db_type = args.db_type.trim().to_ascii_lowercase();
    let password = match args.password {
        Some(password) => password,
        None if db_type == "sqlite" => String::new(),
        None => rpassword::prompt_password("Database password: ").map_err(|e| {
            UtilsError::InputProcessing {
                message: format!("Failed to read password: {}", e),
            }
        })?,
    };

    Ok(NewConnection {
        name: args.name.trim().to_string(),
        host: args.host.trim().to_string(),
        port: args.port.unwrap_or_else(|| default_port(&db_type)),
        username: args.username.trim().to_string(),
        password,
        database: args.database.trim().to_string(),
        db_type,
    })
}

/// Connection list as a table; the selected connection is starred
pub fn render_connection_list(
    connections: &[Connection],
    selected: Option<&str>,
    use_colors: bool,
) -> String {
    if connections.is_empty() {
        return "No connections registered. Use 'askdb connections add' to register one."
            .to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers: Vec<Cell> = ["", "ID", "Name", "Database", "Type", "Host"]
        .into_iter()
        .map(|header| {
            let cell = Cell::new(header).add_attribute(Attribute::Bold);
            if use_colors { cell.fg(Color::Cyan) } else { cell }
        })
        .collect();
    table.set_header(headers);

    for connection in connections {
        let marker = if selected == Some(connection.id.as_str()) {
            "*"
        } else {
            ""
        };
        let id = if use_colors {
            Cell::new(&connection.id).fg(Color::Cyan)
        } else {
            Cell::new(&connection.id)
        };
        table.add_row(vec![
            Cell::new(marker),
            id,
            Cell::new(&connection.name),
            Cell::new(&connection.database_name),
            Cell::new(connection.db_type.as_deref().unwrap_or("-")),
            Cell::new(connection.address().unwrap_or_else(|| "-".to_string())),
        ]);
    }

    table.to_string()
}

pub struct ConnectionHandler {
    use_colors: bool,
}

impl ConnectionHandler {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub async fn handle(
        &self,
        command: ConnectionCommands,
        catalog: &mut ConnectionCatalog,
        default_connection: Option<&str>,
    ) -> Result<(), AppError> {
        match command {
            ConnectionCommands::List => {
                log::debug!("Listing connections");
                let connections = catalog.refresh().await?;
                println!(
                    "{}",
                    render_connection_list(connections, default_connection, self.use_colors)
                );
                Ok(())
            }
            ConnectionCommands::Test(args) => {
                let draft = build_draft(args)?;
                self.run_test(catalog, &draft).await
            }
            ConnectionCommands::Add(args) => {
                let draft = build_draft(args)?;
                self.run_test(catalog, &draft).await?;

                let name = draft.name.clone();
                let id = catalog.add(draft).await?;
                display_status(
                    &format!("Connection '{}' added (id: {})", name, id),
                    OperationStatus::Success,
                );
                Ok(())
            }
            ConnectionCommands::Remove { id } => {
                log::debug!("Removing connection {}", id);
                catalog.delete(&id).await?;
                display_status(
                    &format!("Connection {} removed", id),
                    OperationStatus::Success,
                );
                Ok(())
            }
        }
    }

    async fn run_test(
        &self,
        catalog: &mut ConnectionCatalog,
        draft: &NewConnection,
    ) -> Result<(), AppError> {
        let mut spinner = ProgressSpinner::new(format!("Testing connection '{}'...", draft.name));
        spinner.start();
        let outcome = catalog.test(draft).await;
        spinner.stop(None);

        let outcome = outcome?;
        if outcome.valid {
            display_status("Connection test passed", OperationStatus::Success);
            Ok(())
        } else {
            let reason = outcome
                .error
                .unwrap_or_else(|| "the server rejected the connection".to_string());
            Err(CatalogError::TestFailed { reason }.into())
        }
    }
}

pub struct ConfigHandler {
    config_path: Option<PathBuf>,
}

impl ConfigHandler {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    pub fn handle(
        &self,
        command: ConfigCommands,
        config: &mut Config,
        profile_name: &str,
    ) -> Result<(), AppError> {
        match command {
            ConfigCommands::Show => {
                println!("Current Configuration:");
                println!("=====================");
                let location = match &self.config_path {
                    Some(path) => path.display().to_string(),
                    None => Config::config_file_path()?.display().to_string(),
                };
                println!("Config file: {}", location);
                println!(
                    "Default Profile: {}",
                    config.default_profile.as_deref().unwrap_or("(not set)")
                );
                println!("Active Profile: {}", profile_name);

                let active = config.get_profile(profile_name).cloned().unwrap_or_default();
                println!();
                for (key, value) in active.entries() {
                    println!("  {:<20} {}", key, value);
                }

                let mut others: Vec<&String> = config
                    .profiles
                    .keys()
                    .filter(|name| name.as_str() != profile_name)
                    .collect();
                if !others.is_empty() {
                    others.sort();
                    let names: Vec<&str> = others.iter().map(|name| name.as_str()).collect();
                    println!("\nOther profiles: {}", names.join(", "));
                }
                Ok(())
            }
            ConfigCommands::Set { key, value } => {
                log::debug!("Setting {} on profile {}", key, profile_name);
                config.set_profile_field(profile_name, &key, &value)?;
                if config.default_profile.is_none() {
                    config.default_profile = Some(profile_name.to_string());
                }
                config.save(self.config_path.clone())?;

                display_status(
                    &format!("Set {} = {} on profile '{}'", key, value, profile_name),
                    OperationStatus::Success,
                );
                Ok(())
            }
        }
    }
}

/// One-shot question: submit, wait, print the answer and the result views
pub struct AskHandler {
    transcript_view: TranscriptView,
    spinner_enabled: bool,
}

impl AskHandler {
    pub fn new(use_colors: bool, spinner_enabled: bool) -> Self {
        Self {
            transcript_view: TranscriptView::new().with_colors(use_colors),
            spinner_enabled,
        }
    }

    pub async fn handle(
        &self,
        session: &mut ConversationSession,
        presenter: &mut ResultPresenter,
        question: &str,
        tabs: &[ResultTab],
    ) -> Result<String, AppError> {
        match session.submit_active(question) {
            SubmitOutcome::Dispatched => {}
            SubmitOutcome::Rejected(RejectReason::EmptyMessage) => {
                return Err(
                    CliError::InvalidArguments("question cannot be empty".to_string()).into(),
                );
            }
            SubmitOutcome::Rejected(RejectReason::NoConnection) => {
                return Err(CliError::NoConnection { available: Vec::new() }.into());
            }
            SubmitOutcome::Rejected(RejectReason::Busy) => {
                return Err(
                    CliError::InvalidArguments("a query is already running".to_string()).into(),
                );
            }
        }

        let mut spinner = ProgressSpinner::new("Thinking...").with_enabled(self.spinner_enabled);
        spinner.start();
        session.settle_next().await;
        spinner.stop(None);

        let reply = session.transcript().last().ok_or_else(|| CliError::QueryFailed {
            detail: "no answer received".to_string(),
        })?;
        if reply.is_error {
            let detail = reply
                .content
                .strip_prefix("Error: ")
                .unwrap_or(&reply.content)
                .to_string();
            return Err(CliError::QueryFailed { detail }.into());
        }

        let mut output = self.transcript_view.render_message(reply);
        presenter.sync(session.last_result());
        for tab in tabs {
            presenter.select(*tab);
            if let Some(view) = presenter.render()? {
                output.push_str("\n\n");
                output.push_str(&view);
            }
        }
        Ok(output)
    }
}
