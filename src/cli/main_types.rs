use crate::display::ResultTab;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "askdb")]
#[command(about = "Ask questions about your database in plain English")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Query engine base URL, overriding the profile
    #[arg(long, global = true, env = "ASKDB_SERVER_URL")]
    pub server_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive conversation
    Chat {
        /// Connection id to query (defaults to the profile's default_connection)
        #[arg(short, long)]
        connection: Option<String>,
    },
    /// Ask a single question and print the result
    Ask {
        /// The question, in plain English
        question: String,
        /// Connection id to query (defaults to the profile's default_connection)
        #[arg(short, long)]
        connection: Option<String>,
        /// Result view to print: table, charts or summary
        #[arg(short, long, default_value = "table")]
        tab: ResultTab,
        /// Print every result view
        #[arg(long, conflicts_with = "tab")]
        all: bool,
    },
    /// Manage database connections on the server
    Connections {
        #[command(subcommand)]
        command: ConnectionCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConnectionCommands {
    /// List registered connections
    List,
    /// Test a connection and register it if the test passes
    Add(ConnectionArgs),
    /// Remove a registered connection
    Remove {
        /// Connection id
        id: String,
    },
    /// Check that the server can reach a database with these settings
    Test(ConnectionArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Display name
    #[arg(long)]
    pub name: String,
    /// Database type: postgresql, mysql or sqlite
    #[arg(long, default_value = "postgresql")]
    pub db_type: String,
    #[arg(long, default_value = "localhost")]
    pub host: String,
    /// Defaults to the standard port for the database type
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(short, long, default_value = "")]
    pub username: String,
    /// Prompted for when omitted
    #[arg(long, env = "ASKDB_DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Database name (file path for sqlite)
    #[arg(short, long)]
    pub database: String,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a value on the active profile
    Set {
        /// One of server_url, timeout_seconds, default_connection, use_colors
        key: String,
        value: String,
    },
}
