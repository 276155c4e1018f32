//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};

use crate::commands::{file, link, login, meta, record};

/// SugarCRM CLI tool for REST API exploration.
#[derive(Parser, Debug)]
#[command(name = "sugar")]
#[command(author, version = env!("SUGAR_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Server and account to talk to.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// REST API base URL (e.g., https://crm.example.com/rest/v10)
    #[arg(long, env = "SUGAR_URL", global = true)]
    pub url: Option<String>,

    /// Account username
    #[arg(long, env = "SUGAR_USERNAME", global = true)]
    pub username: Option<String>,

    /// Account password
    #[arg(long, env = "SUGAR_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// OAuth2 platform name
    #[arg(long, env = "SUGAR_PLATFORM", default_value = "api", global = true)]
    pub platform: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the credentials by logging in
    Login(login::LoginArgs),

    /// Record operations
    Record(record::RecordCommand),

    /// Relationship operations
    Link(link::LinkCommand),

    /// File field operations
    File(file::FileCommand),

    /// Fetch the server metadata
    Metadata(meta::MetadataArgs),

    /// Fetch language strings
    Lang(meta::LangArgs),

    /// Call an arbitrary endpoint
    Call(meta::CallArgs),
}
