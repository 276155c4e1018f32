//! Subcommand implementations.

pub mod file;
pub mod link;
pub mod login;
pub mod meta;
pub mod record;

use std::io::{self, Read};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::debug;

use sugar_rest::{BaseUrl, SugarClient};

use crate::cli::{Commands, ConnectionArgs};

pub async fn handle(cmd: Commands, connection: &ConnectionArgs) -> Result<()> {
    let client = connect(connection).await?;

    match cmd {
        Commands::Login(args) => login::run(&client, args).await,
        Commands::Record(cmd) => record::handle(&client, cmd).await,
        Commands::Link(cmd) => link::handle(&client, cmd).await,
        Commands::File(cmd) => file::handle(&client, cmd).await,
        Commands::Metadata(args) => meta::metadata(&client, args).await,
        Commands::Lang(args) => meta::lang(&client, args).await,
        Commands::Call(args) => meta::call(&client, args).await,
    }
}

/// Build a client from the connection flags. The login itself happens on
/// the first request.
async fn connect(args: &ConnectionArgs) -> Result<SugarClient> {
    let url = args
        .url
        .as_deref()
        .context("No server URL. Pass --url or set SUGAR_URL.")?;
    let username = args
        .username
        .as_deref()
        .context("No username. Pass --username or set SUGAR_USERNAME.")?;
    let password = args
        .password
        .as_deref()
        .context("No password. Pass --password or set SUGAR_PASSWORD.")?;

    let base_url = BaseUrl::new(url).context("Invalid server URL")?;
    let client = SugarClient::new(base_url.clone()).context("Failed to create HTTP client")?;

    let session = client.session();
    session.set_credentials(username, password).await;
    if !session.set_platform(args.platform.as_str()).await {
        bail!("Platform must not be empty");
    }

    debug!(
        host = base_url.host().unwrap_or_default(),
        %username,
        platform = %args.platform,
        "Client configured"
    );
    Ok(client)
}

/// Read a JSON document from a file, or from stdin when `path` is `-`.
/// Without a path the document is an empty object.
pub fn read_json(path: Option<&str>) -> Result<Value> {
    match path {
        None => Ok(Value::Object(serde_json::Map::new())),
        Some("-") => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            serde_json::from_str(&buf).context("Invalid JSON from stdin")
        }
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read JSON file {}", path))?;
            serde_json::from_str(&content).context("Invalid JSON in file")
        }
    }
}

/// Parse a `KEY=VALUE` pair.
pub fn parse_param(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
