//! Metadata, language and raw call commands.

use anyhow::{Context, Result};
use clap::Args;

use sugar_rest::endpoints::DEFAULT_LANGUAGE;
use sugar_rest::{Method, SugarClient};

use super::read_json;
use crate::output;

#[derive(Args, Debug)]
pub struct MetadataArgs {
    /// Print only this top-level section (e.g., modules)
    #[arg(long)]
    pub section: Option<String>,
}

#[derive(Args, Debug)]
pub struct LangArgs {
    /// Language code
    #[arg(default_value = DEFAULT_LANGUAGE)]
    pub language: String,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// HTTP verb (get, post, put or delete)
    pub method: Method,

    /// Endpoint path below the base URL (e.g., Accounts/filter)
    pub path: String,

    /// JSON file with request data (use - for stdin). Sent as query
    /// parameters for GET and as the body otherwise.
    #[arg(long)]
    pub json: Option<String>,
}

pub async fn metadata(client: &SugarClient, args: MetadataArgs) -> Result<()> {
    let metadata = client
        .metadata()
        .await
        .context("Failed to fetch metadata")?;

    match args.section {
        Some(section) => {
            let value = metadata
                .get(&section)
                .with_context(|| format!("No metadata section '{}'", section))?;
            output::json_pretty(value)
        }
        None => output::json_pretty(&metadata),
    }
}

pub async fn lang(client: &SugarClient, args: LangArgs) -> Result<()> {
    let strings = client
        .lang(&args.language)
        .await
        .with_context(|| format!("Failed to fetch language '{}'", args.language))?;

    output::json_pretty(&strings)
}

pub async fn call(client: &SugarClient, args: CallArgs) -> Result<()> {
    let data = read_json(args.json.as_deref())?;

    let result = client
        .call(&args.path, args.method, &data)
        .await
        .with_context(|| format!("{} {} failed", args.method, args.path))?;

    output::json_pretty(&result)
}
