//! Record subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};

use sugar_rest::SugarClient;

use super::{parse_param, read_json};
use crate::output;

#[derive(Args, Debug)]
pub struct RecordCommand {
    #[command(subcommand)]
    pub command: RecordSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RecordSubcommand {
    /// Create a new record in a module
    Create(CreateArgs),

    /// Fetch a single record
    Get(RecordArgs),

    /// Update fields of a record
    Update(UpdateArgs),

    /// Delete a record
    Delete(RecordArgs),

    /// List records in a module
    Search(SearchArgs),

    /// Mark a record as a favorite
    Favorite(RecordArgs),

    /// Remove a record from the favorites
    Unfavorite(RecordArgs),
}

#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Module name (e.g., Accounts)
    pub module: String,

    /// Record id
    pub id: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Module name (e.g., Accounts)
    pub module: String,

    /// JSON file with the record fields (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub record: RecordArgs,

    /// JSON file with the fields to change (use - for stdin)
    #[arg(long)]
    pub json: String,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Module name (e.g., Accounts)
    pub module: String,

    /// Search term
    #[arg(long, short)]
    pub query: Option<String>,

    /// Maximum number of records to return
    #[arg(long)]
    pub max_num: Option<u32>,

    /// Offset of the first record
    #[arg(long)]
    pub offset: Option<u32>,

    /// Extra query parameter (repeatable)
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn handle(client: &SugarClient, cmd: RecordCommand) -> Result<()> {
    match cmd.command {
        RecordSubcommand::Create(args) => create(client, args).await,
        RecordSubcommand::Get(args) => get(client, args).await,
        RecordSubcommand::Update(args) => update(client, args).await,
        RecordSubcommand::Delete(args) => delete(client, args).await,
        RecordSubcommand::Search(args) => search(client, args).await,
        RecordSubcommand::Favorite(args) => {
            let record = client
                .favorite(&args.module, &args.id)
                .await
                .context("Failed to favorite record")?;
            output::json_pretty(&record)
        }
        RecordSubcommand::Unfavorite(args) => {
            let record = client
                .unfavorite(&args.module, &args.id)
                .await
                .context("Failed to unfavorite record")?;
            output::json_pretty(&record)
        }
    }
}

async fn create(client: &SugarClient, args: CreateArgs) -> Result<()> {
    let fields = read_json(args.json.as_deref())?;

    let record = client
        .create(&args.module, &fields)
        .await
        .context("Failed to create record")?;

    output::json_pretty(&record)?;
    if let Some(id) = record["id"].as_str() {
        output::success(&format!("Created record: {}", id));
    }

    Ok(())
}

async fn get(client: &SugarClient, args: RecordArgs) -> Result<()> {
    let record = client
        .retrieve(&args.module, &args.id)
        .await
        .context("Failed to get record")?;

    output::json_pretty(&record)
}

async fn update(client: &SugarClient, args: UpdateArgs) -> Result<()> {
    let fields = read_json(Some(&args.json))?;

    let record = client
        .update(&args.record.module, &args.record.id, &fields)
        .await
        .context("Failed to update record")?;

    output::json_pretty(&record)
}

async fn delete(client: &SugarClient, args: RecordArgs) -> Result<()> {
    client
        .delete(&args.module, &args.id)
        .await
        .context("Failed to delete record")?;

    output::success(&format!("Deleted record: {}/{}", args.module, args.id));
    Ok(())
}

async fn search(client: &SugarClient, args: SearchArgs) -> Result<()> {
    let mut params = Map::new();
    if let Some(q) = args.query {
        params.insert("q".to_string(), Value::from(q));
    }
    if let Some(max_num) = args.max_num {
        params.insert("max_num".to_string(), Value::from(max_num));
    }
    if let Some(offset) = args.offset {
        params.insert("offset".to_string(), Value::from(offset));
    }
    for (key, value) in args.params {
        params.insert(key, Value::from(value));
    }

    let result = client
        .search(&args.module, &params)
        .await
        .context("Failed to search records")?;

    let records = result["records"].as_array().map(Vec::as_slice).unwrap_or_default();
    if records.is_empty() {
        eprintln!("{}", "No records found.".dimmed());
        return Ok(());
    }

    for record in records {
        if args.pretty {
            output::json_pretty(record)?;
        } else {
            output::json(record)?;
        }
    }

    // The server reports -1 when there are no more pages.
    if let Some(next) = result["next_offset"].as_i64().filter(|n| *n >= 0) {
        eprintln!();
        eprintln!("{}: {}", "Next offset".dimmed(), next);
    }

    Ok(())
}
