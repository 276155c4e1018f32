//! Relationship subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use sugar_rest::SugarClient;

use super::read_json;
use crate::output;

#[derive(Args, Debug)]
pub struct LinkCommand {
    #[command(subcommand)]
    pub command: LinkSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum LinkSubcommand {
    /// List the records linked to a record
    List(LinkArgs),

    /// Link two records
    Add(RelatedArgs),

    /// Remove the link between two records
    Remove(RelatedArgs),

    /// Update the fields stored on a link
    Update(RelatedArgs),
}

#[derive(Args, Debug)]
pub struct LinkArgs {
    /// Module name (e.g., Accounts)
    pub module: String,

    /// Record id
    pub id: String,

    /// Link name (e.g., contacts)
    pub link: String,
}

#[derive(Args, Debug)]
pub struct RelatedArgs {
    #[command(flatten)]
    pub link: LinkArgs,

    /// Id of the related record
    pub related: String,

    /// JSON file with relationship fields (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,
}

pub async fn handle(client: &SugarClient, cmd: LinkCommand) -> Result<()> {
    let value = match cmd.command {
        LinkSubcommand::List(args) => client
            .related(&args.module, &args.id, &args.link)
            .await
            .context("Failed to list related records")?,
        LinkSubcommand::Add(args) => {
            let fields = read_json(args.json.as_deref())?;
            let LinkArgs { module, id, link } = &args.link;
            client
                .relate(module, id, link, &args.related, &fields)
                .await
                .context("Failed to link records")?
        }
        LinkSubcommand::Remove(args) => {
            let LinkArgs { module, id, link } = &args.link;
            client
                .unrelate(module, id, link, &args.related)
                .await
                .context("Failed to unlink records")?
        }
        LinkSubcommand::Update(args) => {
            let fields = read_json(args.json.as_deref())?;
            let LinkArgs { module, id, link } = &args.link;
            client
                .update_relationship(module, id, link, &args.related, &fields)
                .await
                .context("Failed to update link")?
        }
    };

    output::json_pretty(&value)
}
