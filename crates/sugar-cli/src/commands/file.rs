//! File field subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;

use sugar_rest::SugarClient;

use crate::output;

#[derive(Args, Debug)]
pub struct FileCommand {
    #[command(subcommand)]
    pub command: FileSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum FileSubcommand {
    /// List the file fields of a record
    List {
        /// Module name (e.g., Notes)
        module: String,

        /// Record id
        id: String,
    },

    /// Upload a local file into a file field
    Upload(UploadArgs),

    /// Download the content of a file field
    Download(DownloadArgs),

    /// Remove the file stored in a file field
    Delete(FieldArgs),
}

#[derive(Args, Debug)]
pub struct FieldArgs {
    /// Module name (e.g., Notes)
    pub module: String,

    /// Record id
    pub id: String,

    /// File field name (e.g., filename)
    pub field: String,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    #[command(flatten)]
    pub field: FieldArgs,

    /// Local file to upload
    pub path: PathBuf,

    /// File name reported to the server (defaults to the local name)
    #[arg(long)]
    pub filename: Option<String>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub field: FieldArgs,

    /// Where to write the content
    pub output: PathBuf,
}

pub async fn handle(client: &SugarClient, cmd: FileCommand) -> Result<()> {
    match cmd.command {
        FileSubcommand::List { module, id } => {
            let files = client
                .files(&module, &id)
                .await
                .context("Failed to list files")?;
            output::json_pretty(&files)
        }
        FileSubcommand::Upload(args) => {
            let FieldArgs { module, id, field } = &args.field;
            let params = match &args.filename {
                Some(name) => json!({ "filename": name }),
                None => json!({}),
            };

            let result = client
                .upload(module, id, field, &args.path, &params)
                .await
                .with_context(|| format!("Failed to upload {}", args.path.display()))?;

            output::json_pretty(&result)?;
            output::success(&format!("Uploaded {}", args.path.display()));
            Ok(())
        }
        FileSubcommand::Download(args) => {
            let FieldArgs { module, id, field } = &args.field;

            let written = client
                .download(module, id, field, &args.output)
                .await
                .context("Failed to download file")?;

            output::success(&format!(
                "Wrote {} bytes to {}",
                written,
                args.output.display()
            ));
            Ok(())
        }
        FileSubcommand::Delete(args) => {
            let result = client
                .delete_file(&args.module, &args.id, &args.field)
                .await
                .context("Failed to delete file")?;
            output::json_pretty(&result)
        }
    }
}
