//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use sugar_rest::SugarClient;

use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Print the issued access and refresh tokens
    #[arg(long)]
    pub show_tokens: bool,
}

pub async fn run(client: &SugarClient, args: LoginArgs) -> Result<()> {
    let session = client.session();

    eprintln!("{}", "Logging in...".dimmed());

    session.authenticate(false).await.context("Failed to login")?;

    output::success("Logged in successfully");
    output::field("URL", session.base_url().await.as_str());
    output::field("User", &session.username().await);
    output::field("Platform", &session.platform().await);

    if args.show_tokens {
        if let Some(token) = session.token().await {
            output::field("Access token", token.as_str());
        }
        if let Some(token) = session.refresh_token().await {
            output::field("Refresh token", token.as_str());
        }
    }

    Ok(())
}
