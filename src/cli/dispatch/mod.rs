//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, database, hash, token};
use anyhow::{Context, Result, bail};
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(database::ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    validate_dsn(&dsn)?;

    let token_opts = token::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        db_max_connections: database::max_connections(matches),
        token_secret: token_opts.secret,
        token_ttl_seconds: token_opts.ttl_seconds,
        hash_cost: hash::parse(matches),
    }))
}

fn validate_dsn(dsn: &str) -> Result<()> {
    let parsed = Url::parse(dsn).context("invalid --dsn: not a URL")?;
    match parsed.scheme() {
        "postgres" | "postgresql" => Ok(()),
        other => bail!("invalid --dsn: unsupported scheme '{other}'"),
    }
}
