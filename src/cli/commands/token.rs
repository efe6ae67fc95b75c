use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::auth::token::DEFAULT_TTL_SECONDS;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    /// Base64 HMAC key; `None` means a random key is generated at startup.
    pub secret: Option<SecretString>,
    pub ttl_seconds: u64,
}

impl Options {
    /// Parse token arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the TTL is zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let ttl_seconds = matches
            .get_one::<u64>(ARG_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_TTL_SECONDS);
        if ttl_seconds == 0 {
            anyhow::bail!("--{ARG_TOKEN_TTL_SECONDS} must be greater than zero");
        }

        let secret = matches
            .get_one::<String>(ARG_TOKEN_SECRET)
            .filter(|v| !v.trim().is_empty())
            .map(|v| SecretString::from(v.clone()));

        Ok(Self {
            secret,
            ttl_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("Base64 HMAC key for signing tokens (at least 32 bytes decoded)")
                .long_help(
                    "Base64 HMAC key for signing tokens (at least 32 bytes decoded).\n\nWhen unset a random key is generated at startup and every issued token becomes invalid on restart.",
                )
                .env("USERGATE_TOKEN_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Token lifetime in seconds")
                .default_value("3600")
                .env("USERGATE_TOKEN_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64)),
        )
}
