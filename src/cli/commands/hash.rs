use clap::{Arg, ArgMatches, Command};

use crate::auth::{
    HashCost,
    password::{DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM},
};

pub const ARG_HASH_MEMORY_KIB: &str = "hash-memory-kib";
pub const ARG_HASH_ITERATIONS: &str = "hash-iterations";
pub const ARG_HASH_PARALLELISM: &str = "hash-parallelism";

/// Parse Argon2id cost arguments from matches.
#[must_use]
pub fn parse(matches: &ArgMatches) -> HashCost {
    let get = |id: &str, default: u32| matches.get_one::<u32>(id).copied().unwrap_or(default);

    HashCost {
        memory_kib: get(ARG_HASH_MEMORY_KIB, DEFAULT_MEMORY_KIB),
        iterations: get(ARG_HASH_ITERATIONS, DEFAULT_ITERATIONS),
        parallelism: get(ARG_HASH_PARALLELISM, DEFAULT_PARALLELISM),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_HASH_MEMORY_KIB)
                .long(ARG_HASH_MEMORY_KIB)
                .help("Argon2id memory cost in KiB")
                .default_value("19456")
                .env("USERGATE_HASH_MEMORY_KIB")
                .value_parser(clap::value_parser!(u32).range(8..)),
        )
        .arg(
            Arg::new(ARG_HASH_ITERATIONS)
                .long(ARG_HASH_ITERATIONS)
                .help("Argon2id iterations")
                .default_value("2")
                .env("USERGATE_HASH_ITERATIONS")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_HASH_PARALLELISM)
                .long(ARG_HASH_PARALLELISM)
                .help("Argon2id lanes")
                .default_value("1")
                .env("USERGATE_HASH_PARALLELISM")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}
