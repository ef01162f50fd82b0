// FILE: crates/cli/src/main.rs

use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use contentguard_config::ConfigManager;
use std::path::PathBuf;

mod commands;

fn build_cli() -> Command {
    Command::new("contentguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rate limiting, circuit breaking, retries and caching in front of a content API")
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml (defaults to the user config directory)")
                .global(true),
        )
        .subcommand(Command::new("init").about("Write a default config file if none exists"))
        .subcommand(Command::new("validate").about("Check the config file for invalid values"))
        .subcommand(Command::new("show").about("Print the effective config, env overrides applied"))
        .subcommand(
            Command::new("fetch")
                .about("Fetch a path through the resilient client")
                .arg(Arg::new("path").required(true).value_name("PATH").help("Request path, e.g. /posts"))
                .arg(
                    Arg::new("repeat")
                        .short('n')
                        .long("repeat")
                        .value_name("N")
                        .help("Number of times to fetch the path")
                        .value_parser(clap::value_parser!(u32).range(1..))
                        .default_value("1"),
                )
                .arg(
                    Arg::new("ttl-ms")
                        .long("ttl-ms")
                        .value_name("MS")
                        .help("Cache TTL for the response in milliseconds")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .help("Do not print the response body")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("warm").about("Fetch the configured warm paths into the cache"))
}

fn config_manager(matches: &clap::ArgMatches) -> Result<ConfigManager> {
    match matches.get_one::<String>("config-dir") {
        Some(dir) => Ok(ConfigManager::with_directory(PathBuf::from(dir))),
        None => Ok(ConfigManager::new()?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = build_cli().get_matches();
    let manager = config_manager(&matches)?;

    match matches.subcommand() {
        Some(("init", _)) => commands::init_config(&manager),
        Some(("validate", _)) => commands::validate_config(&manager),
        Some(("show", _)) => commands::show_config(&manager),
        Some(("fetch", sub_matches)) => commands::fetch(&manager, sub_matches).await,
        Some(("warm", _)) => commands::warm(&manager).await,
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_fetch_arguments() {
        let matches = build_cli()
            .try_get_matches_from(["contentguard", "fetch", "/posts", "--repeat", "3", "--ttl-ms", "500"])
            .expect("Should parse");
        let (_, fetch) = matches.subcommand().expect("Subcommand");

        assert_eq!(fetch.get_one::<String>("path").map(String::as_str), Some("/posts"));
        assert_eq!(fetch.get_one::<u32>("repeat"), Some(&3));
        assert_eq!(fetch.get_one::<u64>("ttl-ms"), Some(&500));
    }

    #[test]
    fn test_zero_repeat_rejected() {
        let result = build_cli().try_get_matches_from(["contentguard", "fetch", "/posts", "-n", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_config_dir() {
        let matches = build_cli()
            .try_get_matches_from(["contentguard", "validate", "--config-dir", "/tmp/cg"])
            .expect("Should parse");
        assert_eq!(
            matches.get_one::<String>("config-dir").map(String::as_str),
            Some("/tmp/cg")
        );
    }
}
