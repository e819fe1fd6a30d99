use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod seed;

#[derive(Parser)]
#[command(name = "bluebridge-server")]
#[command(about = "BlueBridge water-well tracking server")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run database migrations
    Migrate,
    /// Print the OpenAPI document (optionally to a file)
    Openapi(OpenApiArgs),
    /// Insert demo users and wells
    Seed,
}

#[derive(Args)]
struct OpenApiArgs {
    #[arg(long, short)]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Server,
    Migrate,
    OpenApi { out: Option<PathBuf> },
    Seed,
}

impl From<Cli> for RunMode {
    fn from(cli: Cli) -> Self {
        match cli.command {
            None => Self::Server,
            Some(Command::Migrate) => Self::Migrate,
            Some(Command::Openapi(args)) => Self::OpenApi { out: args.out },
            Some(Command::Seed) => Self::Seed,
        }
    }
}

pub fn parse_args() -> RunMode {
    RunMode::from(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(args: &[&str]) -> RunMode {
        RunMode::from(Cli::parse_from(args))
    }

    #[test]
    fn parse_default_command_is_server() {
        assert_eq!(mode(&["bluebridge-server"]), RunMode::Server);
    }

    #[test]
    fn parse_openapi_with_out_path() {
        assert_eq!(
            mode(&["bluebridge-server", "openapi", "-o", "spec.json"]),
            RunMode::OpenApi {
                out: Some(PathBuf::from("spec.json"))
            }
        );
        assert_eq!(
            mode(&["bluebridge-server", "openapi"]),
            RunMode::OpenApi { out: None }
        );
    }

    #[test]
    fn parse_migrate_and_seed() {
        assert_eq!(mode(&["bluebridge-server", "migrate"]), RunMode::Migrate);
        assert_eq!(mode(&["bluebridge-server", "seed"]), RunMode::Seed);
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["bluebridge-server", "token", "create"]).is_err());
    }
}
