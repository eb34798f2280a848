//! modvault CLI: run the registry server or publish a module to one.

mod commands;

use std::net::IpAddr;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::serve::ServeOverrides;

#[derive(Parser)]
#[command(name = "modvault", version, about = "Self-hosted registry for private Go modules")]
struct Cli {
    /// Increase log verbosity (--verbose for debug, twice for trace)
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the registry HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "MODVAULT_PORT")]
        port: Option<u16>,
        /// Storage base path (must exist)
        #[arg(short, long, env = "STORAGE_LOCATION")]
        storage: Option<PathBuf>,
        /// Address to listen on
        #[arg(long)]
        bind: Option<IpAddr>,
        /// Largest accepted publish body in bytes
        #[arg(long)]
        max_upload_bytes: Option<usize>,
        /// Settings file with a [server] table
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Archive a module checkout and publish it to a registry
    Upload {
        /// Registry base URL (e.g., https://mods.example.com)
        #[arg(short, long)]
        registry: String,
        /// Version to publish (semver, leading 'v' optional)
        #[arg(short = 'v', long = "version")]
        module_version: String,
        /// Module directory containing go.mod
        #[arg(short, long)]
        module: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve {
            port,
            storage,
            bind,
            max_upload_bytes,
            config,
        } => {
            let overrides = ServeOverrides {
                storage,
                bind,
                port,
                max_upload_bytes,
            };
            let settings = commands::serve::resolve_settings(config.as_deref(), &overrides)?;
            commands::serve::run(&settings)
        }

        Commands::Upload {
            registry,
            module_version,
            module,
        } => commands::upload::run(&registry, &module_version, &module),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_flags() {
        let cli = Cli::try_parse_from([
            "modvault",
            "upload",
            "-r",
            "https://mods.example.com",
            "-v",
            "v1.2.3",
            "-m",
            "./lib",
        ])
        .unwrap();
        match cli.command {
            Commands::Upload {
                registry,
                module_version,
                module,
            } => {
                assert_eq!(registry, "https://mods.example.com");
                assert_eq!(module_version, "v1.2.3");
                assert_eq!(module, PathBuf::from("./lib"));
            }
            Commands::Serve { .. } => panic!("expected upload"),
        }
    }

    #[test]
    fn upload_requires_all_flags() {
        assert!(Cli::try_parse_from(["modvault", "upload", "-r", "http://r"]).is_err());
    }

    #[test]
    fn parses_serve_flags() {
        let cli = Cli::try_parse_from([
            "modvault",
            "--verbose",
            "serve",
            "--port",
            "8080",
            "--storage",
            "/srv/modules",
            "--bind",
            "127.0.0.1",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Serve {
                port,
                storage,
                bind,
                ..
            } => {
                assert_eq!(port, Some(8080));
                assert_eq!(storage, Some(PathBuf::from("/srv/modules")));
                assert_eq!(bind, Some("127.0.0.1".parse().unwrap()));
            }
            Commands::Upload { .. } => panic!("expected serve"),
        }
    }
}
