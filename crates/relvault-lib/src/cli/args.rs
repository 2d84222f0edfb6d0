use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

#[derive(Debug, Clone)]
pub enum Command {
    Run {
        config_path: String,
        download_dir: Option<String>,
        max_attempts: Option<usize>,
    },
    Check {
        config_path: String,
    },
    Status {
        config_path: String,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "relvault",
    version,
    about = "Monitor GitHub repositories and back up new release artifacts to local storage"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Check all configured repositories and download new release artifacts
    Run {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "relvault.yaml"
        )]
        config: String,

        #[arg(
            short = 'd',
            long = "download-dir",
            value_name = "DIR",
            help = "Overrides the download directory"
        )]
        download_dir: Option<String>,

        #[arg(
            long = "max-attempts",
            value_name = "N",
            help = "Overrides the maximum download attempts per artifact"
        )]
        max_attempts: Option<usize>,
    },

    /// Query latest releases and report what would be downloaded
    Check {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "relvault.yaml"
        )]
        config: String,
    },

    /// Print the last backed-up release per repository
    Status {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "relvault.yaml"
        )]
        config: String,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy()
                .add_directive("hyper_util=warn".parse().unwrap()),
        )
        .init();

    let command = match cli.command {
        CliCommand::Run {
            config,
            download_dir,
            max_attempts,
        } => Command::Run {
            config_path: config,
            download_dir,
            max_attempts,
        },
        CliCommand::Check { config } => Command::Check {
            config_path: config,
        },
        CliCommand::Status { config } => Command::Status {
            config_path: config,
        },
    };

    Args { command, log_level }
}
