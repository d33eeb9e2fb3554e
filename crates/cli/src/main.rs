mod dev;
mod logging;
mod preview;
mod server_utils;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::Path;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into the output directory
    Build {
        /// Base URL used for canonical links, e.g. https://example.com
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Serve the site with live reload while editing content
    Dev {
        /// Expose the server to the local network
        #[arg(long)]
        host: bool,
    },
    /// Serve a previously built site
    Preview {
        /// Expose the server to the local network
        #[arg(long)]
        host: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { base_url } => {
            // The build path logs through the library's env_logger setup, so
            // the tracing formatter stays out of the way here.
            carnet::logging::init_logging();

            let options = carnet::BuildOptions {
                base_url,
                ..Default::default()
            };

            if let Err(err) = carnet::build(&options) {
                eprintln!("{} {}", "Build failed:".red().bold(), err);
                std::process::exit(1);
            }
        }
        Commands::Dev { host } => {
            logging::init_logging();

            if let Err(err) = dev::start_dev_env(".", host).await {
                eprintln!("{} {}", "Dev server failed:".red().bold(), err);
                std::process::exit(1);
            }
        }
        Commands::Preview { host } => {
            logging::init_logging();

            let dist_path = Path::new("dist");
            if !dist_path.exists() {
                eprintln!("The dist directory does not exist. Run `carnet build` first.");
                std::process::exit(1);
            }

            preview::start_preview_server(dist_path.to_path_buf(), host).await;
        }
    }
}
