//! CLI for ftm.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ftm_core::{config, Variant};
use std::path::PathBuf;

use commands::{run_config, run_resolve, run_serve, ResolveArgs};

/// Top-level CLI for ftm.
#[derive(Debug, Parser)]
#[command(name = "ftm")]
#[command(about = "ftm: resolve track URLs into metadata and downloadable media", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve one track URL and print its metadata and media location.
    Resolve {
        /// Track URL (https://open.spotify.com/track/<id>).
        url: String,

        /// Upstream contract to use: embedded-link, two-call-redirect or two-call-stream.
        #[arg(long)]
        variant: Option<Variant>,

        /// Print the result as JSON (same shape as the HTTP API).
        #[arg(long)]
        json: bool,

        /// Also download the media when the result is a link.
        #[arg(long)]
        save: bool,

        /// Directory for downloaded media (default: current directory).
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Serve the HTTP API (`GET /`, `GET|POST /ftmdl`).
    Serve {
        /// Listen address, e.g. 0.0.0.0:8080. Overrides PORT and the config file.
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Upstream contract to use for every request.
        #[arg(long)]
        variant: Option<Variant>,

        /// Fetch linked media upstream and stream the bytes instead of returning the link.
        #[arg(long)]
        proxy_media: bool,
    },

    /// Show the config file location and effective settings.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Resolve {
                url,
                variant,
                json,
                save,
                output_dir,
            } => {
                let output_dir = match output_dir {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                let args = ResolveArgs {
                    url,
                    variant,
                    json,
                    save,
                    output_dir,
                };
                run_resolve(cfg, args).await?
            }
            CliCommand::Serve {
                bind,
                variant,
                proxy_media,
            } => run_serve(cfg, bind, variant, proxy_media).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}
