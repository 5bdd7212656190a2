use anyhow::Result;
use clap::{Parser, Subcommand};
use hydrofetch::acquire::{self, AcquireOptions};
use hydrofetch::basin::{self, BasinOptions};
use hydrofetch::config::Settings;
use hydrofetch::selection::{self, RequestSelection};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Earth-observation extraction and USGS basin maps")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit an AppEEARS area request for an AOI and download the results
    Appeears {
        /// GeoJSON area of interest
        aoi: PathBuf,
        /// Request selection TOML; the built-in MODIS selection when omitted
        #[arg(long)]
        selection: Option<PathBuf>,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Seconds between status checks
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
        poll_interval: u64,
    },
    /// Fetch a gauge site's upstream basin and render a two-panel map
    Basin {
        #[arg(default_value = "07340300")]
        site: String,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// 48 (contiguous US) or 50
        #[arg(long, default_value_t = 48)]
        states: u32,
        #[arg(long, default_value_t = 2000)]
        width: u32,
        #[arg(long, default_value_t = 1000)]
        height: u32,
    },
    /// Write the built-in request selection to a TOML file
    Template { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hydrofetch=info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Command::Appeears {
            aoi,
            selection,
            output_dir,
            poll_interval,
        } => {
            let options = AcquireOptions {
                aoi_path: aoi,
                selection_path: selection,
                output_dir,
                poll_interval: Duration::from_secs(poll_interval),
            };
            acquire::run(&settings, &options).await?;
        }
        Command::Basin {
            site,
            output_dir,
            states,
            width,
            height,
        } => {
            let options = BasinOptions {
                site,
                output_dir,
                states,
                width,
                height,
            };
            basin::run(&settings, &options).await?;
        }
        Command::Template { path } => {
            RequestSelection::from_template(&selection::template())?.write(&path)?;
            tracing::info!(file = %path.display(), "Wrote request selection");
        }
    }

    Ok(())
}
