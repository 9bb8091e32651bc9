use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use url_downloader::{BatchOptions, DownloadConfig, DownloadRequest, Downloader};

#[derive(Parser, Debug)]
#[command(name = "url-downloader")]
#[command(about = "Download files from HTTP(S) URLs into allowed directories")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download a single URL
    Get {
        url: String,

        /// Save under this name instead of the one derived from the URL
        #[arg(long)]
        filename: Option<String>,

        #[command(flatten)]
        limits: Limits,
    },
    /// Download several URLs concurrently
    Batch {
        #[arg(required = true, num_args = 1..)]
        urls: Vec<String>,

        #[command(flatten)]
        limits: Limits,
    },
}

#[derive(Args, Debug)]
struct Limits {
    /// Directory to save into; must be inside an allowed root
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Per-download timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Per-download size limit in megabytes
    #[arg(long, default_value_t = 500)]
    max_size_mb: u64,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("url_downloader=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = DownloadConfig::from_env().context("invalid downloader configuration")?;
    debug!(roots = ?config.allowed_roots.roots(), "Configuration loaded");
    let downloader = Downloader::new(config).context("failed to create downloader")?;

    match cli.command {
        Commands::Get { url, filename, limits } => {
            let mut request = DownloadRequest::new(url)
                .with_timeout(Duration::from_secs(limits.timeout))
                .with_max_size_mb(limits.max_size_mb);
            if let Some(dir) = limits.output_dir {
                request = request.with_output_dir(dir);
            }
            if let Some(name) = filename {
                request = request.with_filename(name);
            }

            let result = downloader.download(request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(result.success)
        }
        Commands::Batch { urls, limits } => {
            let mut options = BatchOptions::default()
                .with_timeout(Duration::from_secs(limits.timeout))
                .with_max_size_mb(limits.max_size_mb);
            if let Some(dir) = limits.output_dir {
                options = options.with_output_dir(dir);
            }

            let batch = downloader
                .download_all(urls, options)
                .await
                .map_err(|e| anyhow::anyhow!(url_downloader::downloader::sanitize_error(&e)))?;
            println!("{}", serde_json::to_string_pretty(&batch)?);
            Ok(batch.failed_count == 0)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!(error = format!("{:#}", err), "command failed");
            std::process::exit(2);
        }
    }
}
