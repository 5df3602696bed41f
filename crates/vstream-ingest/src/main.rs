//! Video ingest binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vstream_ingest::admission::check_video_upload;
use vstream_ingest::{IngestConfig, IngestPipeline};
use vstream_media::{check_tool, TokioProcessRunner};
use vstream_models::encoding::VIDEO_CONTENT_TYPE;
use vstream_models::{MediaAsset, VideoId};
use vstream_storage::{S3Client, S3Config};

#[derive(Parser)]
#[command(name = "vstream-ingest", version, about = "Stage, probe, remux and publish uploaded videos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest one local video file and print where it was published
    Ingest {
        /// Identifier of the video record
        #[arg(long)]
        video_id: String,

        /// Path to the uploaded payload
        #[arg(long)]
        file: PathBuf,

        /// Declared MIME type of the payload
        #[arg(long, default_value = VIDEO_CONTENT_TYPE)]
        content_type: String,
    },
    /// Verify the work directory, external tools and bucket access
    Selfcheck,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = IngestConfig::from_env();
    info!("Ingest config: {:?}", config);
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Command::Ingest {
            video_id,
            file,
            content_type,
        } => ingest(&config, VideoId::from_string(video_id), &file, content_type).await,
        Command::Selfcheck => selfcheck(&config).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vstream_ingest=info,vstream_media=info,vstream_storage=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn ingest(
    config: &IngestConfig,
    video_id: VideoId,
    file: &Path,
    content_type: String,
) -> anyhow::Result<()> {
    let size = tokio::fs::metadata(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?
        .len();
    let asset = MediaAsset::new(video_id, size, content_type);
    check_video_upload(&asset, config.max_video_bytes)?;

    let s3_config = S3Config::from_env()?;
    let urls = s3_config.playback_template();
    let store = S3Client::new(s3_config).await?;

    let pipeline = IngestPipeline::from_config(
        config,
        Arc::new(TokioProcessRunner::new()),
        Arc::new(store),
        urls,
    );

    if pipeline.stager().is_staged_path(&asset.video_id, file).await {
        anyhow::bail!(
            "{} is the staging path for {}; copy it elsewhere first",
            file.display(),
            asset.video_id
        );
    }

    let mut reader = tokio::fs::File::open(file)
        .await
        .with_context(|| format!("cannot open {}", file.display()))?;
    let outcome = pipeline.run(&asset, &mut reader).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

async fn selfcheck(config: &IngestConfig) -> anyhow::Result<()> {
    println!(
        "ingest-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );

    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("cannot create {}", config.work_dir.display()))?;

    for tool in [&config.ffprobe_bin, &config.ffmpeg_bin] {
        let path = check_tool(tool)?;
        println!("ingest-selfcheck: {} -> {}", tool, path.display());
    }

    let store = S3Client::from_env().await?;
    store
        .check_connectivity()
        .await
        .with_context(|| format!("bucket {} not reachable", store.bucket()))?;

    println!("ingest-selfcheck: ok");
    Ok(())
}
