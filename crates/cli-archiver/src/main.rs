use anyhow::{Context, Result, bail};
use archiver::{
    cleanup, config::ArchiverConfig, convert, markers, merge, progress::ProgressReporter,
    segments, verify::{self, LengthVerdict}, vod::VodRecord,
};
use clap::Parser;
use log::{debug, error, info, warn};
use std::path::PathBuf;

/// Twitch VOD archive finalizer: merges downloaded stream segments,
/// repackages them into an mp4 and verifies the result.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// VOD store directory containing vod.json and the downloaded parts
    directory: PathBuf,

    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Continue conversion through corrupt packets
    #[arg(long)]
    ignore_corruptions: bool,

    /// Keep merged.ts and the parts directory after a successful conversion
    #[arg(long)]
    keep_parts: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger - use RUST_LOG env var or default to info level
    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    let args = Args::parse();

    let mut cfg = ArchiverConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    if args.ignore_corruptions {
        cfg.ignore_corruptions = true;
    }

    let mut vod = VodRecord::load(&args.directory)
        .context("Failed to read VOD record")?
        .with_context(|| format!("No vod.json found in {}", args.directory.display()))?;

    info!(
        "Finalizing VOD {} ({} expected) in {}",
        vod.id,
        archiver::timefmt::to_hms(vod.duration),
        vod.store_directory.display()
    );

    if vod.live && !cfg.ignore_corruptions {
        // a VOD downloaded while live routinely contains corrupt packets
        info!("VOD was recorded while live, tolerating corrupt packets.");
        cfg.ignore_corruptions = true;
    }

    std::fs::create_dir_all(&cfg.config_dir)
        .with_context(|| format!("Failed to create config directory: {}", cfg.config_dir.display()))?;

    if markers::create_lock(&cfg.config_dir, vod.id).context("Failed to create lock file")? {
        bail!(
            "Lock file already exists for VOD {}, another instance may be archiving it. \
             Remove {} if that is not the case.",
            vod.id,
            markers::lock_path(&cfg.config_dir, vod.id).display()
        );
    }

    let outcome = finalize_vod(&cfg, &mut vod, args.keep_parts).await;

    if let Err(e) = markers::remove_lock(&cfg.config_dir, vod.id) {
        warn!("Failed to remove lock file for VOD {}: {:#}", vod.id, e);
    }

    match &outcome {
        Ok(()) => info!("✅ VOD {} archived to {}", vod.id, vod.converted_path().display()),
        Err(e) => error!("❌ Failed to archive VOD {}: {:#}", vod.id, e),
    }

    outcome
}

/// Run the pipeline for one VOD: merge the segment inventory, repackage the
/// merged stream, verify its length, then clean up the intermediates.
async fn finalize_vod(cfg: &ArchiverConfig, vod: &mut VodRecord, keep_parts: bool) -> Result<()> {
    let inventory = segments::scan_parts(&vod.parts_dir())?;
    info!(
        "Found {} segments, highest sequence number {}.",
        inventory.len(),
        inventory.highest
    );
    if !inventory.is_contiguous() {
        warn!(
            "{} segment(s) missing, falling back to the concat demuxer: {:?}",
            inventory.discontinuities.len(),
            inventory.discontinuities
        );
    }

    let mut progress = ProgressReporter::new();
    merge::merge_segments(cfg, vod, &inventory, &mut progress).await?;
    convert::convert_vod(cfg, vod, &mut progress).await?;

    match verify::verify_vod_length(cfg, vod).await? {
        LengthVerdict::Failed { delta } => bail!(
            "Converted VOD failed length verification, off by {}s. The file may be \
             incomplete; leaving parts in place for inspection.",
            delta
        ),
        LengthVerdict::Passed => info!("VOD passed length verification."),
    }

    // the recording is finished once it survives verification
    vod.live = false;
    vod.save().context("Failed to update VOD record")?;

    if keep_parts {
        debug!("Keeping parts directory as requested.");
    } else {
        cleanup::cleanup_vod_parts(vod).context("Failed to clean up VOD parts")?;
    }

    Ok(())
}
