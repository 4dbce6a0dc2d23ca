use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use log::{debug, error, info};
use crate::config::ArchiverConfig;
use crate::error::ArchiveError;
use crate::process::{CommandSpec, FfmpegEvent, FfmpegProcess};
use crate::progress::ProgressReporter;
use crate::segments::SegmentInventory;
use crate::vod::VodRecord;

/// Merge downloaded segments into a single transport stream at `merged.ts`.
///
/// A contiguous inventory is merged by plain byte concatenation, since
/// transport-stream segments are self-delimiting. When segments are missing
/// the concat demuxer re-stitches presentation timestamps across the gaps
/// instead; naive concatenation across a gap corrupts timestamp continuity
/// in the output container.
pub async fn merge_segments(
    cfg: &ArchiverConfig,
    vod: &VodRecord,
    inventory: &SegmentInventory,
    progress: &mut ProgressReporter,
) -> Result<(), ArchiveError> {
    info!("Merging VOD parts. This may take a while.");

    if inventory.is_contiguous() {
        concat_segments(vod, inventory, progress)
    } else {
        debug!(
            "Discontinuity found, merging with ffmpeg. Missing segments: {:?}",
            inventory.discontinuities
        );
        demuxer_concat(cfg, vod, inventory, progress).await
    }
}

/// Fast path: append each segment's raw bytes in sequence order.
fn concat_segments(
    vod: &VodRecord,
    inventory: &SegmentInventory,
    progress: &mut ProgressReporter,
) -> Result<(), ArchiveError> {
    let mut merged = BufWriter::new(File::create(vod.merged_path())?);
    let total = inventory.len() as u64;

    for (done, path) in inventory.paths().enumerate() {
        let mut segment = File::open(path)?;
        io::copy(&mut segment, &mut merged)?;
        progress.update(done as u64 + 1, total);
    }

    merged.flush()?;
    progress.finish(total, total);
    Ok(())
}

/// Fallback path: drive the concat demuxer over a generated manifest.
async fn demuxer_concat(
    cfg: &ArchiverConfig,
    vod: &VodRecord,
    inventory: &SegmentInventory,
    progress: &mut ProgressReporter,
) -> Result<(), ArchiveError> {
    let manifest = write_manifest(vod, inventory)?;

    let spec = CommandSpec::new(&cfg.ffmpeg_bin)
        .args(["-hide_banner", "-fflags", "+genpts"])
        .args(["-f", "concat", "-safe", "0", "-y"])
        .arg("-i")
        .arg(manifest.to_string_lossy())
        .args(["-c", "copy"])
        .arg(vod.merged_path().to_string_lossy());
    let command = spec.command_line();

    let mut process = FfmpegProcess::spawn(spec).await.map_err(|e| {
        error!("Failed to spawn VOD merger: {:#}", e);
        ArchiveError::Merge {
            command: command.clone(),
        }
    })?;

    loop {
        let event = process.next_event().await.map_err(|e| {
            error!("Lost the VOD merger process: {:#}", e);
            ArchiveError::Merge {
                command: command.clone(),
            }
        })?;

        match event {
            FfmpegEvent::Progress { seconds } => progress.update(seconds, vod.duration),
            // corruption handling belongs to the conversion stage
            FfmpegEvent::PacketCorrupt { .. } => {}
            FfmpegEvent::Exited { success: true } => {
                progress.finish(vod.duration, vod.duration);
                return Ok(());
            }
            FfmpegEvent::Exited { success: false } => {
                error!("VOD merger exited with error. Command: {}", command);
                return Err(ArchiveError::Merge { command });
            }
        }
    }
}

/// Write the concat-demuxer manifest, one `file '<path>'` line per segment
/// in ascending sequence order.
fn write_manifest(
    vod: &VodRecord,
    inventory: &SegmentInventory,
) -> Result<PathBuf, ArchiveError> {
    let path = vod.parts_dir().join("segments.txt");
    let mut manifest = BufWriter::new(File::create(&path)?);

    for segment in inventory.paths() {
        writeln!(manifest, "file '{}'", segment.display())?;
    }

    manifest.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segments::{scan_parts, segment_file_name};
    use chrono::Utc;
    use std::fs;
    use std::path::Path;

    fn vod_in(dir: &Path) -> VodRecord {
        VodRecord {
            id: 10,
            user_id: 20,
            created_at: Utc::now(),
            duration: 30,
            store_directory: dir.to_path_buf(),
            live: false,
        }
    }

    fn seed_segment(dir: &Path, seq: u64, bytes: &[u8]) {
        fs::write(dir.join(segment_file_name(seq)), bytes).unwrap();
    }

    #[tokio::test]
    async fn test_contiguous_merge_concatenates_bytes_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let vod = vod_in(dir.path());
        let parts = vod.parts_dir();
        fs::create_dir_all(&parts).unwrap();

        seed_segment(&parts, 0, b"alpha-");
        seed_segment(&parts, 1, b"beta-");
        seed_segment(&parts, 2, b"gamma");

        let inventory = scan_parts(&parts).unwrap();
        let cfg = ArchiverConfig::default();
        let mut progress = ProgressReporter::new();
        merge_segments(&cfg, &vod, &inventory, &mut progress)
            .await
            .unwrap();

        let merged = fs::read(vod.merged_path()).unwrap();
        assert_eq!(merged, b"alpha-beta-gamma");
    }

    #[test]
    fn test_manifest_lists_segments_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let vod = vod_in(dir.path());
        let parts = vod.parts_dir();
        fs::create_dir_all(&parts).unwrap();

        seed_segment(&parts, 0, b"a");
        seed_segment(&parts, 1, b"b");
        seed_segment(&parts, 4, b"c");

        let inventory = scan_parts(&parts).unwrap();
        let manifest = write_manifest(&vod, &inventory).unwrap();
        assert_eq!(manifest, parts.join("segments.txt"));

        let lines: Vec<String> = fs::read_to_string(&manifest)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("file '") && lines[0].contains("00000.ts"));
        assert!(lines[1].contains("00001.ts"));
        assert!(lines[2].contains("00004.ts"));
    }
}
