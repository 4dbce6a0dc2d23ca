use log::{debug, error, info};
use crate::config::ArchiverConfig;
use crate::error::ArchiveError;
use crate::process::{CommandSpec, FfmpegEvent, FfmpegProcess};
use crate::progress::ProgressReporter;
use crate::vod::VodRecord;

/// Nominal duration of one transport-stream segment in seconds.
pub const SEGMENT_SECONDS: u64 = 10;

/// Bounded range of segment files to re-acquire after a corrupt packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryRange {
    /// Segment containing the corrupt packet.
    pub corrupt: u64,
    /// First segment to delete and re-download.
    pub lowest: u64,
    /// Last segment to delete and re-download.
    pub highest: u64,
}

impl RecoveryRange {
    /// Locate the corrupt segment from its timestamp and span ten segments
    /// either side, clamped to the VOD's segment range.
    ///
    /// The upper bound keeps the historical branch condition, comparing the
    /// corrupt segment against `duration / 10 - 10` rather than clamping
    /// symmetrically.
    pub fn compute(corrupt_seconds: u64, duration: u64) -> Self {
        let corrupt = corrupt_seconds / SEGMENT_SECONDS;
        let last = duration / SEGMENT_SECONDS;

        let lowest = corrupt.saturating_sub(10);
        let highest = if (corrupt as i64) <= (last as i64) - 10 {
            corrupt + 10
        } else {
            last
        };

        RecoveryRange {
            corrupt,
            lowest,
            highest,
        }
    }
}

/// Lifecycle of one conversion run, driven by the subprocess event stream:
/// `Running` until the first event, then `Progressing` on time markers or
/// `Faulted` once a corrupt packet forces a kill, and `Terminated` when the
/// process exits cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConvertPhase {
    Running,
    Progressing,
    Faulted(RecoveryRange),
    Terminated,
}

/// Convert the merged transport stream into the final mp4 container.
///
/// Audio and video streams are copied rather than re-encoded; this is
/// container repackaging, not quality transformation. Corrupt packets abort
/// the conversion unless tolerance is configured, and the resulting error
/// names the segment range that must be re-downloaded.
pub async fn convert_vod(
    cfg: &ArchiverConfig,
    vod: &VodRecord,
    progress: &mut ProgressReporter,
) -> Result<(), ArchiveError> {
    info!("Converting VOD to mp4. This may take a while.");

    let spec = CommandSpec::new(&cfg.ffmpeg_bin)
        .args(["-hide_banner", "-y"])
        .arg("-i")
        .arg(vod.merged_path().to_string_lossy())
        .args(["-c:a", "copy", "-c:v", "copy"])
        .arg(vod.converted_path().to_string_lossy());
    let command = spec.command_line();

    let mut process = FfmpegProcess::spawn(spec).await.map_err(|e| {
        error!("Failed to spawn VOD converter: {:#}", e);
        ArchiveError::Convert {
            command: command.clone(),
        }
    })?;

    let mut phase = ConvertPhase::Running;
    let exited_cleanly = loop {
        let event = process.next_event().await.map_err(|e| {
            error!("Lost the VOD converter process: {:#}", e);
            ArchiveError::Convert {
                command: command.clone(),
            }
        })?;

        match event {
            FfmpegEvent::Progress { seconds } => {
                if !matches!(phase, ConvertPhase::Faulted(_)) {
                    phase = ConvertPhase::Progressing;
                    progress.update(seconds, vod.duration);
                }
            }
            FfmpegEvent::PacketCorrupt { seconds } => {
                if cfg.ignore_corruptions {
                    debug!("Ignoring corrupt packet at {}s.", seconds);
                    continue;
                }
                if matches!(phase, ConvertPhase::Faulted(_)) {
                    continue;
                }

                error!("Corrupt packet encountered. Timestamp: {}", seconds);
                if let Err(e) = process.kill().await {
                    error!("Failed to kill faulted converter: {:#}", e);
                }
                phase = ConvertPhase::Faulted(RecoveryRange::compute(seconds, vod.duration));
            }
            FfmpegEvent::Exited { success } => {
                if !matches!(phase, ConvertPhase::Faulted(_)) {
                    phase = ConvertPhase::Terminated;
                }
                break success;
            }
        }
    };

    match phase {
        ConvertPhase::Faulted(range) => Err(ArchiveError::Corruption { range }),
        ConvertPhase::Terminated if exited_cleanly => {
            progress.finish(vod.duration, vod.duration);
            Ok(())
        }
        _ => {
            error!("VOD converter exited with error. Command: {}", command);
            Err(ArchiveError::Convert { command })
        }
    }
}
