use log::debug;
use crate::config::ArchiverConfig;
use crate::error::ArchiveError;
use crate::markers;
use crate::process::CommandSpec;
use crate::vod::VodRecord;

/// Allowed difference between the probed and expected duration, in seconds.
const LENGTH_TOLERANCE_SECS: i64 = 2;

/// Outcome of comparing the converted file's duration to the expected one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthVerdict {
    Passed,
    /// Durations differ by more than the tolerance. `delta` is probed minus
    /// expected.
    Failed { delta: i64 },
}

impl LengthVerdict {
    /// True when verification failed. Callers branch on the same polarity
    /// as the historical boolean ("true means failed").
    pub fn failed(&self) -> bool {
        matches!(self, LengthVerdict::Failed { .. })
    }
}

/// Verify the converted VOD's duration against the expected duration.
///
/// Skipped entirely when the `.ignorelength` marker exists in the store
/// directory, which is how intentionally-trimmed archives opt out.
pub async fn verify_vod_length(
    cfg: &ArchiverConfig,
    vod: &VodRecord,
) -> Result<LengthVerdict, ArchiveError> {
    debug!("Verifying length of VOD file.");

    if markers::has_ignore_length(&vod.store_directory) {
        debug!(".ignorelength file present - skipping verification.");
        return Ok(LengthVerdict::Passed);
    }

    let spec = CommandSpec::new(&cfg.ffprobe_bin)
        .args(["-v", "quiet"])
        .arg("-i")
        .arg(vod.converted_path().to_string_lossy())
        .args(["-show_entries", "format=duration"])
        .args(["-of", "default=noprint_wrappers=1:nokey=1"]);
    let command = spec.command_line();

    let output = spec.output().await.map_err(|e| ArchiveError::Probe {
        command: command.clone(),
        detail: format!("failed to execute ffprobe: {}", e),
    })?;

    if !output.status.success() {
        return Err(ArchiveError::Probe {
            command,
            detail: format!("exited with code {}", output.status.code().unwrap_or(-1)),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let probed = stdout
        .trim()
        .parse::<f64>()
        .map_err(|_| ArchiveError::Probe {
            command,
            detail: format!("unparsable duration output {:?}", stdout.trim()),
        })?
        .trunc() as i64;

    debug!(
        "Downloaded VOD length is {}. Expected length is {}.",
        probed, vod.duration
    );
    Ok(evaluate(probed, vod.duration as i64))
}

/// Compare a probed duration against the expected one.
fn evaluate(probed: i64, expected: i64) -> LengthVerdict {
    let delta = probed - expected;
    if delta.abs() <= LENGTH_TOLERANCE_SECS {
        debug!("VOD passed length verification.");
        LengthVerdict::Passed
    } else {
        LengthVerdict::Failed { delta }
    }
}
