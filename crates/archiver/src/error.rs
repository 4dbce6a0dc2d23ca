use std::path::PathBuf;
use thiserror::Error;
use crate::convert::RecoveryRange;

/// Failures surfaced by the archive pipeline.
///
/// Subprocess variants carry the exact command line that was invoked so the
/// operator can re-run it by hand. Nothing is retried inside the pipeline;
/// retry policy belongs to the surrounding job orchestration.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The parts directory contained no usable stream segments.
    #[error("no stream segments found in {}", .0.display())]
    NoSegmentsFound(PathBuf),

    /// The segment merger exited with a non-zero status.
    #[error("VOD merger exited with error. Command: {command}")]
    Merge { command: String },

    /// The converter exited with a non-zero status.
    #[error("VOD converter exited with error. Command: {command}")]
    Convert { command: String },

    /// A corrupt packet was hit mid-conversion. The named segment files must
    /// be re-acquired before the job can be re-run.
    #[error(
        "corrupt segment encountered while converting VOD. Stream parts need to be \
         re-downloaded. Ensure the VOD is still available and either delete files \
         '{lowest:05}.ts' - '{highest:05}.ts' from the 'parts' directory or, the \
         entire 'parts' directory if the issue persists.",
        lowest = .range.lowest,
        highest = .range.highest
    )]
    Corruption { range: RecoveryRange },

    /// The duration probe failed to run or produced unusable output.
    #[error("VOD length verification failed: {detail}. Command: {command}")]
    Probe { command: String, detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
