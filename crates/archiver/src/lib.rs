pub mod cleanup;
pub mod config;
pub mod convert;
pub mod error;
pub mod markers;
pub mod merge;
pub mod process;
pub mod progress;
pub mod quality;
pub mod segments;
pub mod status;
pub mod timefmt;
pub mod verify;
pub mod vod;

pub use config::ArchiverConfig;
pub use convert::RecoveryRange;
pub use error::ArchiveError;
pub use progress::ProgressReporter;
pub use quality::{DesiredQuality, QualityVariant};
pub use segments::SegmentInventory;
pub use status::LiveStreamLookup;
pub use verify::LengthVerdict;
pub use vod::VodRecord;
