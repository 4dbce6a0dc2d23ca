use std::str::FromStr;
use anyhow::anyhow;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// A single variant from the origin's master playlist.
///
/// Variants arrive ordered best-first; the first entry is the source
/// ("chunked") rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityVariant {
    /// Resolution string as advertised by the playlist, e.g. `1920x1080`.
    pub resolution: String,
    /// Rounded frames per second.
    pub framerate: u32,
    /// Opaque URI of the variant's media playlist.
    pub uri: String,
}

/// Stream quality requested by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesiredQuality {
    Best,
    Worst,
    Exact { resolution: String, framerate: u32 },
}

impl FromStr for DesiredQuality {
    type Err = anyhow::Error;

    /// Accepts `best`, `worst`, or `<resolution>@<framerate>` such as
    /// `1920x1080@60`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "best" => Ok(DesiredQuality::Best),
            "worst" => Ok(DesiredQuality::Worst),
            other => {
                let (resolution, framerate) = other.split_once('@').ok_or_else(|| {
                    anyhow!("Unrecognized quality '{}', expected best, worst or <resolution>@<framerate>", s)
                })?;
                let framerate = framerate
                    .parse::<u32>()
                    .map_err(|_| anyhow!("Invalid framerate in quality '{}'", s))?;
                Ok(DesiredQuality::Exact {
                    resolution: resolution.to_string(),
                    framerate,
                })
            }
        }
    }
}

/// Pick the variant index to use for a desired quality.
///
/// The origin orders variants best-first, so `Best` is index 0 and `Worst`
/// is the final index. An exact `(resolution, framerate)` request falls back
/// to the first variant matching on resolution alone, and finally to the
/// best variant. Never fails.
pub fn select_variant_index(desired: &DesiredQuality, variants: &[QualityVariant]) -> usize {
    match desired {
        DesiredQuality::Best => 0,
        DesiredQuality::Worst => variants.len().saturating_sub(1),
        DesiredQuality::Exact {
            resolution,
            framerate,
        } => {
            if let Some(index) = variants
                .iter()
                .position(|v| v.resolution == *resolution && v.framerate == *framerate)
            {
                return index;
            }

            info!("Requested quality not found in available streams.");
            if let Some(index) = variants.iter().position(|v| v.resolution == *resolution) {
                return index;
            }

            warn!(
                "No match found for requested resolution {}@{}. Defaulting to best.",
                resolution, framerate
            );
            0
        }
    }
}
