use std::fs;
use anyhow::{Context, Result};
use log::debug;
use crate::vod::VodRecord;

/// Delete the merged stream and the parts directory once a VOD has been
/// converted and verified.
pub fn cleanup_vod_parts(vod: &VodRecord) -> Result<()> {
    debug!("Cleaning up temporary files in {}", vod.store_directory.display());

    let merged = vod.merged_path();
    fs::remove_file(&merged)
        .with_context(|| format!("Failed to remove merged stream: {}", merged.display()))?;

    let parts = vod.parts_dir();
    fs::remove_dir_all(&parts)
        .with_context(|| format!("Failed to remove parts directory: {}", parts.display()))?;

    Ok(())
}
