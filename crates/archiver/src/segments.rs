use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use log::{debug, warn};
use walkdir::WalkDir;
use crate::error::ArchiveError;

/// Extension used by downloaded stream segments.
pub const SEGMENT_EXTENSION: &str = "ts";

/// File name the downloader uses for a given sequence number.
pub fn segment_file_name(seq: u64) -> String {
    format!("{:05}.{}", seq, SEGMENT_EXTENSION)
}

/// Segments present on disk for one VOD at merge time.
///
/// Derived from the part filenames, never persisted. Sequence numbers are
/// unique non-negative integers; duplicates are validated by the downloader
/// and not re-checked here.
#[derive(Debug, Clone)]
pub struct SegmentInventory {
    /// `(sequence number, path)` pairs in ascending sequence order.
    pub parts: Vec<(u64, PathBuf)>,
    /// Highest sequence number present.
    pub highest: u64,
    /// Sequence numbers missing from `0..=highest`.
    pub discontinuities: BTreeSet<u64>,
}

impl SegmentInventory {
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// True when every segment in `0..=highest` is present.
    pub fn is_contiguous(&self) -> bool {
        self.discontinuities.is_empty()
    }

    /// Segment paths in ascending sequence order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.parts.iter().map(|(_, p)| p.as_path())
    }
}

/// Scan a parts directory and build the segment inventory.
pub fn scan_parts(dir: &Path) -> Result<SegmentInventory, ArchiveError> {
    let mut parts: Vec<(u64, PathBuf)> = Vec::new();

    for entry in WalkDir::new(dir).max_depth(1).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error reading directory entry: {}", e);
                continue;
            }
        };
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) != Some(SEGMENT_EXTENSION) {
            continue;
        }

        match path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(seq) => parts.push((seq, path.to_path_buf())),
            None => debug!("Ignoring non-segment file: {}", path.display()),
        }
    }

    if parts.is_empty() {
        return Err(ArchiveError::NoSegmentsFound(dir.to_path_buf()));
    }

    parts.sort_by_key(|(seq, _)| *seq);
    let highest = parts[parts.len() - 1].0;
    let present: BTreeSet<u64> = parts.iter().map(|(seq, _)| *seq).collect();
    let discontinuities = (0..=highest).filter(|seq| !present.contains(seq)).collect();

    Ok(SegmentInventory {
        parts,
        highest,
        discontinuities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn seed_parts(dir: &Path, seqs: &[u64]) {
        for seq in seqs {
            fs::write(dir.join(segment_file_name(*seq)), b"x").unwrap();
        }
    }

    #[test]
    fn test_contiguous_inventory() {
        let dir = tempfile::tempdir().unwrap();
        seed_parts(dir.path(), &[0, 1, 2]);

        let inventory = scan_parts(dir.path()).unwrap();
        assert_eq!(inventory.len(), 3);
        assert_eq!(inventory.highest, 2);
        assert!(inventory.is_contiguous());
    }

    #[test]
    fn test_gap_detection() {
        let dir = tempfile::tempdir().unwrap();
        seed_parts(dir.path(), &[0, 1, 2, 4, 5]);

        let inventory = scan_parts(dir.path()).unwrap();
        assert_eq!(inventory.highest, 5);
        assert_eq!(
            inventory.discontinuities.iter().copied().collect::<Vec<_>>(),
            vec![3]
        );
        assert!(!inventory.is_contiguous());
    }

    #[test]
    fn test_ordering_is_numeric() {
        let dir = tempfile::tempdir().unwrap();
        seed_parts(dir.path(), &[10, 2, 0, 1]);

        let inventory = scan_parts(dir.path()).unwrap();
        let seqs: Vec<u64> = inventory.parts.iter().map(|(s, _)| *s).collect();
        assert_eq!(seqs, vec![0, 1, 2, 10]);
    }

    #[test]
    fn test_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        match scan_parts(dir.path()) {
            Err(ArchiveError::NoSegmentsFound(path)) => assert_eq!(path, dir.path()),
            other => panic!("expected NoSegmentsFound, got {:?}", other.map(|i| i.len())),
        }
    }

    #[test]
    fn test_foreign_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        seed_parts(dir.path(), &[0, 1]);
        fs::write(dir.path().join("segments.txt"), "file '00000.ts'\n").unwrap();
        fs::write(dir.path().join("readme.ts"), b"not a segment").unwrap();

        let inventory = scan_parts(dir.path()).unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory.highest, 1);
    }
}
