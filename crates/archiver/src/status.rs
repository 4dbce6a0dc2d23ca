use chrono::{DateTime, Utc};
use log::debug;
use crate::vod::VodRecord;

/// Clock skew allowed between the VOD-creation and stream-start events,
/// which are recorded independently by the origin.
const LIVE_WINDOW_SECS: i64 = 10;

/// Lookup of the currently live stream for a user, implemented by the
/// external origin client.
pub trait LiveStreamLookup {
    /// Start time of the user's current stream, or `None` when offline.
    fn stream_started_at(&self, user_id: u64) -> anyhow::Result<Option<DateTime<Utc>>>;
}

/// Decide whether a VOD is still being recorded.
///
/// A VOD belongs to the current stream when its creation time falls within
/// ten seconds either side of the stream's start time. Lookup failures and
/// offline users both classify as "not live"; they are expected in normal
/// operation and never propagate as errors.
pub fn is_vod_live(vod: &VodRecord, lookup: &dyn LiveStreamLookup) -> bool {
    let started_at = match lookup.stream_started_at(vod.user_id) {
        Ok(Some(ts)) => ts,
        Ok(None) => return false,
        Err(e) => {
            debug!("Live stream lookup failed for user {}: {:#}", vod.user_id, e);
            return false;
        }
    };

    let delta = vod.created_at.timestamp() - started_at.timestamp();
    if (-LIVE_WINDOW_SECS..=LIVE_WINDOW_SECS).contains(&delta) {
        debug!("VOD creation time is within 10s of stream start, running in live mode.");
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::TimeZone;
    use std::path::PathBuf;

    struct FixedLookup(anyhow::Result<Option<DateTime<Utc>>>);

    impl LiveStreamLookup for FixedLookup {
        fn stream_started_at(&self, _user_id: u64) -> anyhow::Result<Option<DateTime<Utc>>> {
            match &self.0 {
                Ok(ts) => Ok(*ts),
                Err(e) => Err(anyhow!("{}", e)),
            }
        }
    }

    fn vod_created_at(ts: i64) -> VodRecord {
        VodRecord {
            id: 1,
            user_id: 99,
            created_at: Utc.timestamp_opt(ts, 0).unwrap(),
            duration: 3600,
            store_directory: PathBuf::from("/tmp/vod"),
            live: false,
        }
    }

    fn stream_started_at(ts: i64) -> FixedLookup {
        FixedLookup(Ok(Some(Utc.timestamp_opt(ts, 0).unwrap())))
    }

    #[test]
    fn test_same_instant_is_live() {
        assert!(is_vod_live(&vod_created_at(1_700_000_000), &stream_started_at(1_700_000_000)));
    }

    #[test]
    fn test_window_edges() {
        let base = 1_700_000_000;
        // VOD stamped 10s after the stream start
        assert!(is_vod_live(&vod_created_at(base + 10), &stream_started_at(base)));
        // VOD stamped 10s before the stream start
        assert!(is_vod_live(&vod_created_at(base - 10), &stream_started_at(base)));
        // one second past the window either way
        assert!(!is_vod_live(&vod_created_at(base + 11), &stream_started_at(base)));
        assert!(!is_vod_live(&vod_created_at(base - 11), &stream_started_at(base)));
    }

    #[test]
    fn test_offline_user_is_not_live() {
        let lookup = FixedLookup(Ok(None));
        assert!(!is_vod_live(&vod_created_at(1_700_000_000), &lookup));
    }

    #[test]
    fn test_lookup_failure_is_not_live() {
        let lookup = FixedLookup(Err(anyhow!("no stream data returned")));
        assert!(!is_vod_live(&vod_created_at(1_700_000_000), &lookup));
    }
}
