use anyhow::{Context, Result, anyhow};

/// Render a number of seconds as zero-padded `HH:MM:SS`.
///
/// Hours are not wrapped, so durations past a day render as e.g. `25:10:05`.
pub fn to_hms(seconds: u64) -> String {
    let (minutes, s) = (seconds / 60, seconds % 60);
    let (h, m) = (minutes / 60, minutes % 60);
    format!("{:0>2}:{:0>2}:{:0>2}", h, m, s)
}

/// Render a number of seconds in the `HHhMMmSSs` form used by the origin's
/// duration fields and by archive directory names.
pub fn to_hms_suffixed(seconds: u64) -> String {
    let minutes = seconds / 60;
    let hours = minutes / 60;
    format!("{:02}h{:02}m{:02}s", hours, minutes % 60, seconds % 60)
}

/// Parse a duration in the `HHhMMmSSs` form into seconds.
///
/// Shorter forms are accepted the way the origin emits them: `SSs` alone and
/// `MMmSSs` are both valid.
pub fn parse_hms(duration: &str) -> Result<u64> {
    let normalized = duration.replace('h', ":").replace('m', ":").replace('s', "");
    let fields: Vec<u64> = normalized
        .split(':')
        .map(|f| {
            f.parse::<u64>()
                .with_context(|| format!("Invalid duration field '{}' in: {}", f, duration))
        })
        .collect::<Result<_>>()?;

    match fields.as_slice() {
        [s] => Ok(*s),
        [m, s] => Ok(m * 60 + s),
        [h, m, s] => Ok(h * 3600 + m * 60 + s),
        _ => Err(anyhow!("Unrecognized duration format: {}", duration)),
    }
}
