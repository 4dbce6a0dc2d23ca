use std::io::Write;
use std::time::Instant;
use crate::timefmt;

/// Width of the rendered progress bar in characters.
const BAR_WIDTH: u64 = 25;

/// Terminal progress reporter for a single pipeline run.
///
/// The caller constructs one reporter per run and threads it through the
/// merge and convert stages. The start timestamp is recorded on first use
/// and lives as long as the reporter, which is what the ETA estimate is
/// computed against.
pub struct ProgressReporter {
    started: Option<Instant>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        ProgressReporter { started: None }
    }

    /// Print an intermediate frame, overwriting the current terminal line.
    pub fn update(&mut self, current: u64, total: u64) {
        let started = *self.started.get_or_insert_with(Instant::now);
        Self::emit(&render(started.elapsed().as_secs(), current, total, false));
    }

    /// Print the final frame and move to the next line.
    ///
    /// Always renders a completed bar so the terminal line is left clean
    /// even when intermediate updates under- or overshot from rounding.
    pub fn finish(&mut self, current: u64, total: u64) {
        let started = *self.started.get_or_insert_with(Instant::now);
        Self::emit(&render(started.elapsed().as_secs(), current, total, true));
    }

    fn emit(frame: &str) {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(frame.as_bytes());
        let _ = stdout.flush();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one frame of the progress line.
///
/// Kept pure so frames can be checked without touching wall-clock time.
fn render(elapsed_secs: u64, current: u64, total: u64, last_frame: bool) -> String {
    let width = total.to_string().len();

    if last_frame {
        return format!(
            "  100%  -  [{}]  -  {:>width$} / {}  -  ETA: 00:00:00\n",
            "#".repeat(BAR_WIDTH as usize),
            current,
            total,
            width = width
        );
    }

    let percent = if total == 0 { 0 } else { 100 * current / total };
    let filled = (percent / 4).min(BAR_WIDTH);
    let bar = format!(
        "{}{}",
        "#".repeat(filled as usize),
        " ".repeat((BAR_WIDTH - filled) as usize)
    );

    let eta = if current == 0 {
        "?".to_string()
    } else {
        let remaining =
            (elapsed_secs as f64 / current as f64 * (total - current) as f64).ceil() as u64;
        timefmt::to_hms(remaining)
    };

    format!(
        "  {percent:>3}%  -  [{bar}]  -  {current:>width$} / {total}  -  ETA: {eta}\r",
        width = width
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_halfway_frame() {
        let frame = render(10, 50, 100, false);
        assert_eq!(
            frame,
            "   50%  -  [############             ]  -   50 / 100  -  ETA: 00:00:10\r"
        );
    }

    #[test]
    fn test_unknown_eta_before_first_progress() {
        let frame = render(5, 0, 100, false);
        assert!(frame.contains("ETA: ?"));
        assert!(frame.starts_with("    0%"));
    }

    #[test]
    fn test_last_frame_renders_complete_regardless_of_counts() {
        let frame = render(123, 7, 10, true);
        assert_eq!(
            frame,
            "  100%  -  [#########################]  -   7 / 10  -  ETA: 00:00:00\n"
        );
    }

    #[test]
    fn test_overshoot_does_not_widen_bar() {
        // The fallback merge path reports raw subprocess timestamps which can
        // exceed the expected duration.
        let frame = render(10, 110, 100, false);
        assert!(frame.contains("[#########################]"));
        assert!(frame.contains("110%"));
    }

    proptest! {
        /// The bar section is always exactly 25 characters wide.
        #[test]
        fn test_bar_width_invariant(
            elapsed in 0u64..100_000,
            current in 0u64..100_000,
            total in 1u64..100_000,
        ) {
            let frame = render(elapsed, current, total, false);
            let open = frame.find('[').unwrap();
            let close = frame.find(']').unwrap();
            prop_assert_eq!(close - open - 1, 25);
        }

        /// The final frame always shows 100% and a zero ETA.
        #[test]
        fn test_last_frame_invariant(
            elapsed in 0u64..100_000,
            current in 0u64..100_000,
            total in 1u64..100_000,
        ) {
            let frame = render(elapsed, current, total, true);
            prop_assert!(frame.contains("100%"));
            prop_assert!(frame.contains("ETA: 00:00:00"));
            prop_assert!(frame.ends_with('\n'));
        }
    }
}
