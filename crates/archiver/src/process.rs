use std::path::Path;
use std::process::Stdio;
use anyhow::{Context, Result};
use log::debug;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, Command};

/// Description of an external command, kept alongside the spawned process so
/// failures can report the exact invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &Path) -> Self {
        CommandSpec {
            program: program.to_string_lossy().to_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The full invocation as a single line, for diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Run the command to completion, capturing its output.
    ///
    /// Used for short one-shot invocations such as the duration probe; the
    /// streamed interface below is for long conversions.
    pub async fn output(&self) -> std::io::Result<std::process::Output> {
        debug!("Executing: {}", self.command_line());
        Command::new(&self.program).args(&self.args).output().await
    }
}

/// Events extracted from a running ffmpeg process's diagnostic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfmpegEvent {
    /// An elapsed-time marker was parsed from an output line.
    Progress { seconds: u64 },
    /// A corrupt packet was reported. Carries the last parsed elapsed time,
    /// since the corruption line itself has no usable timestamp.
    PacketCorrupt { seconds: u64 },
    /// The process terminated.
    Exited { success: bool },
}

/// A spawned ffmpeg process whose stderr is consumed incrementally.
///
/// ffmpeg writes its status line to stderr; reading it line-by-line lets the
/// pipeline report progress and react to corruption before the process
/// exits. Awaiting the next line is the pipeline's only suspend point while
/// a conversion runs.
#[derive(Debug)]
pub struct FfmpegProcess {
    child: Child,
    stderr: Lines<BufReader<ChildStderr>>,
    spec: CommandSpec,
    last_progress: u64,
}

impl FfmpegProcess {
    /// Spawn the process with stderr piped for event extraction.
    pub async fn spawn(spec: CommandSpec) -> Result<Self> {
        debug!("Executing: {}", spec.command_line());

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn process: {}", spec.command_line()))?;

        let stderr = child
            .stderr
            .take()
            .context("Failed to capture process stderr")?;

        Ok(FfmpegProcess {
            child,
            stderr: BufReader::new(stderr).lines(),
            spec,
            last_progress: 0,
        })
    }

    pub fn command_line(&self) -> String {
        self.spec.command_line()
    }

    /// Wait for the next event from the process.
    ///
    /// Output lines with no marker of interest are skipped. Once the output
    /// stream ends the process is reaped and a final `Exited` event is
    /// returned.
    pub async fn next_event(&mut self) -> Result<FfmpegEvent> {
        loop {
            match self.stderr.next_line().await {
                Ok(Some(line)) => {
                    if let Some(seconds) = parse_time_marker(&line) {
                        self.last_progress = seconds;
                        return Ok(FfmpegEvent::Progress { seconds });
                    }
                    if line.contains("Packet corrupt") {
                        return Ok(FfmpegEvent::PacketCorrupt {
                            seconds: self.last_progress,
                        });
                    }
                }
                Ok(None) | Err(_) => {
                    let status = self
                        .child
                        .wait()
                        .await
                        .context("Failed to wait for process")?;
                    return Ok(FfmpegEvent::Exited {
                        success: status.success(),
                    });
                }
            }
        }
    }

    /// Terminate the process immediately.
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await.context("Failed to kill process")
    }
}

/// Parse the `time=` marker from an ffmpeg status line into whole seconds.
///
/// Status lines look like `... time=00:02:05.73 bitrate= 512.3kbits/s ...`;
/// the seconds field is truncated to two digits, dropping the fraction.
pub fn parse_time_marker(line: &str) -> Option<u64> {
    let start = line.find("time=")? + "time=".len();
    let rest = &line[start..];
    let timestamp = &rest[..rest.find(" bitrate=")?];

    let mut fields = timestamp.split(':');
    let hours: u64 = fields.next()?.trim().parse().ok()?;
    let minutes: u64 = fields.next()?.parse().ok()?;
    let seconds_field = fields.next()?;
    let seconds: u64 = seconds_field
        .get(..2)
        .unwrap_or(seconds_field)
        .parse()
        .ok()?;

    Some(hours * 3600 + minutes * 60 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_time_marker() {
        let line = "frame= 1234 fps=250 q=-1.0 size=  131072KiB time=00:01:05.73 bitrate= 512.3kbits/s speed=10.2x";
        assert_eq!(parse_time_marker(line), Some(65));

        let hour_line = "size= 4194304KiB time=01:00:00.00 bitrate=9544.4kbits/s speed=9.81x";
        assert_eq!(parse_time_marker(hour_line), Some(3600));
    }

    #[test]
    fn test_parse_time_marker_rejects_other_lines() {
        assert_eq!(parse_time_marker("Input #0, mpegts, from 'merged.ts':"), None);
        assert_eq!(parse_time_marker("  Duration: 03:44:22.00, start: 1.400000"), None);
        // a not-yet-known timestamp renders as N/A
        assert_eq!(
            parse_time_marker("size= 0KiB time=N/A bitrate=N/A speed=N/A"),
            None
        );
    }

    #[test]
    fn test_command_line_rendering() {
        let spec = CommandSpec::new(&PathBuf::from("ffmpeg"))
            .arg("-hide_banner")
            .args(["-i", "merged.ts"])
            .arg("out.mp4");
        assert_eq!(spec.command_line(), "ffmpeg -hide_banner -i merged.ts out.mp4");
    }

    #[tokio::test]
    async fn test_spawn_failure_carries_command() {
        let spec = CommandSpec::new(&PathBuf::from("/nonexistent/ffmpeg")).arg("-version");
        let err = FfmpegProcess::spawn(spec).await.unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/ffmpeg -version"));
    }
}
