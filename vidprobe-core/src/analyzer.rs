//! Bounded ffprobe invocation: spawn, feed, drain, deadline.
//!
//! One subprocess per call, no pooling and no retries. Two activities run
//! concurrently for the duration of a call: the child itself and a reader
//! thread draining its stdout. For byte-buffer input a third thread feeds
//! stdin in bounded chunks while the reader keeps draining; writing all
//! bytes in one blocking call while nobody empties the output pipe would
//! deadlock both sides.
//!
//! The invoking thread never blocks unboundedly: it polls for stdin-write
//! completion, then child exit, then the reader's end-of-output signal,
//! all against a single wall-clock deadline. Cancellation and timeout both
//! kill the child, which closes the pipes and unblocks the helper threads.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::debug;

use crate::cancel::CancellationToken;
use crate::error::{CoreError, CoreResult};
use crate::media::MediaInfo;

/// Default wall-clock bound for a single ffprobe invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Bytes written to the child's stdin per call, interleaved with the
/// concurrent output drain.
const STDIN_CHUNK_SIZE: usize = 100_000;

/// ffprobe only needs a bounded prefix of piped input to score the format.
/// The documented probesize default (5_000_000) stalls some builds when the
/// data arrives over a pipe; this value is known to work.
const MAX_PIPED_INPUT: usize = 278_188;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Media to probe: either a file on disk or an in-memory byte buffer.
///
/// Built per invocation and discarded afterwards.
#[derive(Debug, Clone, Copy)]
pub enum MediaInput<'a> {
    /// Probe the file at this path.
    Path(&'a Path),
    /// Pipe these bytes to the tool's stdin.
    Buffer(&'a [u8]),
}

/// Invokes ffprobe against media input with a hard timeout and cooperative
/// cancellation.
///
/// The executable path and timeout are fixed at construction; the analyzer
/// holds no other state between calls.
#[derive(Debug, Clone)]
pub struct VideoAnalyzer {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl VideoAnalyzer {
    /// Creates an analyzer with the default 5000 ms timeout.
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self::with_timeout(ffprobe_path, DEFAULT_TIMEOUT)
    }

    /// Creates an analyzer with an explicit timeout.
    pub fn with_timeout(ffprobe_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    /// The configured ffprobe executable path.
    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }

    /// The configured per-invocation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes a media file on disk.
    ///
    /// Fails with [`CoreError::InputNotFound`] before any spawn when the
    /// path does not reference an existing file.
    pub fn analyze_file(
        &self,
        path: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> CoreResult<MediaInfo> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CoreError::InputNotFound(path.display().to_string()));
        }
        self.run(MediaInput::Path(path), cancel)
    }

    /// Probes an in-memory byte buffer by piping it to the tool's stdin.
    ///
    /// Only a bounded prefix of the buffer is written; ffprobe does not
    /// read piped input past its probe window.
    pub fn analyze_bytes(&self, data: &[u8], cancel: &CancellationToken) -> CoreResult<MediaInfo> {
        let capped = &data[..data.len().min(MAX_PIPED_INPUT)];
        self.run(MediaInput::Buffer(capped), cancel)
    }

    fn run(&self, input: MediaInput<'_>, cancel: &CancellationToken) -> CoreResult<MediaInfo> {
        if !self.ffprobe_path.is_file() {
            return Err(CoreError::ToolNotFound(self.ffprobe_path.display().to_string()));
        }

        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"]);
        match input {
            MediaInput::Path(path) => {
                cmd.arg(path);
                cmd.stdin(Stdio::null());
            }
            MediaInput::Buffer(_) => {
                cmd.arg("-");
                cmd.stdin(Stdio::piped());
            }
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());

        debug!("Spawning {} (timeout {:?})", self.ffprobe_path.display(), self.timeout);
        let mut child = cmd.spawn().map_err(CoreError::SpawnFailed)?;
        let deadline = Instant::now() + self.timeout;

        // Take the pipe ends up front so any failure here can still reap
        // the child before returning.
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                kill_quietly(&mut child);
                return Err(CoreError::Other("child stdout was not captured".to_string()));
            }
        };
        let stdin = match input {
            MediaInput::Buffer(_) => match child.stdin.take() {
                Some(stdin) => Some(stdin),
                None => {
                    kill_quietly(&mut child);
                    return Err(CoreError::Other("child stdin was not captured".to_string()));
                }
            },
            MediaInput::Path(_) => None,
        };

        // Start draining stdout before any stdin writing happens.
        let (reader, output_rx) = spawn_output_reader(stdout);

        let (writer_handle, write_rx) = match (input, stdin) {
            (MediaInput::Buffer(data), Some(stdin)) => {
                let (handle, rx) = spawn_stdin_writer(stdin, data.to_vec(), cancel.clone());
                (Some(handle), Some(rx))
            }
            _ => (None, None),
        };

        let outcome = self.drive(&mut child, cancel, deadline, write_rx, output_rx);

        // Make sure the direct child is gone on every exit path.
        kill_quietly(&mut child);

        match outcome {
            Ok(text) => {
                // Both helper threads have already signalled completion
                // (the writer in phase 1, the reader in phase 3), so these
                // joins return immediately.
                if let Some(handle) = writer_handle {
                    let _ = handle.join();
                }
                let _ = reader.join();
                parse_output(&text)
            }
            Err(err) => {
                // A grandchild of the tool (or the hung tool's final
                // moments) can keep the pipe ends open past the deadline;
                // joining here would stall the caller until that process
                // exits. Detach instead: the threads own the pipe handles
                // and terminate once the pipes finally close, and their
                // channel sends already tolerate a dropped receiver.
                drop(writer_handle);
                drop(reader);
                Err(err)
            }
        }
    }

    /// Waits out the three phases of an invocation under one deadline:
    /// stdin-write completion (buffer input only), child exit, then the
    /// reader's end-of-output signal. Returns the accumulated stdout text.
    fn drive(
        &self,
        child: &mut Child,
        cancel: &CancellationToken,
        deadline: Instant,
        write_rx: Option<Receiver<CoreResult<()>>>,
        output_rx: Receiver<String>,
    ) -> CoreResult<String> {
        // Phase 1: stdin writing, if any, completes (or fails) strictly
        // before waiting on child exit.
        if let Some(rx) = write_rx {
            loop {
                if cancel.is_cancelled() {
                    kill_quietly(child);
                    return Err(CoreError::Cancelled);
                }
                if Instant::now() >= deadline {
                    kill_quietly(child);
                    return Err(self.timeout_error());
                }
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(Ok(())) => break,
                    Ok(Err(err)) => {
                        kill_quietly(child);
                        return Err(err);
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        kill_quietly(child);
                        return Err(CoreError::Other(
                            "stdin writer terminated unexpectedly".to_string(),
                        ));
                    }
                }
            }
        }

        // Phase 2: child exit.
        loop {
            if cancel.is_cancelled() {
                kill_quietly(child);
                return Err(CoreError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("ffprobe exited with {status}");
                    break;
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        kill_quietly(child);
                        return Err(self.timeout_error());
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(err) => {
                    kill_quietly(child);
                    return Err(CoreError::Io(err));
                }
            }
        }

        // Phase 3: the reader's "no more data" signal, on the remaining
        // budget. A genuine expiry here discards whatever was buffered.
        let remaining = deadline.saturating_duration_since(Instant::now());
        match output_rx.recv_timeout(remaining) {
            Ok(text) => Ok(text),
            Err(RecvTimeoutError::Timeout) => Err(self.timeout_error()),
            Err(RecvTimeoutError::Disconnected) => {
                Err(CoreError::Other("output reader terminated unexpectedly".to_string()))
            }
        }
    }

    fn timeout_error(&self) -> CoreError {
        CoreError::Timeout(self.timeout.as_millis() as u64)
    }
}

/// Drains the child's stdout line by line and delivers the accumulated
/// text once the stream ends. End-of-stream, not an empty line, is the
/// completion signal.
fn spawn_output_reader(
    stdout: std::process::ChildStdout,
) -> (JoinHandle<()>, Receiver<String>) {
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let mut text = String::new();
        for line in BufReader::new(stdout).lines() {
            match line {
                Ok(line) => {
                    text.push_str(&line);
                    text.push('\n');
                }
                Err(err) => {
                    debug!("stdout read ended early: {err}");
                    break;
                }
            }
        }
        // Receiver may be gone if the invocation already gave up.
        let _ = tx.send(text);
    });
    (handle, rx)
}

/// Feeds the buffer to the child's stdin in bounded chunks, then closes
/// the pipe to signal end of input.
///
/// A broken pipe is not a failure: ffprobe routinely closes stdin once it
/// has read enough of the prefix, and whatever output it produced is still
/// worth parsing. Any other write error is surfaced to the caller.
fn spawn_stdin_writer(
    mut stdin: ChildStdin,
    data: Vec<u8>,
    cancel: CancellationToken,
) -> (JoinHandle<()>, Receiver<CoreResult<()>>) {
    let (tx, rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        let mut result = Ok(());
        for chunk in data.chunks(STDIN_CHUNK_SIZE) {
            if cancel.is_cancelled() {
                result = Err(CoreError::Cancelled);
                break;
            }
            match stdin.write_all(chunk) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    debug!("ffprobe closed stdin early, salvaging captured output");
                    break;
                }
                Err(err) => {
                    result = Err(CoreError::Io(err));
                    break;
                }
            }
        }
        // Flush may hit the same broken pipe; dropping stdin closes it.
        let _ = stdin.flush();
        drop(stdin);
        let _ = tx.send(result);
    });
    (handle, rx)
}

/// Kills and reaps the child, swallowing failures (the process may have
/// already exited).
fn kill_quietly(child: &mut Child) {
    if let Err(err) = child.kill() {
        debug!("kill failed (process likely exited): {err}");
    }
    if let Err(err) = child.wait() {
        debug!("reaping child failed: {err}");
    }
}

/// Maps captured stdout text to the metadata model.
///
/// Empty output, or a parse yielding neither container nor stream data,
/// means the tool gave us nothing usable.
fn parse_output(text: &str) -> CoreResult<MediaInfo> {
    if text.trim().is_empty() {
        return Err(CoreError::NoOutput);
    }
    let info: MediaInfo = serde_json::from_str(text)?;
    if info.is_empty() {
        return Err(CoreError::NoOutput);
    }
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_is_no_feedback() {
        assert!(matches!(parse_output(""), Err(CoreError::NoOutput)));
        assert!(matches!(parse_output("  \n"), Err(CoreError::NoOutput)));
    }

    #[test]
    fn bare_object_is_no_feedback() {
        assert!(matches!(parse_output("{}\n"), Err(CoreError::NoOutput)));
    }

    #[test]
    fn garbage_output_is_a_parse_error() {
        assert!(matches!(
            parse_output("not json at all"),
            Err(CoreError::JsonParse(_))
        ));
    }

    #[test]
    fn format_section_parses() {
        let info = parse_output(r#"{"format":{"duration":"1.5"}}"#).unwrap();
        assert_eq!(info.format.unwrap().duration_secs(), Some(1.5));
    }

    #[test]
    fn missing_tool_fails_before_any_spawn() {
        let analyzer = VideoAnalyzer::new("/nonexistent/ffprobe");
        let err = analyzer
            .analyze_bytes(&[0u8; 16], &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::ToolNotFound(_)));
    }

    #[test]
    fn timeout_error_message_names_the_bound() {
        let analyzer =
            VideoAnalyzer::with_timeout("/nonexistent/ffprobe", Duration::from_millis(1));
        assert_eq!(analyzer.timeout_error().to_string(), "Timeout reached 1 (ms)");
    }
}
