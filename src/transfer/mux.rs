//! Server-side muxing of separate video and audio streams
//!
//! The two provider streams are written into two named pipes inside a private
//! temporary directory, the muxer reads both pipes and writes a fragmented MP4
//! to stdout, and stdout is relayed through a bounded channel into the
//! response body. A single supervisor task owns the child process, the feeder
//! tasks and the temporary directory, and runs cleanup exactly once whatever
//! ends the session.

use super::{stream_error, Deadline};
use crate::error::VidmuxError;
use crate::provider::ByteStream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use nix::sys::stat::Mode;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::pipe;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};

const VIDEO_PIPE: &str = "video.fifo";
const AUDIO_PIPE: &str = "audio.fifo";

/// How long the supervisor waits for a stalled client to accept a failure
const ERROR_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval while waiting for the muxer to open an input pipe
const PIPE_OPEN_RETRY: Duration = Duration::from_millis(10);

/// Grace period for trailing stderr lines once the muxer has exited
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Builds the muxer process for a pair of input paths
pub trait MuxerCommand: Send + Sync {
    /// Program name, for logging
    fn program(&self) -> String;

    /// A command that reads `video` and `audio` and writes one container to stdout
    fn build(&self, video: &Path, audio: &Path) -> Command;
}

/// ffmpeg: copy video, re-encode audio to AAC, fragmented MP4 on stdout
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    pub program: PathBuf,
    pub audio_bitrate: String,
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            audio_bitrate: "192k".to_string(),
        }
    }
}

impl FfmpegMuxer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_audio_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.audio_bitrate = bitrate.into();
        self
    }

    /// Arguments passed to ffmpeg
    pub fn args(&self, video: &Path, audio: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-nostdin", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(video.into());
        args.push("-i".into());
        args.push(audio.into());
        args.extend(
            [
                "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-b:a",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(self.audio_bitrate.as_str().into());
        args.extend(
            ["-movflags", "frag_keyframe+empty_moov", "-f", "mp4", "pipe:1"]
                .iter()
                .map(OsString::from),
        );
        args
    }
}

impl MuxerCommand for FfmpegMuxer {
    fn program(&self) -> String {
        self.program.display().to_string()
    }

    fn build(&self, video: &Path, audio: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.args(video, audio));
        command
    }
}

/// How a mux session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxExit {
    /// Muxer exited successfully after stdout EOF and both inputs finished
    Completed,
    /// An input failed, the muxer exited non-zero, or the deadline passed
    Failed(String),
    /// The consumer went away and the muxer was killed
    Killed,
}

/// A running mux pipeline
pub struct MuxSession {
    /// Muxed output; dropping it cancels the pipeline
    pub output: MuxOutput,
    /// Final outcome, published once cleanup has finished
    pub exit: watch::Receiver<Option<MuxExit>>,
}

/// Receiving end of the muxer output channel
pub struct MuxOutput {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    done: bool,
    _guard: DropGuard,
}

impl Stream for MuxOutput {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Err(err))) => {
                self.done = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                self.done = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

/// Start muxing `video` and `audio`
///
/// Fails before any output is produced if the temporary directory, the named
/// pipes or the muxer process cannot be created.
pub fn spawn_mux(
    muxer: &dyn MuxerCommand,
    video: ByteStream,
    audio: ByteStream,
    channel_capacity: usize,
    deadline: Deadline,
) -> Result<MuxSession, VidmuxError> {
    let workdir = tempfile::Builder::new().prefix("vidmux-").tempdir()?;
    let video_path = workdir.path().join(VIDEO_PIPE);
    let audio_path = workdir.path().join(AUDIO_PIPE);
    make_fifo(&video_path)?;
    make_fifo(&audio_path)?;

    let mut child = muxer
        .build(&video_path, &audio_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| VidmuxError::Muxer(format!("failed to start {}: {}", muxer.program(), e)))?;
    info!(
        "Started muxer {} (pid {:?}) in {}",
        muxer.program(),
        child.id(),
        workdir.path().display()
    );

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| VidmuxError::Muxer("stdout not captured".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| VidmuxError::Muxer("stderr not captured".to_string()))?;

    let cancel = CancellationToken::new();
    // one slot per feeder, so reporting never blocks
    let (failure_tx, failure_rx) = mpsc::channel(2);
    let feeders = vec![
        tokio::spawn(feed(
            "video",
            video,
            video_path,
            cancel.clone(),
            failure_tx.clone(),
        )),
        tokio::spawn(feed("audio", audio, audio_path, cancel.clone(), failure_tx)),
    ];
    let stderr_task = tokio::spawn(log_stderr(stderr));

    let (tx, rx) = mpsc::channel(channel_capacity.max(1));
    let (exit_tx, exit_rx) = watch::channel(None);

    let supervisor = Supervisor {
        child,
        tx,
        failures: failure_rx,
        cancel: cancel.clone(),
        deadline,
        feeders,
        stderr_task,
        workdir,
        exit_tx,
    };
    tokio::spawn(supervisor.run(stdout));

    Ok(MuxSession {
        output: MuxOutput {
            rx,
            done: false,
            _guard: cancel.drop_guard(),
        },
        exit: exit_rx,
    })
}

fn make_fifo(path: &Path) -> Result<(), VidmuxError> {
    nix::unistd::mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR)
        .map_err(|errno| VidmuxError::Io(io::Error::from(errno)))
}

/// Open the write end of a FIFO once the muxer has opened the read end
///
/// A non-blocking open fails with ENXIO until a reader exists. Opening only
/// after the reader guarantees that bytes written before close reach it.
async fn open_pipe(path: &Path, cancel: &CancellationToken) -> io::Result<pipe::Sender> {
    loop {
        match pipe::OpenOptions::new().open_sender(path) {
            Err(e) if e.raw_os_error() == Some(nix::errno::Errno::ENXIO as i32) => {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(io::Error::new(io::ErrorKind::Interrupted, "cancelled"));
                    }
                    _ = tokio::time::sleep(PIPE_OPEN_RETRY) => {}
                }
            }
            other => return other,
        }
    }
}

/// Copy one provider stream into its pipe
///
/// A failure is reported before the pipe is closed, so the muxer cannot see a
/// clean EOF on an input whose failure the supervisor has not been told about.
async fn feed(
    label: &'static str,
    mut source: ByteStream,
    path: PathBuf,
    cancel: CancellationToken,
    failures: mpsc::Sender<VidmuxError>,
) {
    let mut pipe = match open_pipe(&path, &cancel).await {
        Ok(pipe) => pipe,
        Err(e) => {
            if !cancel.is_cancelled() {
                let _ = failures
                    .send(VidmuxError::Muxer(format!("opening {} pipe: {}", label, e)))
                    .await;
            }
            return;
        }
    };

    let result = tokio::select! {
        _ = cancel.cancelled() => {
            debug!("{} feeder cancelled", label);
            return;
        }
        result = copy_stream(label, &mut source, &mut pipe) => result,
    };

    match result {
        Ok(written) => debug!("{} feeder finished, {} bytes", label, written),
        Err(err) => {
            warn!("{} feeder failed: {}", label, err);
            let _ = failures.send(err).await;
        }
    }
    drop(pipe);
}

async fn copy_stream(
    label: &str,
    source: &mut ByteStream,
    pipe: &mut pipe::Sender,
) -> Result<u64, VidmuxError> {
    let mut written = 0u64;
    while let Some(chunk) = source.next().await {
        let chunk =
            chunk.map_err(|e| VidmuxError::Upstream(format!("{} stream failed: {}", label, e)))?;
        pipe.write_all(&chunk)
            .await
            .map_err(|e| VidmuxError::Muxer(format!("writing {} pipe: {}", label, e)))?;
        written += chunk.len() as u64;
    }
    pipe.flush().await?;
    Ok(written)
}

async fn log_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!("muxer: {}", line);
    }
}

enum Stop {
    Cancelled,
    Failed(VidmuxError),
}

struct Supervisor {
    child: Child,
    tx: mpsc::Sender<io::Result<Bytes>>,
    failures: mpsc::Receiver<VidmuxError>,
    cancel: CancellationToken,
    deadline: Deadline,
    feeders: Vec<JoinHandle<()>>,
    stderr_task: JoinHandle<()>,
    workdir: TempDir,
    exit_tx: watch::Sender<Option<MuxExit>>,
}

impl Supervisor {
    async fn run(mut self, stdout: ChildStdout) {
        let outcome = self.relay(stdout).await;
        self.cleanup(outcome).await;
    }

    /// Relay stdout until EOF and a successful exit, or until something stops the session
    async fn relay(&mut self, stdout: ChildStdout) -> Result<u64, Stop> {
        let mut output = ReaderStream::new(stdout);
        let expired = self.deadline.sleep();
        tokio::pin!(expired);
        let mut relayed = 0u64;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
                _ = &mut expired => return Err(Stop::Failed(self.deadline.error())),
                Some(err) = self.failures.recv() => return Err(Stop::Failed(err)),
                chunk = output.next() => match chunk {
                    Some(Ok(bytes)) => {
                        let len = bytes.len() as u64;
                        tokio::select! {
                            _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
                            _ = &mut expired => return Err(Stop::Failed(self.deadline.error())),
                            sent = self.tx.send(Ok(bytes)) => {
                                if sent.is_err() {
                                    return Err(Stop::Cancelled);
                                }
                            }
                        }
                        relayed += len;
                    }
                    Some(Err(e)) => {
                        let message = format!("reading output: {}", e);
                        return Err(Stop::Failed(VidmuxError::Muxer(message)));
                    }
                    None => break,
                },
            }
        }

        let status = tokio::select! {
            _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
            _ = &mut expired => return Err(Stop::Failed(self.deadline.error())),
            status = self.child.wait() => status
                .map_err(|e| Stop::Failed(VidmuxError::Muxer(format!("waiting for exit: {}", e))))?,
        };
        if !status.success() {
            return Err(Stop::Failed(VidmuxError::Muxer(format!("exited with {}", status))));
        }
        if let Ok(err) = self.failures.try_recv() {
            return Err(Stop::Failed(err));
        }
        Ok(relayed)
    }

    async fn cleanup(mut self, outcome: Result<u64, Stop>) {
        self.cancel.cancel();

        let exit = match outcome {
            Ok(relayed) => {
                info!("Mux completed, {} bytes", relayed);
                MuxExit::Completed
            }
            Err(Stop::Cancelled) => {
                info!("Mux cancelled by client, killing muxer");
                MuxExit::Killed
            }
            Err(Stop::Failed(err)) => {
                error!("Mux failed: {}", err);
                let message = err.to_string();
                if self
                    .tx
                    .send_timeout(Err(stream_error(err)), ERROR_DELIVERY_TIMEOUT)
                    .await
                    .is_err()
                {
                    debug!("Client gone before mux failure could be delivered");
                }
                MuxExit::Failed(message)
            }
        };

        if exit != MuxExit::Completed {
            if let Err(e) = self.child.start_kill() {
                debug!("Muxer already exited: {}", e);
            }
        }
        if let Err(e) = self.child.wait().await {
            warn!("Failed to reap muxer: {}", e);
        }
        for feeder in self.feeders.drain(..) {
            let _ = feeder.await;
        }
        if tokio::time::timeout(STDERR_DRAIN_TIMEOUT, &mut self.stderr_task)
            .await
            .is_err()
        {
            self.stderr_task.abort();
        }

        let workdir = self.workdir.path().to_path_buf();
        if let Err(e) = self.workdir.close() {
            warn!("Failed to remove {}: {}", workdir.display(), e);
        }

        drop(self.tx);
        self.exit_tx.send_replace(Some(exit));
    }
}
