use super::{ExportSession, VideoBackend, VideoSink};
use crate::capture::Frame;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Encodes by piping raw RGB24 into an `ffmpeg` child process.
pub struct FfmpegBackend {
    program: PathBuf,
}

impl FfmpegBackend {
    pub fn new(program: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
        }
    }
}

/// ffmpeg encoder name for a codec tag; `mp4v` is MPEG-4 Part 2.
fn encoder_for(tag: &str) -> &str {
    match tag {
        "mp4v" | "xvid" | "divx" | "fmp4" => "mpeg4",
        "avc1" | "h264" => "libx264",
        "mjpg" => "mjpeg",
        other => other,
    }
}

/// Arguments for one session. `-n` refuses to overwrite an existing file.
pub fn command_args(session: &ExportSession) -> Vec<String> {
    let tag = session.codec.to_string();
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-n".into(),
        "-f".into(),
        "rawvideo".into(),
        "-pix_fmt".into(),
        "rgb24".into(),
        "-s".into(),
        session.resolution.to_string(),
        "-r".into(),
        session.fps.to_string(),
        "-i".into(),
        "pipe:0".into(),
        "-c:v".into(),
        encoder_for(&tag).to_string(),
        "-vtag".into(),
        tag,
        "-q:v".into(),
        "5".into(),
        session.path.to_string_lossy().into_owned(),
    ]
}

/// Collect ffmpeg's stderr on its own thread so the pipe never fills up.
fn spawn_stderr_reader(stderr: ChildStderr) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut collected = String::new();
        for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
            debug!("ffmpeg: {}", line);
            if !collected.is_empty() {
                collected.push('\n');
            }
            collected.push_str(&line);
        }
        collected
    })
}

impl VideoBackend for FfmpegBackend {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn open(&self, session: &ExportSession) -> io::Result<Box<dyn VideoSink>> {
        let mut child = Command::new(&self.program)
            .args(command_args(session))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| io::Error::new(e.kind(), format!("failed to start {}: {}", self.program.display(), e)))?;

        let stderr = child.stderr.take().map(spawn_stderr_reader);
        let stdin = match child.stdin.take() {
            Some(stdin) => stdin,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "ffmpeg stdin not available"));
            }
        };

        Ok(Box::new(FfmpegSink {
            child,
            stdin: Some(stdin),
            stderr,
            frame_bytes: session.resolution.pixels() * 3,
        }))
    }
}

struct FfmpegSink {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
    frame_bytes: usize,
}

impl VideoSink for FfmpegSink {
    fn write(&mut self, frame: &Frame) -> io::Result<()> {
        if frame.data().len() != self.frame_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("frame has {} bytes, encoder expects {}", frame.data().len(), self.frame_bytes),
            ));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "ffmpeg input already closed"))?;
        stdin.write_all(frame.data())
    }

    fn finish(self: Box<Self>) -> io::Result<()> {
        let mut sink = *self;
        // Closing stdin is the end-of-stream signal
        drop(sink.stdin.take());
        let status = sink.child.wait()?;
        let stderr = sink
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("ffmpeg exited with {}: {}", status, stderr.trim()),
            ))
        }
    }
}
