use std::io::Read;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread::JoinHandle;

use crate::encode::profile::{AudioCodec, CodecProfile, EncoderCaps, ExportFormat, VideoCodec};
use crate::encode::sink::{EncoderConfig, EncoderSink};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::render::frame::FrameRGBA;

const STDOUT_CHUNK_BYTES: usize = 64 * 1024;

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Capability table read from `ffmpeg -encoders`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FfmpegEncoderCaps {
    encoders: Vec<String>,
}

impl FfmpegEncoderCaps {
    /// Query the local `ffmpeg`. Missing `ffmpeg` yields an empty table.
    pub fn probe() -> Self {
        let out = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();
        match out {
            Ok(out) if out.status.success() => {
                Self::from_listing(&String::from_utf8_lossy(&out.stdout))
            }
            Ok(out) => {
                tracing::warn!(status = %out.status, "ffmpeg -encoders failed");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "ffmpeg not available");
                Self::default()
            }
        }
    }

    /// Parse the `ffmpeg -encoders` table (`" V....D libx264  ..."` rows).
    pub fn from_listing(listing: &str) -> Self {
        let encoders = listing
            .lines()
            .filter_map(|line| {
                let mut cols = line.split_whitespace();
                let flags = cols.next()?;
                let name = cols.next()?;
                let kind = flags.chars().next()?;
                (flags.len() == 6 && matches!(kind, 'V' | 'A') && name != "=")
                    .then(|| name.to_string())
            })
            .collect();
        Self { encoders }
    }

    fn has(&self, name: &str) -> bool {
        self.encoders.iter().any(|e| e == name)
    }

    fn video_encoder(&self, codec: VideoCodec) -> Option<&'static str> {
        let names: &[&'static str] = match codec {
            VideoCodec::Vp9 => &["libvpx-vp9"],
            VideoCodec::H264 => &["libx264", "libopenh264"],
        };
        names.iter().copied().find(|n| self.has(n))
    }

    fn audio_encoder(&self, codec: AudioCodec) -> Option<&'static str> {
        let names: &[&'static str] = match codec {
            AudioCodec::Opus => &["libopus", "opus"],
            AudioCodec::Aac => &["aac", "libfdk_aac"],
        };
        names.iter().copied().find(|n| self.has(n))
    }

    /// Concrete encoder names for `profile`, or `None` when unsupported.
    pub fn resolve(&self, profile: &CodecProfile) -> Option<(&'static str, &'static str)> {
        let video = profile.video.unwrap_or(match profile.format {
            ExportFormat::Webm => VideoCodec::Vp9,
            ExportFormat::Mp4 => VideoCodec::H264,
        });
        let audio = profile.audio.unwrap_or(match profile.format {
            ExportFormat::Webm => AudioCodec::Opus,
            ExportFormat::Mp4 => AudioCodec::Aac,
        });
        // The webm muxer only takes VP8/VP9/AV1 video.
        if profile.format == ExportFormat::Webm && video == VideoCodec::H264 {
            return None;
        }
        Some((self.video_encoder(video)?, self.audio_encoder(audio)?))
    }
}

impl EncoderCaps for FfmpegEncoderCaps {
    fn supports(&self, format: ExportFormat, profile: &CodecProfile) -> bool {
        profile.format == format && self.resolve(profile).is_some()
    }
}

/// Sink that spawns the system `ffmpeg`, streams flattened frames to stdin and collects the
/// encoded container from stdout as chunks.
pub struct FfmpegSink {
    caps: FfmpegEncoderCaps,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    chunks: Option<Receiver<Vec<u8>>>,
    stdout_drain: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
    cfg: Option<EncoderConfig>,
    last_idx: Option<FrameIndex>,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("running", &self.child.is_some())
            .field("last_idx", &self.last_idx)
            .finish()
    }
}

impl FfmpegSink {
    /// Create a sink resolving codecs through `caps`.
    pub fn new(caps: FfmpegEncoderCaps) -> Self {
        Self {
            caps,
            child: None,
            stdin: None,
            chunks: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn build_command(&self, cfg: &EncoderConfig) -> CaptionResult<Command> {
        let (venc, aenc) = self.caps.resolve(&cfg.profile.codec).ok_or_else(|| {
            CaptionError::media(format!(
                "ffmpeg cannot encode {}",
                cfg.profile.codec.mime()
            ))
        })?;

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
        ]);
        if let Some(track) = &cfg.audio {
            cmd.arg("-i").arg(&track.path);
            cmd.args(["-map", "0:v:0", "-map", &format!("1:a:{}?", track.stream)]);
            cmd.args(["-c:a", aenc]);
            if let Some(bps) = cfg.profile.audio_bitrate_bps {
                cmd.args(["-b:a", &bps.to_string()]);
            }
            cmd.arg("-shortest");
        } else {
            cmd.arg("-an");
        }
        cmd.args(["-c:v", venc, "-pix_fmt", "yuv420p"]);
        if let Some(bps) = cfg.profile.video_bitrate_bps {
            cmd.args(["-b:v", &bps.to_string()]);
        }
        match cfg.profile.codec.format {
            ExportFormat::Webm => {
                cmd.args(["-f", "webm"]);
            }
            ExportFormat::Mp4 => {
                // Non-seekable output needs a fragmented layout.
                cmd.args(["-movflags", "frag_keyframe+empty_moov", "-f", "mp4"]);
            }
        }
        cmd.arg("pipe:1");
        Ok(cmd)
    }

    fn teardown(&mut self) -> CaptionResult<std::process::ExitStatus> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| CaptionError::media("ffmpeg sink not started"))?;
        let status = child
            .wait()
            .map_err(|e| CaptionError::media(format!("failed to wait for ffmpeg: {e}")))?;
        if let Some(h) = self.stdout_drain.take() {
            h.join()
                .map_err(|_| CaptionError::media("ffmpeg stdout drain thread panicked"))?
                .map_err(|e| CaptionError::media(format!("ffmpeg stdout read failed: {e}")))?;
        }
        Ok(status)
    }

    fn stderr_text(&mut self) -> String {
        self.stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .and_then(Result::ok)
            .map(|b| String::from_utf8_lossy(&b).trim().to_string())
            .unwrap_or_default()
    }
}

impl EncoderSink for FfmpegSink {
    #[tracing::instrument(skip_all, fields(mime = %cfg.profile.codec.mime()))]
    fn begin(&mut self, cfg: EncoderConfig) -> CaptionResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(CaptionError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(CaptionError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(CaptionError::media(
                "ffmpeg is required for export, but was not found on PATH",
            ));
        }

        let mut child = self.build_command(&cfg)?.spawn().map_err(|e| {
            CaptionError::media(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CaptionError::media("failed to open ffmpeg stdin"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptionError::media("failed to open ffmpeg stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CaptionError::media("failed to open ffmpeg stderr"))?;

        let (tx, rx) = mpsc::channel();
        let stdout_drain = std::thread::spawn(move || {
            let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
            loop {
                let n = stdout.read(&mut buf)?;
                if n == 0 {
                    return Ok(());
                }
                if tx.send(buf[..n].to_vec()).is_err() {
                    return Ok(());
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });
        tracing::debug!(pid = child.id(), "ffmpeg encoder started");

        self.scratch = Vec::with_capacity(cfg.width as usize * cfg.height as usize * 4);
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.chunks = Some(rx);
        self.stdout_drain = Some(stdout_drain);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CaptionResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CaptionError::media("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(CaptionError::media(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(CaptionError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);
        frame.flatten_over_into(cfg.bg_rgba, &mut self.scratch);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CaptionError::media("ffmpeg sink is already finalized"));
        };
        use std::io::Write as _;
        stdin
            .write_all(&self.scratch)
            .map_err(|e| CaptionError::media(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn take_chunks(&mut self) -> CaptionResult<Vec<Vec<u8>>> {
        Ok(self
            .chunks
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default())
    }

    fn finish(&mut self) -> CaptionResult<Vec<Vec<u8>>> {
        let status = self.teardown()?;
        let rest = self.take_chunks()?;
        self.chunks = None;
        self.cfg = None;
        let stderr = self.stderr_text();
        if !status.success() {
            return Err(CaptionError::media(format!(
                "ffmpeg exited with status {status}: {stderr}"
            )));
        }
        tracing::debug!("ffmpeg encoder finished");
        Ok(rest)
    }

    fn abort(&mut self) {
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
        }
        let _ = self.teardown();
        let _ = self.stderr_text();
        self.chunks = None;
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
