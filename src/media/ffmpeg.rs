use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use crate::foundation::core::Fps;
use crate::foundation::error::{CaptionError, CaptionResult};
use crate::media::source::{AudioTrack, LoadStatus, MediaInfo, MediaSource};
use crate::render::frame::FrameRGBA;

/// Probe `path` with `ffprobe`.
pub fn probe_media(path: &Path) -> CaptionResult<MediaInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| CaptionError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(CaptionError::media(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| CaptionError::serde(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| CaptionError::media("no video stream found"))?;
    let (Some(width), Some(height)) = (video.width, video.height) else {
        return Err(CaptionError::media("missing video dimensions from ffprobe"));
    };
    let duration_s = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| CaptionError::media("media has no usable duration"))?;

    Ok(MediaInfo {
        width,
        height,
        duration_ms: (duration_s * 1000.0).round() as u64,
        has_audio: parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio")),
    })
}

/// Media file decoded through the system `ffmpeg`.
///
/// `open` probes on a background thread so the pipeline can keep ticking. Frames come from
/// one long-running decoder resampled to the export frame rate; a backwards request
/// restarts it at the new position.
pub struct FfmpegMediaSource {
    path: PathBuf,
    fps: Fps,
    probe: Option<Receiver<CaptionResult<MediaInfo>>>,
    info: Option<MediaInfo>,
    decoder: Option<Decoder>,
}

struct Decoder {
    child: Child,
    stdout: ChildStdout,
    /// Index of the next frame the decoder will produce.
    next: u64,
    last: Option<(u64, FrameRGBA)>,
}

impl std::fmt::Debug for FfmpegMediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegMediaSource")
            .field("path", &self.path)
            .field("fps", &self.fps)
            .field("info", &self.info)
            .finish()
    }
}

impl FfmpegMediaSource {
    /// Source reading `path`, decoded at `fps`.
    pub fn new(path: impl Into<PathBuf>, fps: Fps) -> Self {
        Self {
            path: path.into(),
            fps,
            probe: None,
            info: None,
            decoder: None,
        }
    }

    fn spawn_decoder(&self, info: &MediaInfo, first: u64) -> CaptionResult<Decoder> {
        let start_s = self.fps.frame_to_ms(crate::foundation::core::FrameIndex(first)) / 1000.0;
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{start_s:.6}")])
            .arg("-i")
            .arg(&self.path)
            .args([
                "-map",
                "0:v:0",
                "-r",
                &format!("{}/{}", self.fps.num, self.fps.den),
                "-s",
                &format!("{}x{}", info.width, info.height),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CaptionError::media(format!("failed to spawn ffmpeg decoder: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CaptionError::media("failed to open ffmpeg decoder stdout"))?;
        tracing::debug!(first, path = %self.path.display(), "video decoder started");
        Ok(Decoder {
            child,
            stdout,
            next: first,
            last: None,
        })
    }

    fn stop_decoder(&mut self) {
        if let Some(mut d) = self.decoder.take() {
            let _ = d.child.kill();
            let _ = d.child.wait();
        }
    }
}

impl MediaSource for FfmpegMediaSource {
    fn open(&mut self) -> CaptionResult<()> {
        if !self.path.exists() {
            return Err(CaptionError::media(format!(
                "media file '{}' does not exist",
                self.path.display()
            )));
        }
        let (tx, rx) = mpsc::channel();
        let path = self.path.clone();
        std::thread::spawn(move || {
            let _ = tx.send(probe_media(&path));
        });
        self.probe = Some(rx);
        Ok(())
    }

    fn poll_ready(&mut self) -> LoadStatus {
        if let Some(info) = self.info {
            return LoadStatus::Ready(info);
        }
        let Some(rx) = &self.probe else {
            return LoadStatus::Failed("source not opened".to_string());
        };
        match rx.try_recv() {
            Ok(Ok(info)) => {
                self.info = Some(info);
                self.probe = None;
                LoadStatus::Ready(info)
            }
            Ok(Err(e)) => LoadStatus::Failed(e.to_string()),
            Err(TryRecvError::Empty) => LoadStatus::Pending,
            Err(TryRecvError::Disconnected) => {
                LoadStatus::Failed("media probe thread exited".to_string())
            }
        }
    }

    fn audio_track(&mut self) -> CaptionResult<Option<AudioTrack>> {
        let info = self
            .info
            .ok_or_else(|| CaptionError::media("audio requested before the source was ready"))?;
        Ok(info.has_audio.then(|| AudioTrack {
            path: self.path.clone(),
            stream: 0,
        }))
    }

    fn frame_at(&mut self, t_ms: u64) -> CaptionResult<FrameRGBA> {
        let info = self
            .info
            .ok_or_else(|| CaptionError::media("frame requested before the source was ready"))?;
        let want = self.fps.ms_to_frame_floor(t_ms as f64).0;

        let restart = match &self.decoder {
            Some(d) => d.last.as_ref().map_or(want < d.next, |(i, _)| want < *i),
            None => true,
        };
        if restart {
            self.stop_decoder();
            self.decoder = Some(self.spawn_decoder(&info, want)?);
        }
        let Some(d) = self.decoder.as_mut() else {
            return Err(CaptionError::media("video decoder unavailable"));
        };

        let frame_len = info.width as usize * info.height as usize * 4;
        while d.next <= want {
            let mut buf = vec![0u8; frame_len];
            match d.stdout.read_exact(&mut buf) {
                Ok(()) => {
                    let frame = FrameRGBA::from_straight(info.width, info.height, buf)?;
                    d.last = Some((d.next, frame));
                    d.next += 1;
                }
                // Past the last decodable frame: hold the final picture.
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    return Err(CaptionError::media(format!("video decode failed: {e}")));
                }
            }
        }
        d.last
            .as_ref()
            .map(|(_, f)| f.clone())
            .ok_or_else(|| CaptionError::media(format!("no video frame available at {t_ms} ms")))
    }

    fn close(&mut self) {
        self.stop_decoder();
        self.probe = None;
    }
}

impl Drop for FfmpegMediaSource {
    fn drop(&mut self) {
        self.stop_decoder();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
