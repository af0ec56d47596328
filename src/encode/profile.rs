use crate::foundation::error::{CaptionError, CaptionResult};
use serde::{Deserialize, Serialize};

/// Export container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// WebM (VP9/Opus preferred).
    #[default]
    Webm,
    /// MP4 (H.264/AAC preferred).
    Mp4,
}

impl ExportFormat {
    /// Container MIME type without codec parameters.
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Webm => "video/webm",
            ExportFormat::Mp4 => "video/mp4",
        }
    }

    /// Conventional file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Webm => "webm",
            ExportFormat::Mp4 => "mp4",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = CaptionError;

    fn from_str(s: &str) -> CaptionResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webm" => Ok(ExportFormat::Webm),
            "mp4" => Ok(ExportFormat::Mp4),
            other => Err(CaptionError::validation(format!(
                "unknown export format '{other}' (expected webm or mp4)"
            ))),
        }
    }
}

/// Export quality tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportQuality {
    /// 8 Mbps video, 128 kbps audio.
    #[default]
    High,
    /// 4 Mbps video, 96 kbps audio.
    Medium,
    /// 2 Mbps video, 64 kbps audio.
    Low,
}

impl ExportQuality {
    /// Target video bitrate in bits per second.
    pub fn video_bitrate_bps(self) -> u32 {
        match self {
            ExportQuality::High => 8_000_000,
            ExportQuality::Medium => 4_000_000,
            ExportQuality::Low => 2_000_000,
        }
    }

    /// Target audio bitrate in bits per second.
    pub fn audio_bitrate_bps(self) -> u32 {
        match self {
            ExportQuality::High => 128_000,
            ExportQuality::Medium => 96_000,
            ExportQuality::Low => 64_000,
        }
    }
}

impl std::fmt::Display for ExportQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ExportQuality::High => "high",
            ExportQuality::Medium => "medium",
            ExportQuality::Low => "low",
        })
    }
}

impl std::str::FromStr for ExportQuality {
    type Err = CaptionError;

    fn from_str(s: &str) -> CaptionResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(ExportQuality::High),
            "medium" => Ok(ExportQuality::Medium),
            "low" => Ok(ExportQuality::Low),
            other => Err(CaptionError::validation(format!(
                "unknown export quality '{other}' (expected high, medium or low)"
            ))),
        }
    }
}

/// Video codec named in a codec profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// VP9.
    Vp9,
    /// H.264 / AVC.
    H264,
}

/// Audio codec named in a codec profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    /// Opus.
    Opus,
    /// AAC.
    Aac,
}

/// Container plus optional explicit codecs. No codecs means "container defaults".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CodecProfile {
    /// Container.
    pub format: ExportFormat,
    /// Explicit video codec.
    pub video: Option<VideoCodec>,
    /// Explicit audio codec.
    pub audio: Option<AudioCodec>,
}

impl CodecProfile {
    /// Profile with container-default codecs.
    pub fn plain(format: ExportFormat) -> Self {
        Self {
            format,
            video: None,
            audio: None,
        }
    }

    /// MIME string, e.g. `video/webm;codecs=vp9,opus`.
    pub fn mime(&self) -> String {
        let mut codecs = Vec::new();
        if let Some(v) = self.video {
            codecs.push(match v {
                VideoCodec::Vp9 => "vp9",
                VideoCodec::H264 => "h264",
            });
        }
        if let Some(a) = self.audio {
            codecs.push(match a {
                AudioCodec::Opus => "opus",
                AudioCodec::Aac => "aac",
            });
        }
        if codecs.is_empty() {
            self.format.mime().to_string()
        } else {
            format!("{};codecs={}", self.format.mime(), codecs.join(","))
        }
    }
}

/// A codec profile plus bitrate hints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderProfile {
    /// Container and codecs.
    pub codec: CodecProfile,
    /// Video bitrate hint; absent for container-default profiles.
    pub video_bitrate_bps: Option<u32>,
    /// Audio bitrate hint; absent for container-default profiles.
    pub audio_bitrate_bps: Option<u32>,
}

/// Encoder capability query.
pub trait EncoderCaps {
    /// Return `true` when `profile` can be encoded into `format`.
    fn supports(&self, format: ExportFormat, profile: &CodecProfile) -> bool;
}

/// Candidate profiles for `(format, quality)`, most preferred first.
///
/// WebM tries VP9/Opus, then H.264/Opus, then the bare container; MP4 tries H.264/AAC,
/// then the bare container. Bare containers carry no bitrate hints.
pub fn candidate_profiles(format: ExportFormat, quality: ExportQuality) -> Vec<EncoderProfile> {
    let explicit: &[(VideoCodec, AudioCodec)] = match format {
        ExportFormat::Webm => &[
            (VideoCodec::Vp9, AudioCodec::Opus),
            (VideoCodec::H264, AudioCodec::Opus),
        ],
        ExportFormat::Mp4 => &[(VideoCodec::H264, AudioCodec::Aac)],
    };
    let mut out: Vec<EncoderProfile> = explicit
        .iter()
        .map(|&(v, a)| EncoderProfile {
            codec: CodecProfile {
                format,
                video: Some(v),
                audio: Some(a),
            },
            video_bitrate_bps: Some(quality.video_bitrate_bps()),
            audio_bitrate_bps: Some(quality.audio_bitrate_bps()),
        })
        .collect();
    out.push(EncoderProfile {
        codec: CodecProfile::plain(format),
        video_bitrate_bps: None,
        audio_bitrate_bps: None,
    });
    out
}

/// First supported candidate for `(format, quality)`.
pub fn select_profile(
    caps: &dyn EncoderCaps,
    format: ExportFormat,
    quality: ExportQuality,
) -> Option<EncoderProfile> {
    candidate_profiles(format, quality)
        .into_iter()
        .find(|p| caps.supports(format, &p.codec))
}

/// Fixed capability table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticEncoderCaps {
    supported: Vec<CodecProfile>,
}

impl StaticEncoderCaps {
    /// Support exactly `profiles`.
    pub fn new(profiles: impl IntoIterator<Item = CodecProfile>) -> Self {
        Self {
            supported: profiles.into_iter().collect(),
        }
    }

    /// Support every candidate profile of both containers.
    pub fn all() -> Self {
        Self::new(
            [ExportFormat::Webm, ExportFormat::Mp4]
                .into_iter()
                .flat_map(|f| candidate_profiles(f, ExportQuality::High))
                .map(|p| p.codec),
        )
    }

    /// Support nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Copy of `self` with every profile of `format` removed.
    pub fn without(mut self, format: ExportFormat) -> Self {
        self.supported.retain(|p| p.format != format);
        self
    }
}

impl EncoderCaps for StaticEncoderCaps {
    fn supports(&self, format: ExportFormat, profile: &CodecProfile) -> bool {
        profile.format == format && self.supported.contains(profile)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/profile.rs"]
mod tests;
