use super::*;
use crate::encode::profile::{ExportQuality, select_profile};
use crate::encode::sink::EncoderConfig;
use crate::foundation::core::{Canvas, Fps};

const LISTING: &str = "Encoders:
 V..... = Video
 A..... = Audio
 ------
 V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC / MPEG-4 part 10 (codec h264)
 V....D libvpx-vp9           libvpx VP9 (codec vp9)
 A....D aac                  AAC (Advanced Audio Coding)
";

#[test]
fn listing_is_parsed() {
    let caps = FfmpegEncoderCaps::from_listing(LISTING);
    assert!(caps.has("libx264"));
    assert!(caps.has("libvpx-vp9"));
    assert!(caps.has("aac"));
    assert!(!caps.has("="));
    assert!(!caps.has("libopus"));
}

#[test]
fn webm_without_opus_is_unsupported_but_mp4_works() {
    let caps = FfmpegEncoderCaps::from_listing(LISTING);
    assert!(select_profile(&caps, ExportFormat::Webm, ExportQuality::High).is_none());
    let p = select_profile(&caps, ExportFormat::Mp4, ExportQuality::High).unwrap();
    assert_eq!(caps.resolve(&p.codec), Some(("libx264", "aac")));
}

#[test]
fn webm_never_muxes_h264() {
    let caps = FfmpegEncoderCaps::from_listing(&format!("{LISTING} A....D libopus  Opus\n"));
    let h264_webm = CodecProfile {
        format: ExportFormat::Webm,
        video: Some(VideoCodec::H264),
        audio: Some(AudioCodec::Opus),
    };
    assert!(!caps.supports(ExportFormat::Webm, &h264_webm));
    let p = select_profile(&caps, ExportFormat::Webm, ExportQuality::Low).unwrap();
    assert_eq!(p.codec.video, Some(VideoCodec::Vp9));
}

#[test]
fn encodes_a_short_mp4_when_ffmpeg_is_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let caps = FfmpegEncoderCaps::probe();
    let Some(profile) = select_profile(&caps, ExportFormat::Mp4, ExportQuality::Low) else {
        return;
    };
    let mut sink = FfmpegSink::new(caps);
    sink.begin(EncoderConfig {
        width: 16,
        height: 16,
        fps: Fps::new(10, 1).unwrap(),
        profile,
        audio: None,
        bg_rgba: [0, 0, 0, 255],
    })
    .unwrap();
    let frame = FrameRGBA::solid(
        Canvas {
            width: 16,
            height: 16,
        },
        [200, 10, 10, 255],
    );
    for i in 0..5 {
        sink.push_frame(FrameIndex(i), &frame).unwrap();
    }
    assert!(sink.push_frame(FrameIndex(2), &frame).is_err());
    let mut bytes: Vec<u8> = sink.take_chunks().unwrap().concat();
    bytes.extend(sink.finish().unwrap().concat());
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[4..8], b"ftyp");
}

#[test]
fn odd_sizes_are_rejected_before_spawning() {
    let caps = FfmpegEncoderCaps::from_listing(LISTING);
    let profile = select_profile(&caps, ExportFormat::Mp4, ExportQuality::Low).unwrap();
    let mut sink = FfmpegSink::new(caps);
    let err = sink
        .begin(EncoderConfig {
            width: 15,
            height: 16,
            fps: Fps::default(),
            profile,
            audio: None,
            bg_rgba: [0, 0, 0, 255],
        })
        .unwrap_err();
    assert!(err.to_string().contains("even"));
}
