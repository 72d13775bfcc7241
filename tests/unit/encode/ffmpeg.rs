use super::*;
use crate::encode::sink::AudioInputConfig;
use crate::foundation::core::Fps;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::default(),
        audio: None,
    }
}

#[test]
fn odd_or_empty_sizes_are_rejected() {
    assert!(validate_sink_config(&cfg(64, 36)).is_ok());
    assert!(validate_sink_config(&cfg(63, 36)).is_err());
    assert!(validate_sink_config(&cfg(0, 36)).is_err());
}

#[test]
fn audio_input_must_be_well_formed() {
    let mut c = cfg(64, 36);
    c.audio = Some(AudioInputConfig {
        path: PathBuf::from("mix.f32le"),
        sample_rate: 0,
        channels: 2,
    });
    assert!(validate_sink_config(&c).is_err());
}

#[test]
fn command_line_carries_rate_size_and_audio() {
    let mut c = cfg(64, 36);
    c.audio = Some(AudioInputConfig {
        path: PathBuf::from("mix.f32le"),
        sample_rate: 48_000,
        channels: 2,
    });
    let cmd = ffmpeg_command(&c, &FfmpegSinkOpts::new("out.mp4"));
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    let joined = args.join(" ");
    assert!(joined.contains("-s 64x36"));
    assert!(joined.contains("-r 24/1"));
    assert!(joined.contains("-ar 48000 -ac 2 -i mix.f32le"));
    assert!(joined.contains("-c:a aac"));
    assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.end().is_err());
}
