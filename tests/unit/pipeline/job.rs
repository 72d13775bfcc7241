use super::*;
use crate::timeline::transition::TransitionMode;

const JOB: &str = r#"{
  "canvas": "portrait",
  "transition": {"mode": "slide", "overlap_secs": 0.5},
  "caption_style": {"font_size": 36},
  "assets": [
    {"kind": "image", "path": "scene0.png"},
    {"kind": "video", "path": "/abs/scene1.mp4"}
  ],
  "audio_paths": ["a0.mp3", "a1.mp3"],
  "transcripts": [
    [{"start": 0.0, "end": 1.5, "text": "Hello"}],
    []
  ],
  "output": "out/final.mp4"
}"#;

#[test]
fn job_json_parses_with_presets_and_defaults() {
    let job = ComposeJob::from_json_str(JOB).unwrap();
    assert_eq!(job.canvas, CanvasSpec::portrait());
    assert_eq!(job.transition.mode, TransitionMode::Slide);
    assert_eq!(job.transition.overlap, Micros::from_millis(500));
    assert_eq!(job.caption_style.font_size, 36.0);
    assert_eq!(job.caption_style.box_width, 400);
    assert_eq!(job.scene_count(), 2);
    job.validate().unwrap();
}

#[test]
fn canvas_accepts_explicit_objects_and_rejects_unknown_presets() {
    let job = ComposeJob::from_json_str(
        &JOB.replace(r#""portrait""#, r#"{"width": 640, "height": 360, "fps": {"num": 30, "den": 1}}"#),
    )
    .unwrap();
    assert_eq!((job.canvas.width, job.canvas.height), (640, 360));
    assert_eq!(job.canvas.fps.num, 30);

    assert!(ComposeJob::from_json_str(&JOB.replace(r#""portrait""#, r#""diagonal""#)).is_err());
    assert!(matches!(
        ComposeJob::from_json_str("{"),
        Err(ReelError::Serde(_))
    ));
}

#[test]
fn relative_paths_resolve_against_the_job_file() {
    let dir = std::env::temp_dir().join(format!("storyreel_job_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("job.json");
    std::fs::write(&path, JOB).unwrap();

    let job = ComposeJob::from_path(&path).unwrap();
    assert_eq!(job.assets[0].path, dir.join("scene0.png"));
    assert_eq!(job.assets[1].path, PathBuf::from("/abs/scene1.mp4"));
    assert_eq!(job.audio_paths[1], dir.join("a1.mp3"));
    assert_eq!(job.output, dir.join("out/final.mp4"));
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn cardinality_mismatch_is_reported_with_counts() {
    let mut job = ComposeJob::from_json_str(JOB).unwrap();
    job.audio_paths.pop();
    match job.check_cardinality() {
        Err(ReelError::InputCardinality {
            scenes,
            audio,
            transcripts,
        }) => assert_eq!((scenes, audio, transcripts), (2, 1, 2)),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(job.scenes(&[Micros::from_secs(1), Micros::from_secs(1)]).is_err());
}

#[test]
fn scenes_zip_inputs_in_order() {
    let job = ComposeJob::from_json_str(JOB).unwrap();
    let scenes = job
        .scenes(&[Micros::from_secs(3), Micros::from_secs(4)])
        .unwrap();
    assert_eq!(scenes.len(), 2);
    assert_eq!(scenes[1].index, 1);
    assert_eq!(scenes[1].local_duration, Micros::from_secs(4));
    assert_eq!(scenes[0].captions[0].text, "Hello");
    assert!(job.scenes(&[Micros::from_secs(3)]).is_err());
}
