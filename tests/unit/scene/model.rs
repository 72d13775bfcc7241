use super::*;

fn seg(start_ms: u64, end_ms: u64) -> CaptionSegment {
    CaptionSegment {
        start: Micros::from_millis(start_ms),
        end: Micros::from_millis(end_ms),
        text: "x".to_owned(),
    }
}

#[test]
fn segments_deserialize_from_seconds() {
    let s: CaptionSegment =
        serde_json::from_str(r#"{"start": 0.5, "end": 2.25, "text": "hi"}"#).unwrap();
    assert_eq!(s.start, Micros(500_000));
    assert_eq!(s.end, Micros(2_250_000));
    assert!(
        serde_json::from_str::<CaptionSegment>(r#"{"start": -1, "end": 2, "text": "x"}"#)
            .is_err()
    );
}

#[test]
fn asset_kinds_parse_lowercase_and_aliases() {
    let a: SceneAsset = serde_json::from_str(r#"{"kind": "image", "path": "a.png"}"#).unwrap();
    assert_eq!(a, SceneAsset::image("a.png"));
    let v: SceneAsset = serde_json::from_str(r#"{"kind": "clip", "path": "v.mp4"}"#).unwrap();
    assert_eq!(v.kind, AssetKind::Video);
}

#[test]
fn local_duration_rules() {
    let audio = Micros::from_secs(5);
    assert_eq!(
        derive_local_duration(AssetKind::Image, audio, Some(Micros::from_secs(9))),
        audio
    );
    assert_eq!(
        derive_local_duration(AssetKind::Video, audio, Some(Micros::from_secs(9))),
        Micros::from_secs(9)
    );
    assert_eq!(
        derive_local_duration(AssetKind::Video, audio, Some(Micros::from_secs(2))),
        audio
    );
    assert_eq!(derive_local_duration(AssetKind::Video, audio, None), audio);
}

#[test]
fn valid_transcript_passes_and_clamps_the_tail() {
    let out = validate_captions(
        3,
        &[seg(0, 1_000), seg(1_000, 2_000), seg(2_500, 9_000)],
        Micros::from_secs(4),
    )
    .unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(out[2].end, Micros::from_secs(4));
    assert_eq!(out[1], seg(1_000, 2_000));
}

#[test]
fn malformed_transcripts_name_scene_and_segment() {
    let d = Micros::from_secs(10);

    let err = validate_captions(2, &[seg(0, 1_000), seg(1_500, 1_500)], d).unwrap_err();
    assert!(matches!(
        err,
        ReelError::CaptionOverlay {
            scene: 2,
            segment: 1,
            ..
        }
    ));

    let err = validate_captions(0, &[seg(0, 2_000), seg(1_000, 3_000)], d).unwrap_err();
    assert!(err.to_string().contains("segment 1"));

    let err = validate_captions(0, &[seg(3_000, 4_000), seg(1_000, 2_000)], d).unwrap_err();
    assert_eq!(err.scene_index(), Some(0));

    assert!(validate_captions(0, &[seg(10_000, 11_000)], d).is_err());
    assert!(validate_captions(0, &[], d).unwrap().is_empty());
}
