use std::io::Cursor;
use std::path::PathBuf;

use super::*;
use crate::assets::decode::PreparedImage;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "storyreel_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 80, 120, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

fn still(width: u32, height: u32) -> Box<dyn VisualSource> {
    Box::new(
        StillImage::from_prepared(&PreparedImage::solid(width, height, [1, 2, 3, 255])).unwrap(),
    )
}

#[test]
fn cover_fit_800x600_into_1080p() {
    let fit = CoverFit::new(800, 600, &CanvasSpec::landscape()).unwrap();
    assert!((fit.scale - 2.4).abs() < 1e-12);
    let (w, h) = fit.scaled_size();
    assert!((w - 1920.0).abs() < 1e-9);
    assert!((h - 1440.0).abs() < 1e-9);
    let crop = fit.crop_origin();
    assert!(crop.x.abs() < 1e-9);
    assert!((crop.y - 180.0).abs() < 1e-9);
}

#[test]
fn cover_fit_never_letterboxes_portrait() {
    let fit = CoverFit::new(1920, 1080, &CanvasSpec::portrait()).unwrap();
    let (w, h) = fit.scaled_size();
    assert!(w >= 1080.0 - 1e-9 && h >= 1920.0 - 1e-9);
    assert!(CoverFit::new(0, 10, &CanvasSpec::portrait()).is_err());
}

#[test]
fn zoom_grows_linearly_and_keeps_the_center() {
    let fit = CoverFit::new(800, 600, &CanvasSpec::landscape()).unwrap();
    assert!((fit.scale_at(Micros::from_secs(10)) - 2.4 * 1.2).abs() < 1e-12);

    let at0 = fit.transform_at(Micros::ZERO);
    let origin = at0 * Point::new(0.0, 0.0);
    assert!(origin.x.abs() < 1e-9);
    assert!((origin.y + 180.0).abs() < 1e-9);

    for secs in [0, 3, 7] {
        let center = fit.transform_at(Micros::from_secs(secs)) * Point::new(400.0, 300.0);
        assert!((center.x - 960.0).abs() < 1e-9);
        assert!((center.y - 540.0).abs() < 1e-9);
    }
}

#[test]
fn audio_track_is_padded_or_truncated() {
    let pcm = |frames: usize| AudioPcm {
        sample_rate: MIX_SAMPLE_RATE,
        channels: 2,
        interleaved_f32: vec![0.25; frames * 2],
    };
    let padded = AudioTrack::fitted(pcm(1_000), Micros::from_secs(1));
    assert_eq!(padded.frame_count(), MIX_SAMPLE_RATE as usize);
    assert_eq!(padded.samples[0], 0.25);
    assert_eq!(*padded.samples.last().unwrap(), 0.0);

    let truncated = AudioTrack::fitted(pcm(96_000), Micros::from_millis(500));
    assert_eq!(truncated.frame_count(), 24_000);

    assert!(
        AudioTrack::silence(Micros::from_secs(2))
            .samples
            .iter()
            .all(|s| *s == 0.0)
    );
}

#[test]
fn clip_construction_pins_duration() {
    let canvas = CanvasSpec::landscape();
    let d = Micros::from_secs(3);
    let mut clip =
        RenderedSceneClip::new(4, still(800, 600), &canvas, AudioTrack::silence(d), vec![], d)
            .unwrap();
    assert_eq!(clip.local_duration, d);
    assert_eq!(clip.visual.duration(), d);
    assert_eq!(clip.source_index, 4);
    clip.visual.frame_at(Micros::from_secs(60)).unwrap();
    assert_eq!(clip.visible_overlays(Micros::ZERO).count(), 0);

    assert!(
        RenderedSceneClip::new(
            0,
            still(8, 8),
            &canvas,
            AudioTrack::silence(Micros::ZERO),
            vec![],
            Micros::ZERO
        )
        .is_err()
    );
}

fn scene(dir: &Path, asset: SceneAsset) -> Scene {
    Scene {
        index: 2,
        asset,
        audio_path: dir.join("missing.mp3"),
        captions: vec![],
        local_duration: Micros::from_secs(2),
    }
}

#[test]
fn unreadable_asset_is_an_asset_decode_error() {
    let dir = temp_dir("render_bad_asset");
    let bad = dir.join("broken.png");
    std::fs::write(&bad, b"not a png").unwrap();

    let err = render_scene(
        &scene(&dir, SceneAsset::image(&bad)),
        &CanvasSpec::landscape(),
        &CaptionStyle::default(),
    )
    .unwrap_err();
    match err {
        ReelError::AssetDecode { scene, path, .. } => {
            assert_eq!(scene, 2);
            assert_eq!(path, bad);
        }
        other => panic!("unexpected error: {other}"),
    }
    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn missing_audio_is_an_audio_decode_error() {
    let dir = temp_dir("render_bad_audio");
    let png = dir.join("ok.png");
    write_png(&png, 16, 9);

    let err = render_scene(
        &scene(&dir, SceneAsset::image(&png)),
        &CanvasSpec::landscape(),
        &CaptionStyle::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::AudioDecode { scene: 2, .. }), "{err}");

    let err = MediaSceneRenderer
        .probe_duration(2, &SceneAsset::image(&png), &dir.join("missing.mp3"))
        .unwrap_err();
    assert!(matches!(err, ReelError::AudioDecode { scene: 2, .. }), "{err}");
    let _ = std::fs::remove_dir_all(dir);
}
