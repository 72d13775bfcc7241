use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::source::StillImage;
use crate::captions::overlay::{LayerRole, OverlayLayer, VisibilityWindow, rounded_box};
use crate::foundation::core::{Fps, Point};
use crate::scene::renderer::{AudioTrack, RenderedSceneClip};
use crate::timeline::assemble::assemble;
use crate::timeline::transition::TransitionSpec;

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

fn canvas() -> CanvasSpec {
    CanvasSpec {
        width: 64,
        height: 36,
        fps: Fps::default(),
    }
}

fn clip(index: usize, color: [u8; 4], secs: u64, overlays: Vec<OverlayLayer>) -> RenderedSceneClip {
    let still = StillImage::from_prepared(&PreparedImage::solid(16, 9, color)).unwrap();
    let d = Micros::from_secs(secs);
    RenderedSceneClip::new(
        index,
        Box::new(still),
        &canvas(),
        AudioTrack::silence(d),
        overlays,
        d,
    )
    .unwrap()
}

fn near(px: [u8; 4], want: [u8; 4], tol: i16) -> bool {
    px.iter()
        .zip(want.iter())
        .all(|(a, b)| (i16::from(*a) - i16::from(*b)).abs() <= tol)
}

#[test]
fn single_clip_covers_the_canvas() {
    let mut tl = assemble(vec![clip(0, RED, 2, vec![])], TransitionSpec::cut()).unwrap();
    let mut comp = TimelineCompositor::new(canvas()).unwrap();
    let frame = comp.render_at(&mut tl, Micros::from_secs(1)).unwrap();
    assert_eq!((frame.width, frame.height), (64, 36));
    for (x, y) in [(1, 1), (32, 18), (62, 34)] {
        assert!(near(frame.pixel(x, y).unwrap(), RED, 2), "({x},{y})");
    }
}

#[test]
fn fade_blends_the_incoming_clip() {
    let clips = vec![clip(0, RED, 2, vec![]), clip(1, BLUE, 2, vec![])];
    let mut tl = assemble(clips, TransitionSpec::fade(Micros::from_secs(1))).unwrap();
    let mut comp = TimelineCompositor::new(canvas()).unwrap();

    let before = comp.render_at(&mut tl, Micros::from_millis(500)).unwrap();
    assert!(near(before.pixel(32, 18).unwrap(), RED, 2));

    let mid = comp.render_at(&mut tl, Micros::from_millis(1_500)).unwrap();
    assert!(near(mid.pixel(32, 18).unwrap(), [128, 0, 128, 255], 8));

    let after = comp.render_at(&mut tl, Micros::from_millis(2_500)).unwrap();
    assert!(near(after.pixel(32, 18).unwrap(), BLUE, 2));
}

#[test]
fn slide_enters_from_the_left_without_blending() {
    let clips = vec![clip(0, RED, 2, vec![]), clip(1, BLUE, 2, vec![])];
    let mut tl = assemble(clips, TransitionSpec::slide(Micros::from_secs(1))).unwrap();
    let mut comp = TimelineCompositor::new(canvas()).unwrap();

    let mid = comp.render_at(&mut tl, Micros::from_millis(1_500)).unwrap();
    assert!(near(mid.pixel(8, 18).unwrap(), BLUE, 2));
    assert!(near(mid.pixel(56, 18).unwrap(), RED, 2));

    let start = comp.render_at(&mut tl, Micros::from_secs(1)).unwrap();
    assert!(near(start.pixel(8, 18).unwrap(), RED, 2));
}

#[test]
fn caption_layers_respect_their_window() {
    let window = VisibilityWindow::new(Micros::from_millis(500), Micros::from_secs(1)).unwrap();
    let layer = OverlayLayer::new(
        LayerRole::Background,
        Point::new(10.0, 10.0),
        window,
        rounded_box(20, 10, 0.0, 192).unwrap(),
    );
    let mut tl = assemble(vec![clip(0, RED, 2, vec![layer])], TransitionSpec::cut()).unwrap();
    let mut comp = TimelineCompositor::new(canvas()).unwrap();

    let shade = |comp: &mut TimelineCompositor, tl: &mut Timeline, ms: u64| {
        comp.render_at(tl, Micros::from_millis(ms))
            .unwrap()
            .pixel(20, 15)
            .unwrap()
    };
    assert!(near(shade(&mut comp, &mut tl, 499), RED, 2));
    assert!(near(shade(&mut comp, &mut tl, 500), [63, 0, 0, 255], 3));
    assert!(near(shade(&mut comp, &mut tl, 999), [63, 0, 0, 255], 3));
    assert!(near(shade(&mut comp, &mut tl, 1_000), RED, 2));
}

#[test]
fn instants_past_the_end_render_empty() {
    let mut tl = assemble(vec![clip(0, RED, 1, vec![])], TransitionSpec::cut()).unwrap();
    let mut comp = TimelineCompositor::new(canvas()).unwrap();
    let frame = comp.render_at(&mut tl, Micros::from_secs(1)).unwrap();
    assert_eq!(frame.pixel(32, 18), Some([0, 0, 0, 0]));
}
