use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::source::StillImage;
use crate::captions::overlay::CaptionStyle;
use crate::encode::timeline::InMemoryTimelineSink;
use crate::foundation::core::{CanvasSpec, Fps};
use crate::scene::model::{CaptionSegment, SceneAsset};
use crate::scene::renderer::AudioTrack;
use crate::timeline::assemble::Timeline;
use crate::timeline::transition::TransitionSpec;

struct FakeRenderer {
    durations: Vec<Micros>,
    fail_scene: Option<usize>,
    probes: AtomicUsize,
    renders: AtomicUsize,
}

impl FakeRenderer {
    fn new(secs: &[u64]) -> Self {
        Self {
            durations: secs.iter().map(|s| Micros::from_secs(*s)).collect(),
            fail_scene: None,
            probes: AtomicUsize::new(0),
            renders: AtomicUsize::new(0),
        }
    }
}

impl SceneRenderer for FakeRenderer {
    fn probe_duration(&self, scene: usize, _: &SceneAsset, _: &Path) -> ReelResult<Micros> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.durations[scene])
    }

    fn render_scene(
        &self,
        scene: &Scene,
        canvas: &CanvasSpec,
        _style: &CaptionStyle,
    ) -> ReelResult<RenderedSceneClip> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.fail_scene == Some(scene.index) {
            return Err(ReelError::asset_decode(
                scene.index,
                scene.asset.path.clone(),
                anyhow::anyhow!("corrupt"),
            ));
        }
        let still = StillImage::from_prepared(&PreparedImage::solid(8, 8, [9, 9, 9, 255]))?;
        RenderedSceneClip::new(
            scene.index,
            Box::new(still),
            canvas,
            AudioTrack::silence(scene.local_duration),
            vec![],
            scene.local_duration,
        )
    }
}

struct FailingSink;

impl TimelineSink for FailingSink {
    fn encode(&mut self, _: Timeline, _: &CanvasSpec) -> ReelResult<FinalOutput> {
        Err(ReelError::evaluation("disk full"))
    }
}

fn job(n: usize, transition: TransitionSpec) -> ComposeJob {
    ComposeJob {
        canvas: CanvasSpec {
            width: 32,
            height: 18,
            fps: Fps::new(2, 1).unwrap(),
        },
        transition,
        caption_style: CaptionStyle::default(),
        assets: (0..n)
            .map(|i| SceneAsset::image(format!("s{i}.png")))
            .collect(),
        audio_paths: (0..n).map(|i| PathBuf::from(format!("a{i}.mp3"))).collect(),
        transcripts: vec![Vec::new(); n],
        output: PathBuf::from("out.mp4"),
    }
}

#[test]
fn thread_pool_rejects_zero_threads() {
    assert!(build_thread_pool(Some(0)).is_err());
    assert_eq!(build_thread_pool(Some(2)).unwrap().current_num_threads(), 2);
}

#[test]
fn cardinality_mismatch_renders_nothing() {
    let mut j = job(5, TransitionSpec::default());
    j.audio_paths.pop();
    let renderer = FakeRenderer::new(&[1, 1, 1, 1, 1]);
    let err = compose(
        &j,
        &renderer,
        &mut InMemoryTimelineSink::new(),
        &RenderThreading::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ReelError::InputCardinality {
            scenes: 5,
            audio: 4,
            transcripts: 5
        }
    ));
    assert_eq!(renderer.probes.load(Ordering::SeqCst), 0);
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
}

#[test]
fn invalid_overlap_is_caught_before_rendering() {
    let renderer = FakeRenderer::new(&[10, 2, 12]);
    let err = compose(
        &job(3, TransitionSpec::fade(Micros::from_secs(2))),
        &renderer,
        &mut InMemoryTimelineSink::new(),
        &RenderThreading::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::InvalidTransition { scene: 1, .. }));
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
}

#[test]
fn bad_caption_is_caught_before_rendering() {
    let mut j = job(2, TransitionSpec::cut());
    j.transcripts[1] = vec![CaptionSegment {
        start: Micros::from_secs(5),
        end: Micros::from_secs(6),
        text: "too late".to_owned(),
    }];
    let renderer = FakeRenderer::new(&[3, 3]);
    let err = compose(
        &j,
        &renderer,
        &mut InMemoryTimelineSink::new(),
        &RenderThreading::sequential(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ReelError::CaptionOverlay {
            scene: 1,
            segment: 0,
            ..
        }
    ));
    assert_eq!(renderer.renders.load(Ordering::SeqCst), 0);
}

#[test]
fn successful_job_assembles_in_scene_order() {
    for threading in [RenderThreading::default(), RenderThreading::sequential()] {
        let renderer = FakeRenderer::new(&[10, 8, 12]);
        let mut sink = InMemoryTimelineSink::new();
        let out = compose(
            &job(3, TransitionSpec::fade(Micros::from_secs(1))),
            &renderer,
            &mut sink,
            &threading,
        )
        .unwrap();
        assert_eq!(out.total_duration, Micros::from_secs(28));
        assert_eq!(renderer.renders.load(Ordering::SeqCst), 3);
        assert_eq!(sink.frames.frames().len(), 56);
    }
}

#[test]
fn failed_scene_aborts_before_encode() {
    let mut renderer = FakeRenderer::new(&[2, 2, 2]);
    renderer.fail_scene = Some(1);
    let mut sink = InMemoryTimelineSink::new();
    let err = compose(
        &job(3, TransitionSpec::cut()),
        &renderer,
        &mut sink,
        &RenderThreading::default(),
    )
    .unwrap_err();
    assert_eq!(err.scene_index(), Some(1));
    assert!(sink.frames.frames().is_empty());
}

#[test]
fn sink_failures_become_encode_errors() {
    let renderer = FakeRenderer::new(&[1]);
    let err = compose(
        &job(1, TransitionSpec::cut()),
        &renderer,
        &mut FailingSink,
        &RenderThreading::sequential(),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Encode { .. }));
    assert!(err.to_string().contains("disk full"));
}
