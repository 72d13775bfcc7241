use super::*;
use crate::assets::decode::PreparedImage;
use crate::assets::source::StillImage;
use crate::foundation::core::CanvasSpec;
use crate::scene::renderer::AudioTrack;

fn secs(v: &[u64]) -> Vec<Micros> {
    v.iter().map(|s| Micros::from_secs(*s)).collect()
}

fn clip(index: usize, duration: Micros) -> RenderedSceneClip {
    let still = StillImage::from_prepared(&PreparedImage::solid(4, 4, [0, 0, 0, 255])).unwrap();
    RenderedSceneClip::new(
        index,
        Box::new(still),
        &CanvasSpec::landscape(),
        AudioTrack::silence(duration),
        vec![],
        duration,
    )
    .unwrap()
}

#[test]
fn fade_placements_for_10_8_12() {
    let placed = place(&secs(&[10, 8, 12]), &TransitionSpec::fade(Micros::from_secs(1))).unwrap();
    assert_eq!(
        placed,
        vec![
            (Micros::from_secs(0), Micros::from_secs(10)),
            (Micros::from_secs(9), Micros::from_secs(17)),
            (Micros::from_secs(16), Micros::from_secs(28)),
        ]
    );
}

#[test]
fn cut_placements_are_back_to_back() {
    let placed = place(&secs(&[3, 4, 5]), &TransitionSpec::cut()).unwrap();
    assert_eq!(placed[1].0, placed[0].1);
    assert_eq!(placed[2].0, placed[1].1);
    assert_eq!(placed[2].1, Micros::from_secs(12));
}

#[test]
fn zero_overlap_fade_places_like_a_cut() {
    let d = secs(&[3, 4, 5]);
    assert_eq!(
        place(&d, &TransitionSpec::fade(Micros::ZERO)).unwrap(),
        place(&d, &TransitionSpec::cut()).unwrap()
    );
}

#[test]
fn invalid_inputs_are_rejected() {
    assert!(place(&[], &TransitionSpec::cut()).is_err());
    assert!(place(&[Micros::ZERO], &TransitionSpec::cut()).is_err());
    assert!(matches!(
        place(&secs(&[10, 1]), &TransitionSpec::slide(Micros::from_secs(1))),
        Err(ReelError::InvalidTransition { scene: 1, .. })
    ));
}

#[test]
fn assemble_keeps_clip_durations_and_order() {
    let clips = vec![
        clip(0, Micros::from_secs(10)),
        clip(1, Micros::from_secs(8)),
        clip(2, Micros::from_secs(12)),
    ];
    let tl = assemble(clips, TransitionSpec::slide(Micros::from_secs(1))).unwrap();
    assert_eq!(tl.len(), 3);
    assert_eq!(tl.total_duration(), Micros::from_secs(28));
    for (i, p) in tl.clips().iter().enumerate() {
        assert_eq!(p.clip.source_index, i);
        assert_eq!(p.end.0 - p.start.0, p.clip.local_duration.0);
    }
    assert_eq!(
        tl.active_at(Micros::from_millis(9_500)).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_eq!(
        tl.active_at(Micros::from_secs(10)).collect::<Vec<_>>(),
        vec![1]
    );
}

#[test]
fn single_clip_starts_at_zero_for_every_mode() {
    for t in [
        TransitionSpec::cut(),
        TransitionSpec::fade(Micros::from_secs(1)),
        TransitionSpec::slide(Micros::from_millis(300)),
    ] {
        let tl = assemble(vec![clip(0, Micros::from_secs(5))], t).unwrap();
        assert_eq!(tl.len(), 1);
        assert_eq!(tl.clips()[0].start, Micros::ZERO);
        assert_eq!(tl.total_duration(), Micros::from_secs(5));
        assert_eq!(tl.transition_progress(0, Micros::ZERO), None);
    }
}

#[test]
fn single_clip_ignores_an_overlap_longer_than_itself() {
    let tl = assemble(
        vec![clip(0, Micros::from_millis(800))],
        TransitionSpec::fade(Micros::from_secs(1)),
    )
    .unwrap();
    assert_eq!(tl.total_duration(), Micros::from_millis(800));
}

#[test]
fn transition_progress_ramps_over_the_head_overlap() {
    let clips = vec![clip(0, Micros::from_secs(4)), clip(1, Micros::from_secs(4))];
    let tl = assemble(clips, TransitionSpec::fade(Micros::from_secs(2))).unwrap();
    assert_eq!(tl.clips()[1].start, Micros::from_secs(2));
    assert_eq!(tl.transition_progress(1, Micros::from_secs(2)), Some(0.0));
    assert_eq!(tl.transition_progress(1, Micros::from_secs(3)), Some(0.5));
    assert_eq!(tl.transition_progress(1, Micros::from_secs(4)), None);
    assert_eq!(tl.transition_progress(1, Micros::from_secs(1)), None);
}
