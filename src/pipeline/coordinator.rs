use rayon::prelude::*;

use crate::encode::timeline::{FinalOutput, TimelineSink};
use crate::foundation::core::Micros;
use crate::foundation::error::{ReelError, ReelResult};
use crate::pipeline::job::ComposeJob;
use crate::scene::model::{Scene, validate_captions};
use crate::scene::renderer::{RenderedSceneClip, SceneRenderer};
use crate::timeline::assemble::assemble;

/// Threading options for per-scene work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderThreading {
    /// Render scenes on a rayon pool.
    pub parallel: bool,
    /// Pool size; `None` lets rayon pick.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

impl RenderThreading {
    /// Single-threaded, in scene order.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            threads: None,
        }
    }
}

/// Build the rayon pool used for one job.
pub fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ReelError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

/// Run `f` for every index, on `pool` when given; results keep input order.
///
/// The first error wins and no partial result is returned.
fn for_each_scene<T, F>(pool: Option<&rayon::ThreadPool>, count: usize, f: F) -> ReelResult<Vec<T>>
where
    T: Send,
    F: Fn(usize) -> ReelResult<T> + Sync + Send,
{
    match pool {
        Some(pool) => pool.install(|| (0..count).into_par_iter().map(&f).collect()),
        None => (0..count).map(f).collect(),
    }
}

/// Compose a job into one output file.
///
/// Order of checks: input cardinality, canvas and caption style, probed scene durations,
/// transition overlap and caption segments. No scene renders before all of them pass. Scenes then
/// render independently, the timeline is assembled once every render succeeded, and the sink
/// encodes it. Sink failures surface as [`ReelError::Encode`].
#[tracing::instrument(level = "info", skip_all, fields(scenes = job.scene_count()))]
pub fn compose(
    job: &ComposeJob,
    renderer: &dyn SceneRenderer,
    sink: &mut dyn TimelineSink,
    threading: &RenderThreading,
) -> ReelResult<FinalOutput> {
    job.validate()?;
    let pool = if threading.parallel {
        Some(build_thread_pool(threading.threads)?)
    } else {
        None
    };

    let durations: Vec<Micros> = for_each_scene(pool.as_ref(), job.scene_count(), |i| {
        renderer.probe_duration(i, &job.assets[i], &job.audio_paths[i])
    })?;
    tracing::debug!(?durations, "scene durations probed");

    job.transition.validate_against(&durations)?;
    let scenes = job.scenes(&durations)?;
    for scene in &scenes {
        validate_captions(scene.index, &scene.captions, scene.local_duration)?;
    }

    let clips: Vec<RenderedSceneClip> = for_each_scene(pool.as_ref(), scenes.len(), |i| {
        let scene: &Scene = &scenes[i];
        renderer.render_scene(scene, &job.canvas, &job.caption_style)
    })?;
    drop(scenes);
    tracing::info!(clips = clips.len(), "all scenes rendered");

    let timeline = assemble(clips, job.transition)?;
    let output = sink
        .encode(timeline, &job.canvas)
        .map_err(ReelError::encode)?;
    tracing::info!(
        path = %output.path.display(),
        total = %output.total_duration,
        "composition written"
    );
    Ok(output)
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/coordinator.rs"]
mod tests;
