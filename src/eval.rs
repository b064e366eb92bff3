use std::collections::HashMap;

use crate::{
    animator::AnimatorState,
    foundation::core::Millis,
    model::{AnimDirective, Document},
};

pub const DEFAULT_DIM_OPACITY: f64 = 0.35;
pub const DEFAULT_BLINK_LOW: f64 = 0.25;

/// Opacities used when shading shapes that are not fresh in the current step.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EvalOpts {
    pub dim_opacity: f64,
    pub blink_low: f64, // multiplier during the "off" phase of a blink
}

impl Default for EvalOpts {
    fn default() -> Self {
        Self {
            dim_opacity: DEFAULT_DIM_OPACITY,
            blink_low: DEFAULT_BLINK_LOW,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneFrame {
    pub step_idx: usize,
    pub step_id: Option<String>,
    pub step_name: Option<String>,
    pub t01: f64,
    pub shapes: Vec<ShapeFrame>,
}

impl SceneFrame {
    pub fn shape(&self, id: &str) -> Option<&ShapeFrame> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn visible_ids(&self) -> impl Iterator<Item = &str> {
        self.shapes
            .iter()
            .filter(|s| s.visible)
            .map(|s| s.id.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ShapeFrame {
    pub id: String,
    pub visible: bool,
    pub fresh: bool,
    pub blinking: bool,
    pub opacity: f64,
}

/// Step window of one shape: visible for `first <= idx < last`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Span {
    first: usize,
    last: Option<usize>,
}

impl Span {
    fn contains(&self, idx: usize) -> bool {
        idx >= self.first && self.last.is_none_or(|l| idx < l)
    }
}

struct BlinkCue {
    times: u32,
    interval: Millis,
}

/// Resolves a [`Document`] into per-shape visuals for a playback state.
///
/// Only the first `appear`, first `disappear` and, per step, first `blink`
/// of a shape count. Shapes without an `appear` are visible from step 0;
/// directives naming unknown steps are ignored.
pub struct Evaluator<'a> {
    doc: &'a Document,
    opts: EvalOpts,
    spans: HashMap<&'a str, Span>,
    blinks: HashMap<(&'a str, usize), BlinkCue>,
}

impl<'a> Evaluator<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self::with_opts(doc, EvalOpts::default())
    }

    pub fn with_opts(doc: &'a Document, opts: EvalOpts) -> Self {
        let mut appear: HashMap<&str, usize> = HashMap::new();
        let mut disappear: HashMap<&str, usize> = HashMap::new();
        let mut blinks = HashMap::new();

        for anim in &doc.anims {
            let Some(idx) = doc.step_index(anim.step_id()) else {
                tracing::trace!(step = anim.step_id(), "directive names unknown step");
                continue;
            };
            match anim {
                AnimDirective::Appear { id, .. } => {
                    appear.entry(id.as_str()).or_insert(idx);
                }
                AnimDirective::Disappear { id, .. } => {
                    disappear.entry(id.as_str()).or_insert(idx);
                }
                AnimDirective::Blink {
                    id,
                    times,
                    interval,
                    ..
                } => {
                    blinks.entry((id.as_str(), idx)).or_insert(BlinkCue {
                        times: *times,
                        interval: *interval,
                    });
                }
            }
        }

        let spans = doc
            .shapes
            .iter()
            .map(|s| {
                let id = s.id();
                let span = Span {
                    first: appear.get(id).copied().unwrap_or(0),
                    last: disappear.get(id).copied(),
                };
                (id, span)
            })
            .collect();

        Self {
            doc,
            opts,
            spans,
            blinks,
        }
    }

    pub fn opts(&self) -> &EvalOpts {
        &self.opts
    }

    /// Evaluates the scene at step `idx` with `step_elapsed_ms` into the step.
    #[tracing::instrument(skip(self), fields(shapes = self.doc.shapes.len()))]
    pub fn eval(&self, idx: usize, t01: f64, step_elapsed_ms: Millis) -> SceneFrame {
        let step = self.doc.steps.get(idx);
        let shapes = self
            .doc
            .shapes
            .iter()
            .map(|s| self.eval_shape(s.id(), idx, step_elapsed_ms))
            .collect();
        SceneFrame {
            step_idx: idx,
            step_id: step.map(|s| s.id.clone()),
            step_name: step.map(|s| s.name.clone()),
            t01,
            shapes,
        }
    }

    pub fn eval_state(&self, state: &AnimatorState) -> SceneFrame {
        self.eval(state.idx, state.t01, state.step_elapsed_ms)
    }

    fn eval_shape(&self, id: &str, idx: usize, elapsed: Millis) -> ShapeFrame {
        let span = self.spans.get(id).copied().unwrap_or(Span {
            first: 0,
            last: None,
        });
        if !span.contains(idx) {
            return ShapeFrame {
                id: id.to_owned(),
                visible: false,
                fresh: false,
                blinking: false,
                opacity: 0.0,
            };
        }

        let fresh = idx == span.first;
        let mut opacity = if fresh { 1.0 } else { self.opts.dim_opacity };
        let blinking = self
            .blinks
            .get(&(id, idx))
            .is_some_and(|b| blink_low_phase(b, elapsed));
        if blinking {
            opacity *= self.opts.blink_low;
        }

        ShapeFrame {
            id: id.to_owned(),
            visible: true,
            fresh,
            blinking,
            opacity,
        }
    }
}

/// A blink toggles every `interval` ms, `times` on/off cycles; odd phases are "off".
fn blink_low_phase(b: &BlinkCue, elapsed: Millis) -> bool {
    if b.interval <= 0.0 || b.times == 0 || elapsed < 0.0 {
        return false;
    }
    let k = (elapsed / b.interval).floor() as u64;
    k < 2 * u64::from(b.times) && k % 2 == 1
}
