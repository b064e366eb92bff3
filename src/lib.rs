#![forbid(unsafe_code)]

//! Step-driven instruction visualizations: a small scene DSL (or a builder)
//! produces a [`Document`]; an [`Animator`] turns timestamps into step
//! progress and an [`Evaluator`] resolves what each shape looks like.

pub mod animator;
pub mod config;
pub mod eval;
pub mod foundation;
pub mod lexer;
pub mod lint;
pub mod macros;
pub mod model;
pub mod parse;
pub mod timeline;

pub use animator::{Animator, AnimatorState, PlayState};
pub use config::PlaybackConfig;
pub use eval::{EvalOpts, Evaluator, SceneFrame, ShapeFrame};
pub use foundation::core::{Millis, Point, Rect};
pub use foundation::error::{IsavizError, IsavizResult};
pub use lint::{LintIssue, lint};
pub use macros::expand;
pub use model::{AnimDirective, Document, PackDefault, Shape, Step};
pub use parse::{parse_document, parse_dsl};
pub use timeline::{FlowOpts, MoveOpts, Timeline};
