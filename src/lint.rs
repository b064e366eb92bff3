use std::{collections::HashSet, fmt};

use crate::model::{AnimDirective, Document};

/// Problem found by [`lint`]. `index` is the position in `Document::anims`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "issue", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LintIssue {
    DuplicateShapeId { id: String },
    DuplicateStepId { id: String },
    UnknownShape { index: usize, id: String },
    UnknownStep { index: usize, step_id: String },
    ZeroBlink { index: usize, id: String },
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateShapeId { id } => {
                write!(f, "shape id '{id}' is declared more than once")
            }
            Self::DuplicateStepId { id } => write!(f, "step id '{id}' is declared more than once"),
            Self::UnknownShape { index, id } => {
                write!(f, "anim #{index} references missing shape '{id}'")
            }
            Self::UnknownStep { index, step_id } => {
                write!(f, "anim #{index} references missing step '{step_id}'")
            }
            Self::ZeroBlink { index, id } => {
                write!(f, "anim #{index} blinks '{id}' with zero times or interval")
            }
        }
    }
}

/// Checks references and id uniqueness. Parsing and building never call
/// this; see [`Document::validate`].
pub fn lint(doc: &Document) -> Vec<LintIssue> {
    let mut issues = Vec::new();

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for shape in &doc.shapes {
        let id = shape.id();
        if !seen.insert(id) && reported.insert(id) {
            issues.push(LintIssue::DuplicateShapeId { id: id.to_owned() });
        }
    }

    let mut steps = HashSet::new();
    let mut reported_steps = HashSet::new();
    for step in &doc.steps {
        if !steps.insert(step.id.as_str()) && reported_steps.insert(step.id.as_str()) {
            issues.push(LintIssue::DuplicateStepId {
                id: step.id.clone(),
            });
        }
    }

    for (index, anim) in doc.anims.iter().enumerate() {
        if !seen.contains(anim.id()) {
            issues.push(LintIssue::UnknownShape {
                index,
                id: anim.id().to_owned(),
            });
        }
        if !steps.contains(anim.step_id()) {
            issues.push(LintIssue::UnknownStep {
                index,
                step_id: anim.step_id().to_owned(),
            });
        }
        if let AnimDirective::Blink {
            id,
            times,
            interval,
            ..
        } = anim
            && (*times == 0 || *interval <= 0.0)
        {
            issues.push(LintIssue::ZeroBlink {
                index,
                id: id.clone(),
            });
        }
    }

    tracing::debug!(issues = issues.len(), "lint finished");
    issues
}
