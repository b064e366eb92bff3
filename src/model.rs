use crate::{
    foundation::core::{Point, Rect, box_rect, segment_rect, union_all},
    foundation::error::{IsavizError, IsavizResult},
};

/// Parser/builder output: ordered steps, shapes and the directives that animate them.
///
/// A document is built once and then only read; playback state lives in the
/// [`Animator`](crate::Animator) and per-frame visuals in [`SceneFrame`](crate::SceneFrame).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub steps: Vec<Step>,
    pub shapes: Vec<Shape>,
    pub anims: Vec<AnimDirective>,
    #[serde(default)]
    pub pack_on: Vec<String>,
    #[serde(default)]
    pub pack_off: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_default: Option<PackDefault>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Step {
    pub id: String,
    pub name: String,
}

impl Step {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Renderer hint for merging lane families into one register block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackDefault {
    Auto,
    On,
    Off,
}

impl PackDefault {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "on" => Some(Self::On),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Rect(RectShape),
    Label(LabelShape),
    Text(TextShape),
    Group(GroupShape),
    Line(LineShape),
    Arrow(ArrowShape),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RectShape {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<LaneMeta>,
}

/// Marks a rect as one lane of a vector register.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneMeta {
    pub vec_item: bool,
    pub family: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LabelShape {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextShape {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GroupShape {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub style: GroupStyle,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupStyle {
    #[default]
    Dotted,
    Solid,
}

impl GroupStyle {
    /// Anything other than `solid` is drawn dotted.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("solid") {
            Self::Solid
        } else {
            Self::Dotted
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LineShape {
    pub id: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dash: Option<Vec<f64>>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArrowShape {
    pub id: String,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub above: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub start: bool, // arrowhead at (x1, y1)
    #[serde(default = "default_true")]
    pub end: bool, // arrowhead at (x2, y2)
}

fn default_true() -> bool {
    true
}

/// Label boxes have no declared size; renderers reserve roughly this much.
const LABEL_W: f64 = 1.1;
const LABEL_H: f64 = 0.5;

impl Shape {
    pub fn id(&self) -> &str {
        match self {
            Self::Rect(s) => &s.id,
            Self::Label(s) => &s.id,
            Self::Text(s) => &s.id,
            Self::Group(s) => &s.id,
            Self::Line(s) => &s.id,
            Self::Arrow(s) => &s.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rect(_) => "rect",
            Self::Label(_) => "label",
            Self::Text(_) => "text",
            Self::Group(_) => "group",
            Self::Line(_) => "line",
            Self::Arrow(_) => "arrow",
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Self::Rect(s) => box_rect(s.x, s.y, s.w, s.h),
            Self::Group(s) => box_rect(s.x, s.y, s.w, s.h),
            Self::Label(s) => box_rect(s.x, s.y, LABEL_W, LABEL_H),
            Self::Text(s) => box_rect(s.x, s.y, LABEL_W, LABEL_H),
            Self::Line(s) => segment_rect(Point::new(s.x1, s.y1), Point::new(s.x2, s.y2)),
            Self::Arrow(s) => segment_rect(Point::new(s.x1, s.y1), Point::new(s.x2, s.y2)),
        }
    }

    /// Family name of a vector lane, if this rect was produced by a `vecN` statement.
    pub fn lane_family(&self) -> Option<&str> {
        match self {
            Self::Rect(RectShape {
                meta: Some(meta), ..
            }) if meta.vec_item => Some(&meta.family),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(
    tag = "kind",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum AnimDirective {
    Appear {
        id: String,
        step_id: String,
    },
    Disappear {
        id: String,
        step_id: String,
    },
    Blink {
        id: String,
        step_id: String,
        times: u32,
        interval: f64, // ms between toggles
    },
}

impl AnimDirective {
    pub fn id(&self) -> &str {
        match self {
            Self::Appear { id, .. } | Self::Disappear { id, .. } | Self::Blink { id, .. } => id,
        }
    }

    pub fn step_id(&self) -> &str {
        match self {
            Self::Appear { step_id, .. }
            | Self::Disappear { step_id, .. }
            | Self::Blink { step_id, .. } => step_id,
        }
    }

    /// Same directive bound to another step.
    pub fn rebound(&self, step_id: &str) -> Self {
        let mut out = self.clone();
        match &mut out {
            Self::Appear { step_id: s, .. }
            | Self::Disappear { step_id: s, .. }
            | Self::Blink { step_id: s, .. } => *s = step_id.to_owned(),
        }
        out
    }
}

impl Document {
    /// First shape with this id. Duplicate ids are a lint error, not a lookup error.
    pub fn shape(&self, id: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id() == id)
    }

    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    pub fn anims_for_step<'a>(
        &'a self,
        step_id: &'a str,
    ) -> impl Iterator<Item = &'a AnimDirective> {
        self.anims.iter().filter(move |a| a.step_id() == step_id)
    }

    /// Union of all shape bounds, `None` for an empty scene.
    pub fn bounds(&self) -> Option<Rect> {
        union_all(self.shapes.iter().map(Shape::bounds))
    }

    /// Runs [`lint`](crate::lint::lint) and fails on the first batch of issues.
    pub fn validate(&self) -> IsavizResult<()> {
        let issues = crate::lint::lint(self);
        if issues.is_empty() {
            return Ok(());
        }
        let msg = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(IsavizError::validation(msg))
    }

    pub fn to_json(&self, pretty: bool) -> IsavizResult<String> {
        let s = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(s)
    }

    pub fn from_json(s: &str) -> IsavizResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
