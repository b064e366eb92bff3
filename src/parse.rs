//! Primitive-statement parser: DSL text to [`Document`].
//!
//! Parsing never fails. Statements that are not calls, have an unknown name,
//! or lack required arguments are skipped (logged at `debug`); numbers that
//! do not parse become `0`.

use std::collections::BTreeMap;

use crate::{
    lexer::{self, Call, RangeRef},
    macros::{self, Axis, VecLayout},
    model::{
        AnimDirective, ArrowShape, Document, GroupShape, GroupStyle, LabelShape, LaneMeta,
        LineShape, PackDefault, RectShape, Shape, Step, TextAlign, TextShape,
    },
};

pub const DEFAULT_BLINK_TIMES: u32 = 3;
pub const DEFAULT_BLINK_INTERVAL_MS: f64 = 600.0;
pub const DEFAULT_RECT_COLOR: &str = "lightgray";

/// Expands macros, then parses. `pack_default` survives expansion only as a
/// comment, so it is read from the raw source.
pub fn parse_dsl(src: &str) -> Document {
    let mut doc = parse_document(&macros::expand(src));
    if doc.pack_default.is_none() {
        doc.pack_default = pack_default_of(src);
    }
    doc
}

/// Parses already-expanded DSL text.
#[tracing::instrument(skip(src), fields(bytes = src.len()))]
pub fn parse_document(src: &str) -> Document {
    let mut parser = Parser::default();
    for stmt in lexer::split_statements(src) {
        let Some(call) = lexer::parse_call(stmt) else {
            tracing::debug!(statement = stmt, "skipping non-call statement");
            continue;
        };
        parser.apply(Statement::from_call(&call), stmt);
    }
    let doc = parser.finish();
    tracing::debug!(
        steps = doc.steps.len(),
        shapes = doc.shapes.len(),
        anims = doc.anims.len(),
        "parsed document"
    );
    doc
}

/// Last valid `pack_default(...)` in the source, if any.
pub fn pack_default_of(src: &str) -> Option<PackDefault> {
    lexer::split_statements(src)
        .into_iter()
        .filter_map(lexer::parse_call)
        .filter(|c| c.name.eq_ignore_ascii_case("pack_default"))
        .filter_map(|c| c.text(0).as_deref().and_then(PackDefault::parse))
        .last()
}

/// One primitive statement with typed arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Step(Step),
    PackDefault(Option<PackDefault>),
    Pack(Vec<String>),
    NoPack(Vec<String>),
    NoPackPrefix(String),
    Label(LabelShape),
    Text(TextShape),
    Group(GroupShape),
    Rect(RectShape),
    Square {
        id: String,
        x: f64,
        y: f64,
        text: Option<String>,
        color: Option<String>,
    },
    Line(LineShape),
    Arrow(ArrowShape),
    Vec(VecDecl),
    Appear {
        targets: Vec<String>,
        step_id: String,
    },
    Disappear {
        targets: Vec<String>,
        step_id: String,
    },
    Blink {
        targets: Vec<String>,
        step_id: String,
        times: u32,
        interval: f64,
    },
    Unknown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VecDecl {
    pub name: String,
    pub layout: VecLayout,
    pub values: Vec<String>,
    pub color: String,
    pub boxed: bool,
}

impl Statement {
    pub fn from_call(call: &Call<'_>) -> Self {
        let name = call.name.to_ascii_lowercase();
        let argc = call.args.len();
        let id = |i: usize| lexer::unquote(call.arg(i).unwrap_or_default());

        if let Some(lanes) = macros::vec_lanes(&name) {
            if argc < 4 {
                return Self::Unknown;
            }
            return Self::Vec(VecDecl {
                name: id(0),
                layout: VecLayout {
                    x: call.num(1),
                    y: call.num(2),
                    lanes,
                    axis: call.arg(5).and_then(Axis::parse).unwrap_or(Axis::X),
                    gap: call.opt_num(6).unwrap_or(0.2),
                },
                values: macros::lane_values(call.args[3], lanes),
                color: call
                    .opt_text(4)
                    .unwrap_or_else(|| DEFAULT_RECT_COLOR.to_owned()),
                boxed: !call.arg(7).is_some_and(macros::is_nobox),
            });
        }

        match name.as_str() {
            "step" if argc >= 1 => Self::Step(Step {
                id: id(0),
                name: call.text(1).unwrap_or_else(|| id(0)),
            }),
            "pack_default" if argc >= 1 => {
                Self::PackDefault(call.text(0).as_deref().and_then(PackDefault::parse))
            }
            "pack" => Self::Pack(id_list(&call.args)),
            "nopack" => Self::NoPack(id_list(&call.args)),
            "nopack_prefix" => Self::NoPackPrefix(call.text(0).unwrap_or_default()),
            "label" if argc >= 4 => Self::Label(LabelShape {
                id: id(0),
                x: call.num(1),
                y: call.num(2),
                text: call.text(3).unwrap_or_default(),
            }),
            "text" if argc >= 4 => Self::Text(TextShape {
                id: id(0),
                x: call.num(1),
                y: call.num(2),
                text: call.text(3).unwrap_or_default(),
                size: call.opt_num(4),
                color: call.opt_text(5),
                align: call.arg(6).and_then(TextAlign::parse),
            }),
            "group" if argc >= 5 => Self::Group(GroupShape {
                id: id(0),
                x: call.num(1),
                y: call.num(2),
                w: call.num(3),
                h: call.num(4),
                style: call
                    .arg(5)
                    .map(|s| GroupStyle::parse(&lexer::unquote(s)))
                    .unwrap_or_default(),
            }),
            "rect" if argc >= 5 => {
                let rect_id = id(0);
                Self::Rect(RectShape {
                    meta: lane_meta(&rect_id),
                    id: rect_id,
                    w: call.num(1),
                    h: call.num(2),
                    x: call.num(3),
                    y: call.num(4),
                    text: call.text(5),
                    color: call.opt_text(6),
                })
            }
            "square" if argc >= 3 => Self::Square {
                id: id(0),
                x: call.num(1),
                y: call.num(2),
                text: call.text(3),
                color: call.opt_text(4),
            },
            "line" if argc >= 5 => Self::Line(LineShape {
                id: id(0),
                x1: call.num(1),
                y1: call.num(2),
                x2: call.num(3),
                y2: call.num(4),
                width: call.opt_num(5),
                color: call.opt_text(6),
                dash: None,
            }),
            "arrow" if argc >= 5 => Self::Arrow(ArrowShape {
                id: id(0),
                x1: call.num(1),
                y1: call.num(2),
                x2: call.num(3),
                y2: call.num(4),
                width: call.opt_num(5),
                label: call.opt_text(6),
                above: call.arg(7).filter(|s| !s.is_empty()).map(lexer::flag),
                color: call.opt_text(8),
                start: call.arg(9).is_some_and(lexer::flag),
                end: !call
                    .arg(10)
                    .is_some_and(|s| lexer::unquote(s).eq_ignore_ascii_case("false")),
            }),
            "appear" | "disappear" if argc >= 2 => {
                let Some((step, ids)) = call.args.split_last() else {
                    return Self::Unknown;
                };
                let targets = id_list(ids);
                let step_id = lexer::unquote(step);
                if name == "appear" {
                    Self::Appear { targets, step_id }
                } else {
                    Self::Disappear { targets, step_id }
                }
            }
            "blink" if argc >= 2 => {
                // Multi-id form needs all three trailing arguments.
                let split = if argc >= 4 { argc - 3 } else { 1 };
                let (ids, tail) = call.args.split_at(split);
                let times = tail
                    .get(1)
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| lexer::num(s).max(0.0).round() as u32)
                    .unwrap_or(DEFAULT_BLINK_TIMES);
                let interval = tail
                    .get(2)
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| lexer::num(s).max(0.0))
                    .unwrap_or(DEFAULT_BLINK_INTERVAL_MS);
                Self::Blink {
                    targets: id_list(ids),
                    step_id: lexer::unquote(tail[0]),
                    times,
                    interval,
                }
            }
            _ => Self::Unknown,
        }
    }
}

fn id_list(args: &[&str]) -> Vec<String> {
    args.iter()
        .map(|a| lexer::unquote(a))
        .filter(|a| !a.is_empty())
        .collect()
}

/// `base[i]` rect ids are vector lanes of family `base`.
fn lane_meta(id: &str) -> Option<LaneMeta> {
    let (base, rest) = id.split_once('[')?;
    let idx = rest.strip_suffix(']')?;
    if !lexer::is_ident(base) || idx.is_empty() || !idx.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(LaneMeta {
        vec_item: true,
        family: base.to_owned(),
    })
}

#[derive(Default)]
struct Parser {
    doc: Document,
    /// vector name -> lane shape ids
    groups: BTreeMap<String, Vec<String>>,
    /// `name[i]` -> lane shape id
    aliases: BTreeMap<String, String>,
    /// Directives and pack hints, resolved once every vector is declared.
    deferred: Vec<Statement>,
}

impl Parser {
    fn apply(&mut self, stmt: Statement, raw: &str) {
        match stmt {
            Statement::Step(step) => self.doc.steps.push(step),
            Statement::PackDefault(Some(mode)) => self.doc.pack_default = Some(mode),
            Statement::PackDefault(None) => {
                tracing::debug!(statement = raw, "ignoring unknown pack_default mode");
            }
            stmt @ (Statement::Pack(_) | Statement::NoPack(_)) => self.deferred.push(stmt),
            Statement::NoPackPrefix(_) => {}
            Statement::Label(s) => self.doc.shapes.push(Shape::Label(s)),
            Statement::Text(s) => self.doc.shapes.push(Shape::Text(s)),
            Statement::Group(s) => self.doc.shapes.push(Shape::Group(s)),
            Statement::Rect(s) => {
                // Expanded `vecN` lanes make their family addressable by name.
                if let Some(meta) = s.meta.as_ref().filter(|m| m.vec_item) {
                    self.groups
                        .entry(meta.family.clone())
                        .or_default()
                        .push(s.id.clone());
                }
                self.doc.shapes.push(Shape::Rect(s));
            }
            Statement::Square {
                id,
                x,
                y,
                text,
                color,
            } => self.doc.shapes.push(Shape::Rect(RectShape {
                meta: lane_meta(&id),
                id,
                x,
                y,
                w: macros::LANE_SIZE,
                h: macros::LANE_SIZE,
                text,
                color,
            })),
            Statement::Line(s) => self.doc.shapes.push(Shape::Line(s)),
            Statement::Arrow(s) => self.doc.shapes.push(Shape::Arrow(s)),
            Statement::Vec(decl) => self.declare_vec(decl),
            stmt @ (Statement::Appear { .. }
            | Statement::Disappear { .. }
            | Statement::Blink { .. }) => self.deferred.push(stmt),
            Statement::Unknown => {
                tracing::debug!(statement = raw, "skipping unrecognized statement");
            }
        }
    }

    fn declare_vec(&mut self, decl: VecDecl) {
        let VecDecl {
            name,
            layout,
            values,
            color,
            boxed,
        } = decl;

        if boxed {
            let (x, y, w, h) = layout.box_geometry();
            self.doc.shapes.push(Shape::Group(GroupShape {
                id: macros::box_id(&name),
                x,
                y,
                w,
                h,
                style: GroupStyle::Dotted,
            }));
        }

        let mut lane_ids = Vec::with_capacity(values.len());
        for (i, text) in values.into_iter().enumerate() {
            let (x, y) = layout.lane_origin(i);
            let lane = format!("{name}_{i}");
            self.aliases.insert(lexer::lane_id(&name, i), lane.clone());
            self.doc.shapes.push(Shape::Rect(RectShape {
                id: lane.clone(),
                x,
                y,
                w: macros::LANE_SIZE,
                h: macros::LANE_SIZE,
                text: Some(text),
                color: Some(color.clone()),
                meta: Some(LaneMeta {
                    vec_item: true,
                    family: name.clone(),
                }),
            }));
            lane_ids.push(lane);
        }
        self.groups.insert(name, lane_ids);
    }

    /// Range, alias, group, or the literal token.
    fn resolve(&self, token: &str) -> Vec<String> {
        if let Some(range) = RangeRef::parse(token) {
            return range.ids().into_iter().map(|id| self.alias(id)).collect();
        }
        if let Some(target) = self.aliases.get(token) {
            return vec![target.clone()];
        }
        if let Some(lanes) = self.groups.get(token) {
            return lanes.clone();
        }
        vec![token.to_owned()]
    }

    /// Like [`Self::resolve`] but keeps group names, which is what renderers match families on.
    fn resolve_pack(&self, token: &str) -> Vec<String> {
        match RangeRef::parse(token) {
            Some(range) => range.ids().into_iter().map(|id| self.alias(id)).collect(),
            None => vec![self.alias(token.to_owned())],
        }
    }

    fn alias(&self, id: String) -> String {
        self.aliases.get(&id).cloned().unwrap_or(id)
    }

    fn finish(mut self) -> Document {
        for stmt in std::mem::take(&mut self.deferred) {
            self.resolve_deferred(stmt);
        }
        self.doc
    }

    fn resolve_deferred(&mut self, stmt: Statement) {
        match stmt {
            Statement::Pack(tokens) => {
                let ids: Vec<String> = tokens.iter().flat_map(|t| self.resolve_pack(t)).collect();
                for id in ids {
                    push_unique(&mut self.doc.pack_on, id);
                }
            }
            Statement::NoPack(tokens) => {
                let ids: Vec<String> = tokens.iter().flat_map(|t| self.resolve_pack(t)).collect();
                for id in ids {
                    push_unique(&mut self.doc.pack_off, id);
                }
            }
            Statement::Appear { targets, step_id } => {
                let anims: Vec<AnimDirective> = targets
                    .iter()
                    .flat_map(|t| self.resolve(t))
                    .map(|id| AnimDirective::Appear {
                        id,
                        step_id: step_id.clone(),
                    })
                    .collect();
                self.doc.anims.extend(anims);
            }
            Statement::Disappear { targets, step_id } => {
                let anims: Vec<AnimDirective> = targets
                    .iter()
                    .flat_map(|t| self.resolve(t))
                    .map(|id| AnimDirective::Disappear {
                        id,
                        step_id: step_id.clone(),
                    })
                    .collect();
                self.doc.anims.extend(anims);
            }
            Statement::Blink {
                targets,
                step_id,
                times,
                interval,
            } => {
                let anims: Vec<AnimDirective> = targets
                    .iter()
                    .flat_map(|t| self.resolve(t))
                    .map(|id| AnimDirective::Blink {
                        id,
                        step_id: step_id.clone(),
                        times,
                        interval,
                    })
                    .collect();
                self.doc.anims.extend(anims);
            }
            _ => {}
        }
    }
}

fn push_unique(list: &mut Vec<String>, id: String) {
    if !list.contains(&id) {
        list.push(id);
    }
}
