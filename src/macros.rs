//! Textual pre-pass that rewrites shorthand statements into primitives.
//!
//! `square`, `vecN`, multi-id `appear`/`disappear`/`blink` and range tokens
//! become plain `rect`/`group`/`appear`/... lines; `pack_default` and
//! `nopack_prefix` are kept as comments. Lines that are not shorthand (or
//! are malformed shorthand) pass through unchanged.

use crate::{
    foundation::core::fmt_num,
    lexer::{self, Call},
};

/// Lane size of vector registers in scene units.
pub const LANE_SIZE: f64 = 1.0;
/// Padding of the dotted box around a vector, across the lane axis.
pub const BOX_PAD: f64 = 0.2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn parse(s: &str) -> Option<Self> {
        match lexer::unquote(s).to_ascii_lowercase().as_str() {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            _ => None,
        }
    }
}

/// Geometry of an N-lane vector register laid out along one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VecLayout {
    pub x: f64,
    pub y: f64,
    pub lanes: usize,
    pub axis: Axis,
    pub gap: f64,
}

impl VecLayout {
    pub fn lane_origin(&self, i: usize) -> (f64, f64) {
        let off = i as f64 * (LANE_SIZE + self.gap);
        match self.axis {
            Axis::X => (self.x + off, self.y),
            Axis::Y => (self.x, self.y + off),
        }
    }

    /// `(x, y, w, h)` of the dotted bounding box.
    pub fn box_geometry(&self) -> (f64, f64, f64, f64) {
        let n = self.lanes as f64;
        let extent = n * LANE_SIZE + (n - 1.0).max(0.0) * self.gap;
        let across = LANE_SIZE + 2.0 * BOX_PAD;
        match self.axis {
            Axis::X => (self.x, self.y - BOX_PAD, extent, across),
            Axis::Y => (self.x - BOX_PAD, self.y, across, extent),
        }
    }
}

/// Lane count of a `vec2`/`vec4`/`vec8` statement name.
pub fn vec_lanes(name: &str) -> Option<usize> {
    match name.to_ascii_lowercase().as_str() {
        "vec2" => Some(2),
        "vec4" => Some(4),
        "vec8" => Some(8),
        _ => None,
    }
}

/// Trailing `vecN` argument values that suppress the bounding box.
pub fn is_nobox(s: &str) -> bool {
    matches!(
        lexer::unquote(s).to_ascii_lowercase().as_str(),
        "nobox" | "none" | "off" | "0" | "false"
    )
}

/// Splits the quoted `"v0,v1,..."` lane list, padded or truncated to `lanes`.
pub fn lane_values(csv: &str, lanes: usize) -> Vec<String> {
    let mut vals: Vec<String> = lexer::unquote(csv)
        .split(',')
        .map(|v| v.trim().to_owned())
        .collect();
    vals.resize(lanes, String::new());
    vals
}

pub fn box_id(name: &str) -> String {
    format!("{name}__box")
}

/// Expands shorthand forms. Pure; the output keeps one line per input line
/// unless a line expands into several statements.
pub fn expand(src: &str) -> String {
    let mut out: Vec<String> = Vec::new();

    for raw in src.lines() {
        let line = raw.trim();
        if line.is_empty() || lexer::is_comment(line) {
            out.push(raw.to_owned());
            continue;
        }

        let stmts = lexer::split_line(line);
        let expanded: Vec<Option<Vec<String>>> =
            stmts.iter().map(|s| expand_statement(s)).collect();
        if expanded.iter().all(Option::is_none) {
            out.push(raw.to_owned());
            continue;
        }

        for (stmt, exp) in stmts.iter().zip(expanded) {
            match exp {
                Some(lines) => out.extend(lines),
                None => out.push((*stmt).to_owned()),
            }
        }
    }

    out.join("\n")
}

/// Expansion of one statement, `None` when it is not a (well-formed) shorthand.
pub fn expand_statement(stmt: &str) -> Option<Vec<String>> {
    let call = lexer::parse_call(stmt)?;
    let name = call.name.to_ascii_lowercase();

    if let Some(lanes) = vec_lanes(&name) {
        return expand_vec(&call, lanes);
    }
    match name.as_str() {
        "square" => expand_square(&call),
        "appear" | "disappear" => expand_visibility(&name, &call),
        "blink" => expand_blink(&call),
        "pack_default" | "nopack_prefix" => Some(vec![format!("# {}", stmt.trim())]),
        _ => None,
    }
}

fn expand_square(call: &Call<'_>) -> Option<Vec<String>> {
    let [id, x, y, text, color] = call.args.as_slice() else {
        return None;
    };
    Some(vec![format!("rect({id}, 1, 1, {x}, {y}, {text}, {color})")])
}

fn expand_vec(call: &Call<'_>, lanes: usize) -> Option<Vec<String>> {
    if !(7..=8).contains(&call.args.len()) {
        return None;
    }
    let name = call.args[0];
    if !lexer::is_ident(name) {
        return None;
    }
    let layout = VecLayout {
        x: call.num(1),
        y: call.num(2),
        lanes,
        axis: Axis::parse(call.args[5])?,
        gap: call.num(6),
    };
    let values = lane_values(call.args[3], lanes);
    let color = call.args[4];
    let boxed = !call.arg(7).is_some_and(is_nobox);

    let mut out = Vec::with_capacity(lanes + 1);
    if boxed {
        let (bx, by, bw, bh) = layout.box_geometry();
        out.push(format!(
            "group({}, {}, {}, {}, {}, dotted)",
            box_id(name),
            fmt_num(bx),
            fmt_num(by),
            fmt_num(bw),
            fmt_num(bh)
        ));
    }
    for (i, v) in values.iter().enumerate() {
        let (cx, cy) = layout.lane_origin(i);
        out.push(format!(
            "rect({}, {}, {}, {}, {}, {}, {color})",
            lexer::lane_id(name, i),
            fmt_num(LANE_SIZE),
            fmt_num(LANE_SIZE),
            fmt_num(cx),
            fmt_num(cy),
            quote(v)
        ));
    }
    Some(out)
}

fn expand_visibility(name: &str, call: &Call<'_>) -> Option<Vec<String>> {
    let (step, ids) = call.args.split_last()?;
    if ids.is_empty() {
        return None;
    }
    Some(
        ids.iter()
            .flat_map(|t| lexer::explode_range(t))
            .filter(|id| !id.is_empty())
            .map(|id| format!("{name}({id}, {step})"))
            .collect(),
    )
}

fn expand_blink(call: &Call<'_>) -> Option<Vec<String>> {
    let n = call.args.len();
    if n < 4 {
        return None;
    }
    let (ids, tail) = call.args.split_at(n - 3);
    let [step, times, interval] = tail else {
        return None;
    };
    Some(
        ids.iter()
            .flat_map(|t| lexer::explode_range(t))
            .filter(|id| !id.is_empty())
            .map(|id| format!("blink({id}, {step}, {times}, {interval})"))
            .collect(),
    )
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
