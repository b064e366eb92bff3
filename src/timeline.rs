use crate::{
    foundation::core::Point,
    model::{AnimDirective, ArrowShape, Document, LineShape, Shape, Step},
};

pub const DEFAULT_BLINK_TIMES: u32 = 3;
pub const DEFAULT_BLINK_INTERVAL_MS: f64 = 260.0;
pub const HIGHLIGHT_INTERVAL_MS: f64 = 240.0;
pub const FLOW_COLOR: &str = "#94a3b8";
pub const FLOW_WIDTH: f64 = 2.0;
pub const GUIDE_DASH: [f64; 2] = [6.0, 4.0];

/// Programmatic alternative to DSL text: builds the same [`Document`].
///
/// Directives bind to the most recent [`step`](Self::step); calls made before
/// the first step are ignored.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    steps: Vec<Step>,
    anims: Vec<AnimDirective>,
    spawned: Vec<Shape>,
    cur: Option<usize>,
    next_uid: u64,
}

#[derive(Clone, Debug, Default)]
pub struct FlowOpts {
    pub id: Option<String>,
    pub color: Option<String>,
    pub width: Option<f64>,
    pub label: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MoveOpts {
    pub id: Option<String>,
    pub color: Option<String>,
    pub times: Option<u32>,
    pub interval_ms: Option<f64>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.steps.push(Step::new(id, name));
        self.cur = Some(self.steps.len() - 1);
        self
    }

    pub fn appear(mut self, id: impl Into<String>) -> Self {
        self.push_appear(id.into());
        self
    }

    pub fn disappear(mut self, id: impl Into<String>) -> Self {
        if let Some(step_id) = self.current_step_id("disappear") {
            self.anims.push(AnimDirective::Disappear {
                id: id.into(),
                step_id,
            });
        }
        self
    }

    pub fn blink(mut self, id: impl Into<String>, times: u32, interval_ms: f64) -> Self {
        self.push_blink(id.into(), times, interval_ms);
        self
    }

    /// Blink with the default cadence (3 × 260 ms).
    pub fn blink_default(self, id: impl Into<String>) -> Self {
        self.blink(id, DEFAULT_BLINK_TIMES, DEFAULT_BLINK_INTERVAL_MS)
    }

    pub fn add_shape(mut self, shape: Shape) -> Self {
        self.spawned.push(shape);
        self
    }

    /// Blinks at a fixed 240 ms cadence for roughly `duration_ms`.
    pub fn highlight(mut self, id: impl Into<String>, duration_ms: f64) -> Self {
        let times = (duration_ms / HIGHLIGHT_INTERVAL_MS).round().max(1.0) as u32;
        self.push_blink(id.into(), times, HIGHLIGHT_INTERVAL_MS);
        self
    }

    /// Spawns an arrow from `from` to `to` and shows it in the current step.
    pub fn flow(&mut self, from: Point, to: Point, opts: FlowOpts) -> String {
        let id = opts.id.unwrap_or_else(|| self.uid("flow"));
        self.spawned.push(Shape::Arrow(ArrowShape {
            id: id.clone(),
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
            width: Some(opts.width.unwrap_or(FLOW_WIDTH)),
            label: opts.label,
            above: None,
            color: Some(opts.color.unwrap_or_else(|| FLOW_COLOR.to_owned())),
            start: false,
            end: true,
        }));
        self.push_appear(id.clone());
        id
    }

    /// Suggests motion of `target` along `from -> to`: a dashed guide line that
    /// appears in the current step while the target blinks. Shapes never move.
    pub fn move_to(
        &mut self,
        target: impl Into<String>,
        from: Point,
        to: Point,
        opts: MoveOpts,
    ) -> String {
        let id = opts.id.unwrap_or_else(|| self.uid("move"));
        self.spawned.push(Shape::Line(LineShape {
            id: id.clone(),
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
            width: Some(FLOW_WIDTH),
            color: Some(opts.color.unwrap_or_else(|| FLOW_COLOR.to_owned())),
            dash: Some(GUIDE_DASH.to_vec()),
        }));
        self.push_appear(id.clone());
        self.push_blink(
            target.into(),
            opts.times.unwrap_or(2),
            opts.interval_ms.unwrap_or(HIGHLIGHT_INTERVAL_MS),
        );
        id
    }

    /// Replays the current step's directives in `times - 1` extra steps
    /// (`{step}_loop1`, `{step}_loop2`, ...). The last copy becomes current.
    pub fn repeat(mut self, times: u32) -> Self {
        let Some(cur) = self.cur else {
            tracing::debug!("repeat before any step ignored");
            return self;
        };
        let base = self.steps[cur].clone();
        let replay: Vec<AnimDirective> = self
            .anims
            .iter()
            .filter(|a| a.step_id() == base.id)
            .cloned()
            .collect();

        for k in 1..times {
            let step_id = format!("{}_loop{k}", base.id);
            self.anims.extend(replay.iter().map(|a| a.rebound(&step_id)));
            self.steps.push(Step::new(step_id, base.name.clone()));
            self.cur = Some(self.steps.len() - 1);
        }
        self
    }

    /// Finalizes: `shapes` first, then shapes spawned by `flow`/`move_to`/`add_shape`.
    /// Referenced ids are not checked; see [`lint`](crate::lint::lint).
    pub fn build(
        self,
        shapes: Vec<Shape>,
        pack_on: Vec<String>,
        pack_off: Vec<String>,
    ) -> Document {
        let mut all = shapes;
        all.extend(self.spawned);
        Document {
            steps: self.steps,
            shapes: all,
            anims: self.anims,
            pack_on,
            pack_off,
            pack_default: None,
        }
    }

    fn current_step_id(&self, what: &str) -> Option<String> {
        let id = self.cur.map(|i| self.steps[i].id.clone());
        if id.is_none() {
            tracing::debug!(directive = what, "directive before any step ignored");
        }
        id
    }

    fn push_appear(&mut self, id: String) {
        if let Some(step_id) = self.current_step_id("appear") {
            self.anims.push(AnimDirective::Appear { id, step_id });
        }
    }

    fn push_blink(&mut self, id: String, times: u32, interval: f64) {
        if let Some(step_id) = self.current_step_id("blink") {
            self.anims.push(AnimDirective::Blink {
                id,
                step_id,
                times,
                interval,
            });
        }
    }

    fn uid(&mut self, prefix: &str) -> String {
        let n = self.next_uid;
        self.next_uid += 1;
        format!("{prefix}_{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_before_first_step_are_ignored() {
        let doc = Timeline::new()
            .appear("a")
            .blink_default("a")
            .disappear("a")
            .step("s1", "one")
            .appear("a")
            .build(vec![], vec![], vec![]);
        assert_eq!(doc.anims.len(), 1);
        assert_eq!(doc.anims[0].step_id(), "s1");
    }

    #[test]
    fn blink_default_uses_three_times_260ms() {
        let doc = Timeline::new()
            .step("s1", "one")
            .blink_default("alu")
            .build(vec![], vec![], vec![]);
        assert_eq!(
            doc.anims[0],
            AnimDirective::Blink {
                id: "alu".into(),
                step_id: "s1".into(),
                times: 3,
                interval: 260.0
            }
        );
    }

    #[test]
    fn highlight_derives_times_from_duration() {
        let doc = Timeline::new()
            .step("s1", "one")
            .highlight("a", 1000.0)
            .highlight("b", 10.0)
            .build(vec![], vec![], vec![]);
        assert!(matches!(
            doc.anims[0],
            AnimDirective::Blink {
                times: 4,
                interval: 240.0,
                ..
            }
        ));
        assert!(matches!(doc.anims[1], AnimDirective::Blink { times: 1, .. }));
    }

    #[test]
    fn flow_and_move_spawn_shapes_with_per_builder_ids() {
        let mut tl = Timeline::new().step("s1", "one");
        let a = tl.flow(Point::new(0.0, 0.0), Point::new(1.0, 0.0), FlowOpts::default());
        let b = tl.move_to(
            "v1",
            Point::new(0.0, 1.0),
            Point::new(2.0, 1.0),
            MoveOpts::default(),
        );
        let c = tl.flow(
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            FlowOpts {
                id: Some("bus".into()),
                ..FlowOpts::default()
            },
        );
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("flow_0", "move_1", "bus"));

        let mut other = Timeline::new().step("s1", "one");
        assert_eq!(
            other.flow(Point::ZERO, Point::ZERO, FlowOpts::default()),
            "flow_0"
        );

        let doc = tl.build(vec![], vec![], vec![]);
        assert_eq!(doc.shapes.len(), 3);
        let Shape::Line(guide) = &doc.shapes[1] else {
            panic!("expected guide line");
        };
        assert_eq!(guide.dash.as_deref(), Some(&GUIDE_DASH[..]));
        let kinds: Vec<(&str, &str)> = doc
            .anims
            .iter()
            .map(|a| match a {
                AnimDirective::Appear { id, .. } => ("appear", id.as_str()),
                AnimDirective::Disappear { id, .. } => ("disappear", id.as_str()),
                AnimDirective::Blink { id, .. } => ("blink", id.as_str()),
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("appear", "flow_0"),
                ("appear", "move_1"),
                ("blink", "v1"),
                ("appear", "bus")
            ]
        );
    }

    #[test]
    fn repeat_duplicates_current_step() {
        let doc = Timeline::new()
            .step("s1", "load")
            .appear("a")
            .step("s2", "emphasis")
            .blink("alu", 2, 200.0)
            .appear("b")
            .repeat(3)
            .appear("c")
            .build(vec![], vec![], vec![]);
        let step_ids: Vec<&str> = doc.steps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(step_ids, vec!["s1", "s2", "s2_loop1", "s2_loop2"]);
        assert!(doc.steps[2..].iter().all(|s| s.name == "emphasis"));
        assert_eq!(doc.anims_for_step("s2_loop1").count(), 2);
        assert_eq!(doc.anims_for_step("s2_loop2").count(), 3);
    }

    #[test]
    fn repeat_once_is_a_no_op() {
        let doc = Timeline::new()
            .step("s1", "x")
            .appear("a")
            .repeat(1)
            .repeat(0)
            .build(vec![], vec![], vec![]);
        assert_eq!(doc.steps.len(), 1);
        assert_eq!(doc.anims.len(), 1);
    }

    #[test]
    fn build_puts_external_shapes_first() {
        let ext = Shape::Line(LineShape {
            id: "ext".into(),
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
            width: None,
            color: None,
            dash: None,
        });
        let mut tl = Timeline::new().step("s1", "x");
        tl.flow(Point::ZERO, Point::new(1.0, 1.0), FlowOpts::default());
        let doc = tl.build(vec![ext], vec!["v1".into()], vec![]);
        assert_eq!(doc.shapes[0].id(), "ext");
        assert_eq!(doc.shapes[1].id(), "flow_0");
        assert_eq!(doc.pack_on, vec!["v1"]);
    }
}
