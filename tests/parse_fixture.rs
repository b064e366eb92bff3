use isaviz::{AnimDirective, Document, PackDefault, Shape, parse_dsl};

const VADD: &str = include_str!("data/vadd_vv.dsl");

#[test]
fn vadd_fixture_parses_into_full_document() {
    let doc = parse_dsl(VADD);

    let steps: Vec<&str> = doc.steps.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(steps, vec!["s1", "s2", "s3", "s4", "s5"]);
    assert_eq!(doc.shapes.len(), 19);
    assert_eq!(doc.pack_on, vec!["v1", "v2", "v3"]);
    assert!(doc.pack_off.is_empty());
    assert_eq!(doc.pack_default, None);

    let per_step: Vec<usize> = doc
        .steps
        .iter()
        .map(|s| doc.anims_for_step(&s.id).count())
        .collect();
    assert_eq!(per_step, vec![2, 3, 1, 6, 0]);

    assert_eq!(doc.shape("v2[3]").and_then(Shape::lane_family), Some("v2"));
    assert!(isaviz::lint(&doc).is_empty());

    let bounds = doc.bounds().unwrap();
    assert!((bounds.x0 - 1.0).abs() < 1e-9);
    assert!((bounds.x1 - 12.0).abs() < 1e-9);
}

#[test]
fn primitive_statements_map_one_to_one_onto_shapes() {
    let src = "\
rect(r0, 1, 1, 0, 0)
label(l0, 0, 2, \"vs1\")
text(t0, 0, 3, \"note\", 12)
group(g0, 0, 0, 4, 1)
line(ln0, 0, 0, 1, 1)
arrow(ar0, 0, 0, 2, 0)
rect(r1, 1, 1, 2, 0); rect(r2, 1, 1, 4, 0)
# rect(commented, 1, 1, 0, 0)
bogus(x, 1, 2)
";
    let doc = parse_dsl(src);
    let kinds: Vec<&str> = doc.shapes.iter().map(Shape::kind).collect();
    assert_eq!(
        kinds,
        vec!["rect", "label", "text", "group", "line", "arrow", "rect", "rect"]
    );
}

#[test]
fn ranges_do_not_depend_on_declaration_order() {
    let before = parse_dsl("appear(dst[0..3], s1)\nvec4(dst, 0, 0, \"\", gray, x, 0)");
    let after = parse_dsl("vec4(dst, 0, 0, \"\", gray, x, 0)\nappear(dst[0..3], s1)");

    for doc in [&before, &after] {
        assert_eq!(
            doc.anims,
            (0..4)
                .map(|i| AnimDirective::Appear {
                    id: format!("dst[{i}]"),
                    step_id: "s1".into()
                })
                .collect::<Vec<_>>()
        );
    }
}

#[test]
fn truncated_sources_still_parse() {
    for (i, _) in VADD.char_indices() {
        let doc = parse_dsl(&VADD[..i]);
        assert!(doc.steps.len() <= 5);
        assert!(doc.shapes.len() <= 19);
    }
}

#[test]
fn document_json_uses_camel_case_contract() {
    let doc = parse_dsl(&format!("pack_default(on)\n{VADD}"));
    assert_eq!(doc.pack_default, Some(PackDefault::On));

    let json = doc.to_json(false).unwrap();
    let v: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(v["packOn"], serde_json::json!(["v1", "v2", "v3"]));
    assert_eq!(v["packDefault"], "on");
    assert_eq!(v["anims"][0]["kind"], "appear");
    assert_eq!(v["anims"][0]["stepId"], "s1");
    assert_eq!(v["shapes"][3]["meta"]["vecItem"], true);

    assert_eq!(Document::from_json(&json).unwrap(), doc);
}
