//! Targeted checks for the invariants named in this project's design
//! notes: parse/render/reparse stability, resolver idempotence, absence
//! of residual dual-valued nodes, `fmt` idempotence and semantics
//! preservation, and timeline monotonicity/EMOM/AMRAP accounting.

use wodc::ast::{Segment, Stmt};
use wodc::catalog::Gender;
use wodc::fmt::normalize;
use wodc::parser::parse_program;
use wodc::render::render_line;
use wodc::resolver::resolve;
use wodc::timeline::{build_timeline, Event};

fn first_line(ast: &wodc::ast::Program) -> &wodc::ast::Line {
    let Segment::Block(b) = &ast.program[0] else {
        panic!("expected a BLOCK segment")
    };
    match &b.stmts[0] {
        Stmt::Line(l) => l,
        Stmt::Slot(s) => &s.line,
    }
}

const RESOLVED_LINE_SOURCES: &[&str] = &[
    "BLOCK FT {\n 10 wall_balls;\n}\n",
    "BLOCK FT {\n 5 deadlift @135kg SYNC @shared;\n}\n",
    "BLOCK FT {\n 400m run;\n}\n",
    "BLOCK FT {\n 90s plank;\n}\n",
    "BLOCK FT {\n 12 cal row @each;\n}\n",
];

#[test]
fn invariant_1_render_then_reparse_is_structurally_stable() {
    for src in RESOLVED_LINE_SOURCES {
        let mut ast = parse_program(src).unwrap();
        resolve(&mut ast, None, "RX", Gender::Male);
        let rendered = render_line(first_line(&ast));
        let wrapped = format!("BLOCK FT {{\n {rendered};\n}}\n");
        let reparsed = parse_program(&wrapped).unwrap();
        assert_eq!(
            first_line(&reparsed),
            first_line(&ast),
            "rendering {:?} then reparsing should round-trip",
            rendered
        );
    }
}

#[test]
fn invariant_2_resolve_is_idempotent() {
    let srcs = [
        "BLOCK FT {\n 15/12 cal row;\n 10 wb;\n 400/300m run;\n}\n",
        "BLOCK FT {\n 5 deadlift @135/95kg;\n}\n",
    ];
    for src in srcs {
        let mut ast = parse_program(src).unwrap();
        resolve(&mut ast, None, "RX", Gender::Male);
        let once = ast.clone();
        resolve(&mut ast, None, "RX", Gender::Male);
        assert_eq!(ast, once, "a second resolve pass must change nothing");
    }
}

#[test]
fn invariant_3_no_dual_kinds_survive_resolution() {
    let mut ast = parse_program(
        "BLOCK FT {\n 15/12 cal row;\n 400/300m run;\n 10/8 burpees;\n 5 deadlift @135/95kg;\n}\n",
    )
    .unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let Segment::Block(b) = &ast.program[0] else {
        panic!()
    };
    for stmt in &b.stmts {
        let line = match stmt {
            Stmt::Line(l) => l,
            Stmt::Slot(s) => &s.line,
        };
        if let Some(q) = &line.qty {
            assert!(!q.is_dual(), "qty {:?} should not be dual after resolve", q);
        }
        if let Some(l) = &line.load {
            assert!(!l.is_dual(), "load {:?} should not be dual after resolve", l);
        }
    }
}

#[test]
fn invariant_4_fmt_idempotence_and_shape() {
    let inputs = [
        "BLOCK FT {\n  10 wall_balls;\n\n\n  200m run;\n}\n\n",
        "",
        "\n\n\n",
        "WOD \"x\"   \nBLOCK FT {\n 10 run;\t\n}\n",
    ];
    for src in inputs {
        let once = normalize(src);
        let twice = normalize(&once);
        assert_eq!(once, twice, "normalize should be idempotent for {:?}", src);
        assert!(!once.contains("\n\n\n"));
        assert!(once.ends_with('\n'));
        assert!(!once.ends_with("\n\n") || once == "\n");
    }
}

#[test]
fn invariant_5_fmt_preserves_semantics() {
    let src = "WOD \"Test\"  \n\n\nBLOCK FT {\n 10 wall_balls;\n\n\n 200m run;\n}\n\n\n";
    let before = parse_program(src).unwrap();
    let after = parse_program(&normalize(src)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn invariant_6_timeline_timestamps_never_decrease() {
    let src = "BUYIN {\n 1 run;\n}\nREST 30s\nBLOCK RFT 3 {\n 10 wall_balls;\n 200m run;\n}\nCASHOUT {\n 1 run;\n}\n";
    let mut ast = parse_program(src).unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let events = build_timeline(&ast);
    let mut last = i64::MIN;
    for e in &events {
        assert!(e.t() >= last, "timeline timestamps must be non-decreasing");
        last = e.t();
    }
}

#[test]
fn invariant_7_emom_emits_exactly_floor_duration_over_60_slots() {
    let mut ast = parse_program(
        "BLOCK EMOM 5:00 {\n 1: 10 wall_balls;\n 2: 8 box_jumps;\n 3: 12 cal row;\n}\n",
    )
    .unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let events = build_timeline(&ast);
    let slots: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            Event::NextSlot { slot, .. } => Some(*slot),
            _ => None,
        })
        .collect();
    // duration=300s -> 5 minutes, 3 slots -> rotation 1,2,3,1,2
    assert_eq!(slots, vec![1, 2, 3, 1, 2]);
}

#[test]
fn invariant_8_amrap_end_block_sits_at_start_plus_duration() {
    let mut ast =
        parse_program("REST 10s\nBLOCK AMRAP 2:00 {\n 10 burpees;\n}\n").unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let events = build_timeline(&ast);
    let start = events
        .iter()
        .find_map(|e| match e {
            Event::StartBlock { t, .. } => Some(*t),
            _ => None,
        })
        .unwrap();
    let end = events
        .iter()
        .find_map(|e| match e {
            Event::EndBlock { t } => Some(*t),
            _ => None,
        })
        .unwrap();
    assert_eq!(end, start + 120);
}
