//! Black-box coverage of the ten seed scenarios, driven through the
//! public library API rather than any single module's internals.

use wodc::ast::{BlockHead, Qty, Segment, Stmt};
use wodc::catalog::Gender;
use wodc::linter::{self, Level};
use wodc::parser::parse_program;
use wodc::resolver::resolve;
use wodc::timeline::{build_timeline, Event};

#[test]
fn seed_1_minimal_program_has_expected_shape() {
    let ast = parse_program("WOD \"Test\"\nBLOCK FT {\n 10 wall_balls;\n}\n").unwrap();
    assert_eq!(ast.meta.title.as_deref(), Some("Test"));
    assert_eq!(ast.program.len(), 1);
    let Segment::Block(b) = &ast.program[0] else {
        panic!("expected a single BLOCK segment")
    };
    assert_eq!(b.head, BlockHead::Ft);
    let Stmt::Line(l) = &b.stmts[0] else {
        panic!("expected a bare line")
    };
    assert_eq!(l.movement, "wall_balls");
    assert_eq!(l.qty, Some(Qty::Reps { value: 10 }));
}

#[test]
fn seed_2_emom_without_duration_fails_to_parse() {
    assert!(parse_program("BLOCK EMOM { }\n").is_err());
}

#[test]
fn seed_3_emom_without_slots_lints_e020() {
    let mut ast = parse_program("BLOCK EMOM 2:00 {\n 10 burpees;\n}\n").unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let diags = linter::lint(&ast);
    assert!(diags.iter().any(|d| d.level == Level::Error && d.code == "E020"));
}

#[test]
fn seed_4_zero_duration_rest_lints_e010() {
    let mut ast = parse_program("BLOCK FT {\n 1 run;\n}\nREST 0s\n").unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let diags = linter::lint(&ast);
    assert!(diags.iter().any(|d| d.level == Level::Error && d.code == "E010"));
}

#[test]
fn seed_5_unknown_movement_lints_w001() {
    let mut ast = parse_program("BLOCK FT {\n 10 foobar;\n}\n").unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let diags = linter::lint(&ast);
    assert!(diags
        .iter()
        .any(|d| d.level == Level::Warning && d.code == "W001"));
}

#[test]
fn seed_6_dual_cal_selects_female_branch() {
    let mut ast = parse_program("BLOCK FT {\n 15/12 cal row;\n}\n").unwrap();
    resolve(&mut ast, None, "RX", Gender::Female);
    let Segment::Block(b) = &ast.program[0] else {
        panic!()
    };
    let Stmt::Line(l) = &b.stmts[0] else { panic!() };
    assert_eq!(l.qty, Some(Qty::Cal { value: 12.0 }));
}

#[test]
fn seed_7_alias_rewrite_becomes_w050() {
    let mut ast = parse_program("BLOCK FT {\n 10 wb;\n}\n").unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let Segment::Block(b) = &ast.program[0] else {
        panic!()
    };
    let Stmt::Line(l) = &b.stmts[0] else { panic!() };
    assert_eq!(l.movement, "wall_balls");
    let diags = linter::lint(&ast);
    assert!(diags
        .iter()
        .any(|d| d.level == Level::Warning && d.code == "W050"));
}

#[test]
fn seed_8_emom_two_slots_rotate_in_order() {
    let mut ast = parse_program(
        "BLOCK EMOM 2:00 {\n 1: 10 wall_balls;\n 2: 8 box_jumps;\n}\n",
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
    assert_eq!(slots, vec![1, 2]);
}

#[test]
fn seed_9_amrap_end_block_at_duration() {
    let mut ast = parse_program("BLOCK AMRAP 1:00 {\n 10 burpees;\n}\n").unwrap();
    resolve(&mut ast, None, "RX", Gender::Male);
    let events = build_timeline(&ast);
    let end = events
        .iter()
        .rev()
        .find_map(|e| match e {
            Event::EndBlock { t } => Some(*t),
            _ => None,
        })
        .unwrap();
    assert_eq!(end, 60);
}

#[test]
fn seed_10_fmt_twice_is_stable_and_tidy() {
    let src = "BLOCK FT {\n  10 wall_balls;\n\n\n  200m run;\n}\n\n";
    let once = wodc::fmt::normalize(src);
    let twice = wodc::fmt::normalize(&once);
    assert_eq!(once, twice);
    assert!(!once.contains("\n\n\n"));
    assert!(once.ends_with('\n') && !once.ends_with("\n\n"));
}
