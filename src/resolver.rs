//! The resolver: normalizes movement aliases, picks a gender branch out
//! of every dual-valued quantity/load, and fills catalog defaults.
//!
//! Runs once, in place, over an AST the parser already built. Must run
//! before the linter (alias rewrites become `W050` warnings) and before
//! the timeline synthesizer (pace estimation needs resolved quantities).

use fnv::{FnvHashMap, FnvHashSet};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::ast::*;
use crate::catalog::{Catalog, Gender, MovementEntry};

lazy_static! {
    static ref ALIASES: FnvHashMap<&'static str, &'static str> = {
        let mut m = FnvHashMap::default();
        m.insert("wb", "wall_balls");
        m.insert("wallball", "wall_balls");
        m.insert("bj", "box_jumps");
        m.insert("box_jump", "box_jumps");
        m.insert("pu", "pullups");
        m.insert("pull_up", "pullups");
        m.insert("rr", "ring_rows");
        m.insert("ring_row", "ring_rows");
        m.insert("t2b", "toes_to_bar");
        m.insert("ttb", "toes_to_bar");
        m.insert("du", "double_unders");
        m.insert("dus", "double_unders");
        m.insert("double_under", "double_unders");
        m.insert("echo_bike", "bike");
        m.insert("bbjo", "burpee_box_jump_over");
        m.insert("bjo", "burpee_box_jump_over");
        m.insert("burpee_box_jumps", "burpee_box_jump_over");
        m.insert("rc", "rope_climbs");
        m.insert("rope_climb", "rope_climbs");
        m.insert("pc", "power_clean");
        m.insert("cleans", "clean");
        m.insert("sb_carry", "sandbag_carry");
        m.insert("burpee", "burpees");
        m
    };
    static ref KNOWN_MOVEMENTS: FnvHashSet<&'static str> = {
        let mut s = FnvHashSet::default();
        for mv in [
            "wall_balls",
            "box_jumps",
            "run",
            "thrusters",
            "pullups",
            "ring_rows",
            "bike",
            "burpees",
            "sandbag_carry",
            "hollow_hold",
            "toes_to_bar",
            "row",
            "double_unders",
            "clean",
            "rope_climbs",
            "burpee_box_jump_over",
            "power_clean",
            "assault_bike",
        ] {
            s.insert(mv);
        }
        s
    };
    static ref RE_DUAL_LOAD: Regex =
        Regex::new(r"^(\d+(?:\.\d+)?)/(\d+(?:\.\d+)?)(kg|lb|cm|in|m|km|%)$").unwrap();
    /// The catalog's string-shaped load defaults only ever use this
    /// narrower set of units (no `km`/`%`, no dual form).
    static ref RE_CATALOG_LOAD: Regex = Regex::new(r"^(\d+(?:\.\d+)?)(kg|lb|cm|in|m)$").unwrap();
}

pub fn is_known_movement(mv: &str) -> bool {
    KNOWN_MOVEMENTS.contains(mv)
}

fn pick<T: Copy>(a: T, b: T, gender: Gender) -> T {
    match gender {
        Gender::Male => a,
        Gender::Female => b,
    }
}

fn resolve_qty(q: Qty, gender: Gender) -> Qty {
    match q {
        Qty::DualReps { a, b } => Qty::Reps {
            value: pick(a, b, gender),
        },
        Qty::DualCal { a, b } => Qty::Cal {
            value: pick(a, b, gender),
        },
        Qty::DualDistance { a, b } => Qty::Distance {
            value: pick(a, b, gender),
        },
        other => other,
    }
}

fn resolve_load(l: Load, gender: Gender) -> Load {
    match l {
        Load::Dual { a, b } => match gender {
            Gender::Male => *a,
            Gender::Female => *b,
        },
        Load::Raw { value } => {
            if let Some(c) = RE_DUAL_LOAD.captures(&value) {
                let a: f64 = c[1].parse().unwrap();
                let b: f64 = c[2].parse().unwrap();
                let unit = &c[3];
                let picked = pick(a, b, gender);
                if let Some(resolved) = Load::from_magnitude_unit(picked, unit) {
                    return resolved;
                }
            }
            Load::Raw { value }
        }
        other => other,
    }
}

fn catalog_load_value(v: &Value) -> Option<Load> {
    match v {
        Value::String(s) => {
            let c = RE_CATALOG_LOAD.captures(s)?;
            let val: f64 = c[1].parse().ok()?;
            Load::from_magnitude_unit(val, &c[2])
        }
        Value::Object(_) => serde_json::from_value(v.clone()).ok(),
        _ => None,
    }
}

fn apply_catalog_line(line: &mut Line, entry: &MovementEntry, track_key: &str, gender: Gender) {
    let needs_qty = match &line.qty {
        None => true,
        Some(Qty::Distance { value }) if *value == 0.0 => true,
        _ => false,
    };
    if needs_qty {
        if let Some(v) = entry.reps.get(track_key).and_then(|g| g.get(gender)) {
            line.qty = Some(Qty::Reps { value: *v as i64 });
        } else if let Some(v) = entry.distance.get(track_key).and_then(|g| g.get(gender)) {
            line.qty = Some(Qty::Distance { value: *v });
        } else if let Some(v) = entry.cal.get(track_key).and_then(|g| g.get(gender)) {
            line.qty = Some(Qty::Cal { value: *v });
        }
    }
    if line.load.is_none() {
        if let Some(v) = entry.load.get(track_key).and_then(|g| g.get(gender)) {
            if let Some(load) = catalog_load_value(v) {
                line.load = Some(load);
            }
        }
    }
}

fn resolve_line(
    line: &mut Line,
    catalog: Option<&Catalog>,
    track_key: &str,
    gender: Gender,
    notes: &mut Vec<AliasNote>,
) {
    if let Some(&canon) = ALIASES.get(line.movement.as_str()) {
        if canon != line.movement {
            notes.push(AliasNote::new(line.movement.clone(), canon));
            line.movement = canon.to_string();
        }
    }
    if let Some(q) = line.qty.take() {
        line.qty = Some(resolve_qty(q, gender));
    }
    if let Some(l) = line.load.take() {
        line.load = Some(resolve_load(l, gender));
    }
    if let Some(cat) = catalog {
        if let Some(entry) = cat.movement(&line.movement) {
            apply_catalog_line(line, entry, track_key, gender);
        }
    }
}

/// Resolves `ast` in place against the given `catalog` (if any), `track`,
/// and `gender`. Idempotent: calling this twice on the same AST leaves it
/// unchanged after the first call.
pub fn resolve(ast: &mut Program, catalog: Option<&Catalog>, track: &str, gender: Gender) {
    let track_key = track.to_lowercase();
    let mut notes = Vec::new();
    for seg in ast.program.iter_mut() {
        match seg {
            Segment::Buyin { stmts } | Segment::Cashout { stmts } => {
                for line in stmts.iter_mut() {
                    resolve_line(line, catalog, &track_key, gender, &mut notes);
                }
            }
            Segment::Block(b) => {
                for stmt in b.stmts.iter_mut() {
                    match stmt {
                        Stmt::Line(l) => resolve_line(l, catalog, &track_key, gender, &mut notes),
                        Stmt::Slot(s) => {
                            resolve_line(&mut s.line, catalog, &track_key, gender, &mut notes)
                        }
                    }
                }
            }
            Segment::Rest { .. } | Segment::TrackBlock { .. } => {}
        }
    }
    // Mirrors a dict `setdefault`: only populated the first time through,
    // so a second resolve pass (which finds nothing left to alias) does
    // not erase notes already recorded.
    if ast.meta.normalized.is_empty() {
        ast.meta.normalized = notes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn seed_6_dual_cal_female_branch() {
        let mut ast = parse_program("BLOCK FT {\n 15/12 cal row;\n}\n").unwrap();
        resolve(&mut ast, None, "RX", Gender::Female);
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        let Stmt::Line(l) = &b.stmts[0] else { panic!() };
        assert_eq!(l.qty, Some(Qty::Cal { value: 12.0 }));
    }

    #[test]
    fn seed_7_alias_rewrite_recorded() {
        let mut ast = parse_program("BLOCK FT {\n 10 wb;\n}\n").unwrap();
        resolve(&mut ast, None, "RX", Gender::Male);
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        let Stmt::Line(l) = &b.stmts[0] else { panic!() };
        assert_eq!(l.movement, "wall_balls");
        assert_eq!(ast.meta.normalized.len(), 1);
        assert_eq!(ast.meta.normalized[0].code, "W050");
        assert_eq!(ast.meta.normalized[0].from, "wb");
        assert_eq!(ast.meta.normalized[0].to, "wall_balls");
    }

    #[test]
    fn resolve_is_idempotent() {
        let mut ast = parse_program("BLOCK FT {\n 15/12 cal row;\n 10 wb;\n}\n").unwrap();
        resolve(&mut ast, None, "RX", Gender::Male);
        let once = ast.clone();
        resolve(&mut ast, None, "RX", Gender::Male);
        assert_eq!(ast, once);
    }

    #[test]
    fn catalog_fills_missing_qty_and_load() {
        let json = r#"{
            "movements": {
                "row": {
                    "cal": { "rx": { "male": 20, "female": 15 } },
                    "load": { "rx": { "male": "2000m" } }
                }
            }
        }"#;
        let cat: Catalog = serde_json::from_str(json).unwrap();
        let mut ast = parse_program("BLOCK FT {\n row;\n}\n").unwrap();
        resolve(&mut ast, Some(&cat), "RX", Gender::Male);
        let Segment::Block(b) = &ast.program[0] else {
            panic!()
        };
        let Stmt::Line(l) = &b.stmts[0] else { panic!() };
        assert_eq!(l.qty, Some(Qty::Cal { value: 20.0 }));
        assert_eq!(l.load, Some(Load::Distance { value: 2000.0 }));
    }
}
