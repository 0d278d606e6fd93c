//! Line pretty-printing, shared by timeline prompts and the export
//! surfaces. Operates on resolved lines only — a dual `qty`/`load` has
//! no defined rendering and will print via its raw fallback text.

use itertools::Itertools;

use crate::ast::{Flag, Line, Load, Qty};

/// `s < 3600` seconds renders `mm:ss`; otherwise `hh:mm:ss`, zero-padded.
pub fn hhmmss(total_seconds: i64) -> String {
    let (m, sec) = (total_seconds.div_euclid(60), total_seconds.rem_euclid(60));
    let (h, m) = (m.div_euclid(60), m.rem_euclid(60));
    if h > 0 {
        format!("{h:02}:{m:02}:{sec:02}")
    } else {
        format!("{m:02}:{sec:02}")
    }
}

fn qty_text(qty: &Qty) -> String {
    match qty {
        Qty::Reps { value } => format!("{value} "),
        Qty::Cal { value } => format!("{value} cal ", value = fmt_num(*value)),
        Qty::Distance { value } => format!("{}m ", *value as i64),
        Qty::Time { value } => format!("{} ", hhmmss(*value)),
        // Dual kinds never survive the resolver; render nothing rather
        // than guess a branch.
        Qty::DualReps { .. } | Qty::DualCal { .. } | Qty::DualDistance { .. } => String::new(),
    }
}

fn load_text(load: &Load) -> String {
    match load {
        Load::Weight { value, unit } => format!(" @{}{}", *value as i64, unit.as_str()),
        Load::Height { value, unit } => format!(" @{}{}", *value as i64, unit.as_str()),
        Load::Distance { value } => format!(" @{}m", *value as i64),
        Load::PercentRaw { value } => format!(" @{}%", *value as i64),
        Load::Dual { .. } | Load::Raw { .. } => String::new(),
    }
}

fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Renders one line as `[qty ][movement][ @load][ flags]`, trimmed.
pub fn render_line(line: &Line) -> String {
    let qtxt = line.qty.as_ref().map(qty_text).unwrap_or_default();
    let ltxt = line.load.as_ref().map(load_text).unwrap_or_default();
    let flags = line.flags.iter().map(Flag::as_str).join(" ");
    let mut out = format!("{qtxt}{}{ltxt}", line.movement);
    if !flags.is_empty() {
        out.push(' ');
        out.push_str(&flags);
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Flags, WeightUnit};

    #[test]
    fn hhmmss_under_an_hour() {
        assert_eq!(hhmmss(65), "01:05");
    }

    #[test]
    fn hhmmss_over_an_hour() {
        assert_eq!(hhmmss(3661), "01:01:01");
    }

    #[test]
    fn renders_reps_with_weight() {
        let line = Line {
            qty: Some(Qty::Reps { value: 10 }),
            movement: "deadlift".to_string(),
            load: Some(Load::Weight {
                value: 135.0,
                unit: WeightUnit::Kg,
            }),
            flags: Flags::new(),
        };
        assert_eq!(render_line(&line), "10 deadlift @135kg");
    }

    #[test]
    fn renders_distance_in_whole_meters() {
        let mut line = Line::new("run");
        line.qty = Some(Qty::Distance { value: 400.0 });
        assert_eq!(render_line(&line), "400m run");
    }

    #[test]
    fn renders_time_quantity() {
        let mut line = Line::new("plank");
        line.qty = Some(Qty::Time { value: 90 });
        assert_eq!(render_line(&line), "01:30 plank");
    }
}
