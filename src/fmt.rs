//! Idempotent text normalization: the `fmt` subcommand's engine. Strips
//! trailing whitespace per line, collapses runs of blank lines to one,
//! and guarantees exactly one trailing newline. Never touches parsed
//! structure — it operates on raw source text, before lexing.

/// Normalizes `text`. Applying this twice is guaranteed to equal
/// applying it once (invariant 4): the output never contains three
/// consecutive newlines and always ends with exactly one.
pub fn normalize(text: &str) -> String {
    let mut out_lines: Vec<&str> = Vec::new();
    let mut prev_blank = false;
    for line in text.split('\n') {
        let trimmed = line.trim_end();
        let is_blank = trimmed.is_empty();
        if is_blank && prev_blank {
            continue;
        }
        out_lines.push(trimmed);
        prev_blank = is_blank;
    }
    let mut joined = out_lines.join("\n");
    while joined.ends_with('\n') {
        joined.pop();
    }
    joined.push('\n');
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    #[test]
    fn seed_10_collapses_blank_runs_and_is_idempotent() {
        let src = "BLOCK FT {\n  10 wall_balls;\n\n\n  200m run;\n}\n\n";
        let once = normalize(src);
        let twice = normalize(&once);
        assert_eq!(once, twice);
        assert!(!once.contains("\n\n\n"));
        assert!(once.ends_with('\n') && !once.ends_with("\n\n"));
    }

    #[test]
    fn strips_trailing_whitespace() {
        let normalized = normalize("WOD \"Test\"   \nBLOCK FT {  \n 10 run;\t\n}\n");
        assert!(!normalized.lines().any(|l| l != l.trim_end()));
    }

    #[test]
    fn invariant_5_preserves_parseable_semantics() {
        let src = "WOD \"Test\"  \n\n\nBLOCK FT {\n 10 wall_balls;\n\n\n 200m run;\n}\n\n\n";
        let before = parse_program(src).unwrap();
        let after = parse_program(&normalize(src)).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn empty_input_still_ends_with_one_newline() {
        assert_eq!(normalize(""), "\n");
        assert_eq!(normalize("\n\n\n"), "\n");
    }
}
