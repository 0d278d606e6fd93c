//! The `wodc` binary: argument parsing, file I/O, and exit codes. All
//! pipeline logic lives in the library (`wodc::*`); this shell only
//! wires the five subcommands in `cli` to it.

use std::fs;
use std::io::Write;
use std::process::ExitCode;

use log::debug;

use wodc::catalog::{Catalog, Gender};
use wodc::cli::{self, Command, ResolveArgs};
use wodc::{ast::Program, diag, export, fmt as fmt_mod, linter, parser, resolver, timeline};

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    // `simple_logger::init_with_level` can only be called once per
    // process; tests never call `main`, so this is safe here.
    let _ = simple_logger::init_with_level(match level {
        log::LevelFilter::Debug => log::Level::Debug,
        _ => log::Level::Warn,
    });
}

/// Parses and resolves `path` against `resolve`, returning the AST or a
/// rendered parse-error message suitable for printing to stderr.
fn parse_and_resolve(path: &str, resolve: &ResolveArgs) -> Result<Program, String> {
    let src = fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
    let mut ast = parser::parse_program(&src).map_err(|e| diag::render_parse_error(path, &src, &e))?;

    let catalog = match &resolve.catalog {
        Some(p) => match Catalog::load(p) {
            Ok(c) => Some(c),
            Err(e) => return Err(format!("{e}")),
        },
        None => None,
    };
    let gender = Gender::parse(&resolve.gender)
        .ok_or_else(|| format!("unrecognized gender '{}'", resolve.gender))?;

    debug!(
        "resolving {path} against track={} gender={}",
        resolve.track, resolve.gender
    );
    resolver::resolve(&mut ast, catalog.as_ref(), &resolve.track, gender);
    Ok(ast)
}

fn write_output(out: &Option<std::path::PathBuf>, text: &str) -> Result<(), String> {
    match out {
        Some(p) => fs::write(p, text).map_err(|e| format!("{}: {e}", p.display())),
        None => {
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
            Ok(())
        }
    }
}

fn run_parse(
    file: std::path::PathBuf,
    out: Option<std::path::PathBuf>,
    resolve: ResolveArgs,
) -> ExitCode {
    let path = file.display().to_string();
    match parse_and_resolve(&path, &resolve) {
        Ok(ast) => match export::json::to_json(&ast) {
            Ok(json) => match write_output(&out, &format!("{json}\n")) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("failed to serialize AST: {e}");
                ExitCode::FAILURE
            }
        },
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run_lint(file: std::path::PathBuf, resolve: ResolveArgs) -> ExitCode {
    let path = file.display().to_string();
    match parse_and_resolve(&path, &resolve) {
        Ok(ast) => {
            let diags = linter::lint(&ast);
            for d in &diags {
                println!("{}", diag::format_diagnostic(d));
            }
            if linter::has_errors(&diags) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run_run(file: std::path::PathBuf, format: String, resolve: ResolveArgs) -> ExitCode {
    let path = file.display().to_string();
    match parse_and_resolve(&path, &resolve) {
        Ok(ast) => {
            let events = timeline::build_timeline(&ast);
            match format.as_str() {
                "json" => match serde_json::to_string_pretty(&events) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        eprintln!("failed to serialize timeline: {e}");
                        return ExitCode::FAILURE;
                    }
                },
                _ => {
                    for e in &events {
                        let mut v = match serde_json::to_value(e) {
                            Ok(v) => v,
                            Err(err) => {
                                eprintln!("failed to serialize event: {err}");
                                return ExitCode::FAILURE;
                            }
                        };
                        if let Some(obj) = v.as_object_mut() {
                            obj.remove("t");
                            obj.remove("type");
                        }
                        let rest_empty = v.as_object().is_some_and(|obj| obj.is_empty());
                        let (m, sec) = (e.t().div_euclid(60), e.t().rem_euclid(60));
                        if rest_empty {
                            println!("{m:02}:{sec:02} {}", e.type_name());
                        } else {
                            println!("{m:02}:{sec:02} {} {v}", e.type_name());
                        }
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run_export(
    file: std::path::PathBuf,
    to: String,
    out: std::path::PathBuf,
    resolve: ResolveArgs,
) -> ExitCode {
    let path = file.display().to_string();
    match parse_and_resolve(&path, &resolve) {
        Ok(ast) => {
            let text = match to.as_str() {
                "json" => match export::json::to_json(&ast) {
                    Ok(j) => j,
                    Err(e) => {
                        eprintln!("failed to serialize AST: {e}");
                        return ExitCode::FAILURE;
                    }
                },
                "ics" => export::ics::to_ics(&ast, &path),
                "html" => export::html::to_html(&ast),
                other => {
                    eprintln!("unrecognized export target '{other}'");
                    return ExitCode::FAILURE;
                }
            };
            match fs::write(&out, text) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{}: {e}", out.display());
                    ExitCode::FAILURE
                }
            }
        }
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run_fmt(
    file: std::path::PathBuf,
    in_place: bool,
    out: Option<std::path::PathBuf>,
) -> ExitCode {
    let path = file.display().to_string();
    let src = match fs::read_to_string(&file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = parser::parse_program(&src) {
        eprintln!("{}", diag::render_parse_error(&path, &src, &e));
        return ExitCode::from(2);
    }
    let normalized = fmt_mod::normalize(&src);
    let result = if in_place {
        fs::write(&file, &normalized).map_err(|e| format!("{path}: {e}"))
    } else {
        write_output(&out, &normalized)
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = cli::parse_args();
    init_logging(cli.verbose);

    // `write_output` prints a trailing newline it adds itself when
    // writing to stdout; flush stdout/stderr explicitly so piped output
    // (e.g. in a test harness) never gets buffered past process exit.
    let code = match cli.command {
        Command::Parse { file, out, resolve } => run_parse(file, out, resolve),
        Command::Lint { file, resolve } => run_lint(file, resolve),
        Command::Run { file, format, resolve } => run_run(file, format, resolve),
        Command::Export { file, to, out, resolve } => run_export(file, to, out, resolve),
        Command::Fmt { file, in_place, out } => run_fmt(file, in_place, out),
    };
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
    code
}
