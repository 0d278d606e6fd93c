//! Argument parsing for the `wodc` binary. Five subcommands; `--catalog`,
//! `--track`, and `--gender` are shared by every one of them except
//! `fmt`, which never touches the resolver.

use std::path::PathBuf;

use clap::{App, Arg, ArgMatches, SubCommand};

pub struct ResolveArgs {
    pub catalog: Option<PathBuf>,
    pub track: String,
    pub gender: String,
}

pub enum Command {
    Parse {
        file: PathBuf,
        out: Option<PathBuf>,
        resolve: ResolveArgs,
    },
    Lint {
        file: PathBuf,
        resolve: ResolveArgs,
    },
    Run {
        file: PathBuf,
        format: String,
        resolve: ResolveArgs,
    },
    Export {
        file: PathBuf,
        to: String,
        out: PathBuf,
        resolve: ResolveArgs,
    },
    Fmt {
        file: PathBuf,
        in_place: bool,
        out: Option<PathBuf>,
    },
}

pub struct Cli {
    pub verbose: bool,
    pub command: Command,
}

fn with_resolve_args<'a, 'b>(app: App<'a, 'b>) -> App<'a, 'b> {
    app.arg(Arg::with_name("catalog").long("catalog").takes_value(true))
        .arg(
            Arg::with_name("track")
                .long("track")
                .takes_value(true)
                .possible_values(&["RX", "INTERMEDIATE", "SCALED"])
                .default_value("RX"),
        )
        .arg(
            Arg::with_name("gender")
                .long("gender")
                .takes_value(true)
                .possible_values(&["male", "female"])
                .default_value("male"),
        )
}

fn resolve_args_from(m: &ArgMatches) -> ResolveArgs {
    ResolveArgs {
        catalog: m.value_of("catalog").map(PathBuf::from),
        track: m.value_of("track").unwrap_or("RX").to_string(),
        gender: m.value_of("gender").unwrap_or("male").to_string(),
    }
}

pub fn parse_args() -> Cli {
    let app = App::new("wodc")
        .version("0.1.0")
        .about("Compiler toolchain for the WOD workout DSL")
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("enable debug logging"),
        )
        .subcommand(with_resolve_args(
            SubCommand::with_name("parse")
                .about("parse and resolve a program, emitting its JSON AST")
                .arg(Arg::with_name("file").required(true))
                .arg(Arg::with_name("out").short("o").long("out").takes_value(true)),
        ))
        .subcommand(with_resolve_args(
            SubCommand::with_name("lint")
                .about("parse, resolve, and lint a program")
                .arg(Arg::with_name("file").required(true)),
        ))
        .subcommand(with_resolve_args(
            SubCommand::with_name("run")
                .about("build and print the execution timeline")
                .arg(Arg::with_name("file").required(true))
                .arg(
                    Arg::with_name("format")
                        .long("format")
                        .takes_value(true)
                        .possible_values(&["text", "json"])
                        .default_value("text"),
                ),
        ))
        .subcommand(with_resolve_args(
            SubCommand::with_name("export")
                .about("export a resolved program to json, ics, or html")
                .arg(Arg::with_name("file").required(true))
                .arg(
                    Arg::with_name("to")
                        .long("to")
                        .takes_value(true)
                        .possible_values(&["json", "ics", "html"])
                        .required(true),
                )
                .arg(
                    Arg::with_name("out")
                        .short("o")
                        .long("out")
                        .takes_value(true)
                        .required(true),
                ),
        ))
        .subcommand(
            SubCommand::with_name("fmt")
                .about("validate and normalize source text")
                .arg(Arg::with_name("file").required(true))
                .arg(
                    Arg::with_name("in_place")
                        .short("i")
                        .long("in-place")
                        .takes_value(false),
                )
                .arg(Arg::with_name("out").short("o").long("out").takes_value(true)),
        );

    let matches = app.get_matches();
    let verbose = matches.is_present("verbose");

    let command = match matches.subcommand() {
        ("parse", Some(m)) => Command::Parse {
            file: PathBuf::from(m.value_of("file").unwrap()),
            out: m.value_of("out").map(PathBuf::from),
            resolve: resolve_args_from(m),
        },
        ("lint", Some(m)) => Command::Lint {
            file: PathBuf::from(m.value_of("file").unwrap()),
            resolve: resolve_args_from(m),
        },
        ("run", Some(m)) => Command::Run {
            file: PathBuf::from(m.value_of("file").unwrap()),
            format: m.value_of("format").unwrap_or("text").to_string(),
            resolve: resolve_args_from(m),
        },
        ("export", Some(m)) => Command::Export {
            file: PathBuf::from(m.value_of("file").unwrap()),
            to: m.value_of("to").unwrap().to_string(),
            out: PathBuf::from(m.value_of("out").unwrap()),
            resolve: resolve_args_from(m),
        },
        ("fmt", Some(m)) => Command::Fmt {
            file: PathBuf::from(m.value_of("file").unwrap()),
            in_place: m.is_present("in_place"),
            out: m.value_of("out").map(PathBuf::from),
        },
        _ => unreachable!("clap requires a subcommand"),
    };

    Cli { verbose, command }
}
