use anyhow::Context;
use cesu8conv::{
    DEFAULT_BUFFER_CAPACITY, Direction, MAX_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY,
    TranscodeSettings,
};
use clap::{Arg, ArgAction, ArgMatches, Command};
use indoc::indoc;
use log::{LevelFilter, debug};

use std::fs::File;
use std::io::{self, Read};
use std::process::exit;

mod error;
mod output;
mod stderr_sink;

use error::CliError;
use output::Output;
use stderr_sink::StderrSink;

/// One command line item. Options apply to the inputs that follow them.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Direction(Direction),
    Fix,
    Verbose,
    Silent,
    SilentIo,
    Output(String),
    Input(String),
}

#[derive(Debug, Clone, Copy, Default)]
struct Options {
    direction: Direction,
    fix: bool,
    verbose: bool,
    silent: bool,
    silent_io: bool,
}

struct Cesu8 {
    options: Options,
    buffer_capacity: usize,
    output: Option<Output>,
    inputs_seen: usize,
}

impl Cesu8 {
    fn new(buffer_capacity: usize) -> Self {
        Cesu8 {
            options: Options::default(),
            buffer_capacity,
            output: Some(Output::stdout()),
            inputs_seen: 0,
        }
    }

    fn run(&mut self, steps: Vec<Step>) -> Result<(), CliError> {
        for step in steps {
            match step {
                Step::Direction(direction) => self.options.direction = direction,
                Step::Fix => self.options.fix = true,
                Step::Verbose => self.options.verbose = true,
                Step::Silent => self.options.silent = true,
                Step::SilentIo => {
                    self.options.silent = true;
                    self.options.silent_io = true;
                }
                Step::Output(path) => self.redirect(&path)?,
                Step::Input(path) => self.convert(&path)?,
            }
        }

        // Going back to stdout closes the last `-o` file.
        self.redirect("-")
    }

    fn redirect(&mut self, path: &str) -> Result<(), CliError> {
        if let Some(previous) = self.output.take() {
            let name = previous.name().to_owned();
            previous
                .close()
                .map_err(|source| CliError::CloseOutput { path: name, source })?;
        }

        let output = Output::create(path).map_err(|source| CliError::OpenOutput {
            path: path.to_owned(),
            source,
        })?;
        self.output = Some(output);

        Ok(())
    }

    fn convert(&mut self, input: &str) -> Result<(), CliError> {
        self.inputs_seen += 1;

        let source: Box<dyn Read> = if input == "-" {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(input).map_err(|source| CliError::OpenInput {
                path: input.to_owned(),
                source,
            })?;
            Box::new(file)
        };

        let settings = TranscodeSettings::new()
            .direction(self.options.direction)
            .fix(self.options.fix)
            .buffer_capacity(self.buffer_capacity);
        let diagnostics = StderrSink::new(!self.options.silent, self.options.verbose);

        let output = self.output.get_or_insert_with(Output::stdout);
        match cesu8conv::transcode(source, &mut *output, &settings, diagnostics) {
            Ok(summary) => {
                debug!("{input}: {summary:?}");
                Ok(())
            }
            Err(e) => Err(CliError::from_transcode(e, input, output.describe())),
        }
    }
}

fn ordered_steps(matches: &ArgMatches) -> Vec<Step> {
    let mut steps: Vec<(usize, Step)> = Vec::new();

    let flags = [
        ("u2c", Step::Direction(Direction::Expand)),
        ("c2u", Step::Direction(Direction::Contract)),
        ("fix", Step::Fix),
        ("verbose", Step::Verbose),
        ("silent", Step::Silent),
        ("silent-io", Step::SilentIo),
    ];
    for (id, step) in flags {
        if let Some(indices) = matches.indices_of(id) {
            steps.extend(indices.map(|idx| (idx, step.clone())));
        }
    }

    let valued: [(&str, fn(String) -> Step); 2] = [("output", Step::Output), ("INPUT", Step::Input)];
    for (id, make_step) in valued {
        if let (Some(indices), Some(values)) =
            (matches.indices_of(id), matches.get_many::<String>(id))
        {
            steps.extend(indices.zip(values.cloned().map(make_step)));
        }
    }

    steps.sort_by_key(|(idx, _)| *idx);
    steps.into_iter().map(|(_, step)| step).collect()
}

/// A switch that may be repeated and whose every occurrence is kept, so its position can be
/// compared with the inputs around it. `require_equals` stops it from taking the next input
/// as its value.
fn ordered_flag(id: &'static str) -> Arg {
    Arg::new(id)
        .action(ArgAction::Append)
        .num_args(0..=1)
        .require_equals(true)
        .default_missing_value("true")
        .value_parser(["true"])
        .hide_possible_values(true)
}

fn command() -> Command {
    Command::new("cesu8")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts CESU-8 file(s) to UTF-8. Does inverse conversion if -i specified.")
        .after_help(indoc!(
            r#"
            The file named '-' means stdin. Converted output is written to stdout (but see -o).

            Note: An option affects processing of file(s) that follow it.
            Note: Conversion is done without checking the file's encoding!
            If the file is already UTF-8 (or CESU-8 in case of -i), no codes are modified.
            Unpaired surrogate fixing (-f) is possible at CESU-8 to UTF-8 conversion only.
            (Running 'cesu8 -f' on a UTF-8 file fixes unpaired surrogates in that text,
             too, no other text modifications are done.)
            Invalid 4-byte code fixing is possible at UTF-8 to CESU-8 conversion (-i) only.
            "#
        ))
        .arg(
            ordered_flag("u2c")
                .short('i')
                .long("u2c")
                .help("Convert UTF-8 to CESU-8; i.e. inverse conversion"),
        )
        .arg(
            ordered_flag("c2u")
                .long("c2u")
                .help("Convert CESU-8 to UTF-8 (this is the default)"),
        )
        .arg(
            ordered_flag("fix")
                .short('f')
                .long("fix")
                .help("Fix unpaired surrogates and invalid 4-byte codes: convert them to '?'"),
        )
        .arg(
            ordered_flag("verbose")
                .short('v')
                .help("Verbose mode: report converted codes"),
        )
        .arg(
            ordered_flag("silent")
                .short('s')
                .help("Silent mode: don't report encoding warnings"),
        )
        .arg(
            ordered_flag("silent-io")
                .short('S')
                .help("Silent mode: don't report file I/O errors and encoding warnings"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .value_name("FILE")
                .action(ArgAction::Append)
                .help("Write output to <FILE>, not stdout. Closes the previous output file."),
        )
        .arg(
            Arg::new("buffer-size")
                .long("buffer-size")
                .value_name("BYTES")
                .value_parser(
                    clap::value_parser!(u64)
                        .range(MIN_BUFFER_CAPACITY as u64..=MAX_BUFFER_CAPACITY as u64),
                )
                .help("Size of the read buffer (default: 4096)."),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_parser(["off", "error", "warn", "info", "debug", "trace"])
                .default_value("off")
                .help("Log level of the internal log, written to stderr."),
        )
        .arg(
            Arg::new("INPUT")
                .action(ArgAction::Append)
                .help("File(s) to convert"),
        )
}

fn try_to_initialize_logging(level: &str) {
    let level = match level {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => return,
    };

    if let Err(e) =
        simplelog::WriteLogger::init(level, simplelog::Config::default(), io::stderr())
            .context("Failed to initialize logging")
    {
        eprintln!("{e:#}");
    }
}

fn main() {
    let mut cmd = command();
    let matches = cmd.get_matches_mut();

    if let Some(level) = matches.get_one::<String>("log-level") {
        try_to_initialize_logging(level);
    }

    let buffer_capacity = matches
        .get_one::<u64>("buffer-size")
        .map_or(DEFAULT_BUFFER_CAPACITY, |&size| size as usize);

    let mut app = Cesu8::new(buffer_capacity);
    if let Err(e) = app.run(ordered_steps(&matches)) {
        if !app.options.silent_io {
            eprintln!("cesu8: Error: {e}");
            debug!("caused by: {}", root_cause(&e));
        }
        exit(e.exit_code());
    }

    if app.inputs_seen == 0 {
        eprint!("{}", cmd.render_help());
    }
}

/// The innermost cause, for logging.
fn root_cause(e: &CliError) -> String {
    let mut cause: &dyn std::error::Error = e;
    while let Some(next) = cause.source() {
        cause = next;
    }
    cause.to_string()
}
