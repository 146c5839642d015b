//! ci-gate CLI entry point
//!
//! Runs the pipeline's external checks in order and passes only if all of
//! them pass.

use ci_gate::checks::resolve_checks;
use ci_gate::cli::args::{Args, Command, OutputFormat};
use ci_gate::cli::output::get_formatter;
use ci_gate::logging::init_tracing;
use ci_gate::version::get_build_info;
use ci_gate::{run_gate, RunConfig};

use std::io::IsTerminal;
use std::process::ExitCode;

/// Exit code for problems with the gate itself (arguments, configuration)
const EXIT_RUNTIME_ERROR: u8 = 2;

fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'ci-gate --help' for usage information.");
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);

    match args.command {
        Command::Version => {
            println!("{}", get_build_info());
            ExitCode::SUCCESS
        }
        Command::List => list_checks(&args),
        Command::Run => run(&args),
    }
}

fn print_help() {
    println!(
        r#"ci-gate - Run the pipeline checks and pass only if all of them pass

USAGE:
    ci-gate [COMMAND] [OPTIONS]

COMMANDS:
    run         Run the gate (default)
    list        List configured checks
    version     Print version information

SELECTION:
    --only <ID>     Run only the given check (repeatable)
    --skip <ID>     Skip the given check (repeatable)

OUTPUT OPTIONS:
    --format <FMT>  Output format: {formats}
    -v, --verbose   Print a check table before the verdict, enable debug logs
    --no-color      Disable colored output

BEHAVIOR OPTIONS:
    --timeout <MS>  Default per-check timeout in milliseconds (default: none)
    --capture       Capture check output into the report

CONFIGURATION:
    --config <FILE> Load configuration from TOML file
    --root <DIR>    Directory checks run in (default: current directory)

GENERAL:
    -h, --help      Print this help message
    -V, --version   Print version information

ENVIRONMENT:
    NO_COLOR, CI_GATE_FORMAT, CI_GATE_VERBOSE, CI_GATE_CONFIG,
    CI_GATE_TIMEOUT_MS, CI_GATE_LOG

EXIT CODES:
    0   All checks have passed
    1   Some checks have not passed
    2   Runtime error

EXAMPLES:
    ci-gate                          Run the workspace and examples checks
    ci-gate --only workspace         Run a single check
    ci-gate --format junit --capture > gate.xml"#,
        formats = OutputFormat::valid_names().join(", ")
    );
}

fn list_checks(args: &Args) -> ExitCode {
    let run_config = RunConfig::from_args(args);
    let config = match run_config.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    println!("Configured checks (in run order):");
    println!();
    for check in resolve_checks(&config, &run_config.root) {
        println!("  {:<12} {}", check.id, check.name);
        println!("  {:<12} {}", "", check.command_line());
        if !check.description.is_empty() {
            println!("  {:<12} {}", "", check.description);
        }
    }
    ExitCode::SUCCESS
}

fn run(args: &Args) -> ExitCode {
    let report = match run_gate(RunConfig::from_args(args)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let color = !args.no_color && std::io::stdout().is_terminal();
    let formatter = get_formatter(&args.format, !color, args.verbose);
    println!("{}", formatter.format(&report));

    // exit_code() is 0 or 1
    ExitCode::from(report.decision().exit_code() as u8)
}
