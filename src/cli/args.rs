//! Zero-dependency argument parser for ci-gate.
//!
//! Handles command line argument parsing without external dependencies.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Command to execute
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Command {
    /// Run the gate (default)
    #[default]
    Run,
    /// List configured checks
    List,
    /// Print version information
    Version,
}

/// Output format selection
#[derive(Debug, Clone, PartialEq, Default)]
pub enum OutputFormat {
    /// Verdict line (plus a check table with --verbose)
    #[default]
    Text,
    /// Machine-readable JSON
    #[cfg(feature = "json")]
    Json,
    /// JUnit XML for CI/CD integration
    #[cfg(feature = "junit")]
    Junit,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            #[cfg(feature = "json")]
            "json" => Ok(OutputFormat::Json),
            #[cfg(feature = "junit")]
            "junit" => Ok(OutputFormat::Junit),
            _ => Err(format!(
                "Unknown output format: '{}'. Valid formats: {}",
                s,
                OutputFormat::valid_names().join(", ")
            )),
        }
    }
}

impl OutputFormat {
    /// Names accepted by `--format` in this build
    pub fn valid_names() -> Vec<&'static str> {
        let mut names = vec!["text"];
        if cfg!(feature = "json") {
            names.push("json");
        }
        if cfg!(feature = "junit") {
            names.push("junit");
        }
        names
    }
}

/// Parsed command line arguments
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Command to execute
    pub command: Command,
    /// Specific checks to run (by ID)
    pub only: Vec<String>,
    /// Specific checks to skip (by ID)
    pub skip: Vec<String>,
    /// Output format
    pub format: OutputFormat,
    /// Verbose mode (check table and debug logging)
    pub verbose: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Default per-check timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Capture check output into the report
    pub capture: bool,
    /// Configuration file path
    pub config: Option<PathBuf>,
    /// Gate root directory
    pub root: Option<PathBuf>,
    /// Show help
    pub help: bool,
}

impl Args {
    /// Parse command line arguments from std::env::args()
    pub fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().skip(1).collect();
        Self::parse_from(&args)
    }

    /// Parse command line arguments from a slice, reading overrides from
    /// the process environment
    pub fn parse_from(args: &[String]) -> Result<Self, String> {
        Self::parse_with_env(args, |name| env::var(name).ok())
    }

    /// Parse command line arguments with an explicit environment lookup.
    ///
    /// Environment values are applied first so flags can override them.
    pub fn parse_with_env<F>(args: &[String], lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut result = Args::default();

        // Empty values count as unset
        let lookup = |name: &str| lookup(name).filter(|value| !value.is_empty());

        if lookup("NO_COLOR").is_some() {
            result.no_color = true;
        }
        if let Some(format) = lookup("CI_GATE_FORMAT") {
            result.format = format.parse()?;
        }
        if let Some(verbose) = lookup("CI_GATE_VERBOSE") {
            result.verbose = is_truthy(&verbose);
        }
        if let Some(config) = lookup("CI_GATE_CONFIG") {
            result.config = Some(PathBuf::from(config));
        }

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];

            match arg.as_str() {
                // Commands
                "run" => result.command = Command::Run,
                "list" => result.command = Command::List,
                "version" => result.command = Command::Version,

                // Help flags
                "-h" | "--help" => result.help = true,
                "-V" | "--version" => result.command = Command::Version,

                // Selection
                "--only" => result.only.push(take_value(args, &mut i, "--only requires a check ID")?),
                "--skip" => result.skip.push(take_value(args, &mut i, "--skip requires a check ID")?),

                // Output options
                "--format" => {
                    result.format = take_value(args, &mut i, "--format requires a format name")?.parse()?;
                }
                "-v" | "--verbose" => result.verbose = true,
                "--no-color" => result.no_color = true,

                // Behavior options
                "--timeout" => {
                    let value = take_value(args, &mut i, "--timeout requires a value in milliseconds")?;
                    result.timeout_ms = Some(parse_timeout(&value)?);
                }
                "--capture" => result.capture = true,

                // Configuration options
                "--config" => {
                    result.config = Some(PathBuf::from(take_value(args, &mut i, "--config requires a file path")?));
                }
                "--root" => {
                    result.root = Some(PathBuf::from(take_value(args, &mut i, "--root requires a directory")?));
                }

                // Handle --option=value syntax
                _ if arg.starts_with("--only=") => result.only.push(arg["--only=".len()..].to_string()),
                _ if arg.starts_with("--skip=") => result.skip.push(arg["--skip=".len()..].to_string()),
                _ if arg.starts_with("--format=") => result.format = arg["--format=".len()..].parse()?,
                _ if arg.starts_with("--timeout=") => {
                    result.timeout_ms = Some(parse_timeout(&arg["--timeout=".len()..])?);
                }
                _ if arg.starts_with("--config=") => {
                    result.config = Some(PathBuf::from(&arg["--config=".len()..]));
                }
                _ if arg.starts_with("--root=") => {
                    result.root = Some(PathBuf::from(&arg["--root=".len()..]));
                }

                // Unknown argument
                _ if arg.starts_with('-') => {
                    return Err(format!("Unknown option: '{}'", arg));
                }
                _ => {
                    return Err(format!("Unexpected argument: '{}'", arg));
                }
            }

            i += 1;
        }

        Ok(result)
    }
}

/// Consume the value following the option at `args[*i]`.
fn take_value(args: &[String], i: &mut usize, missing: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i).cloned().ok_or_else(|| missing.to_string())
}

/// `0`, `false`, `no` and `off` (any case) are false; anything else is true.
fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_timeout(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => Err(format!("Invalid timeout value: '{}'", value)),
        Ok(ms) => Ok(ms),
    }
}
