//! Command-line interface for process-starter.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::process::Arguments;

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Executable to run (overrides config file).
    pub executable: Option<String>,
    /// Arguments following the executable, passed verbatim.
    pub arguments: Vec<String>,
    /// Pre-joined argument string, tokenized before the verbatim arguments.
    pub args_line: Option<String>,
    /// Timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Leave the process running when it times out.
    pub no_kill: bool,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

impl Args {
    /// Combine `--args` and the verbatim arguments into one list.
    pub fn to_arguments(&self) -> Arguments {
        let mut arguments = self
            .args_line
            .as_deref()
            .map(Arguments::parse)
            .unwrap_or_default();
        for token in &self.arguments {
            arguments.push(token.clone());
        }
        arguments
    }
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                result.timeout_ms = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("timeout", value))?,
                );
            }
            Short('a') | Long("args") => {
                result.args_line = Some(parser.value()?.parse()?);
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("no-kill") => {
                result.no_kill = true;
            }
            Value(val) => {
                result.executable = Some(val.string()?);
                // Everything after the executable belongs to it.
                for raw in parser.raw_args()? {
                    result.arguments.push(
                        raw.into_string()
                            .map_err(|raw| ArgsError::NotUnicode(raw.to_string_lossy().into()))?,
                    );
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"process-starter {version}
Run an executable with a timeout and capture its output

USAGE:
    process-starter [OPTIONS] [EXECUTABLE] [ARGS]...

OPTIONS:
    -t, --timeout <MS>      Execution timeout in milliseconds [default: one day]
    -a, --args <STRING>     Pre-joined argument string (double quotes group)
    -c, --config <FILE>     Path to configuration file (JSON)
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
        --no-kill           Leave the process running when it times out
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    PROCESS_STARTER_EXECUTABLE       Executable (overrides config)
    PROCESS_STARTER_TIMEOUT_MS       Timeout in milliseconds (overrides config)
    PROCESS_STARTER_KILL_ON_TIMEOUT  Set to 0/false to leave timed-out processes
    PROCESS_STARTER_LOG_LEVEL        Log level (overrides config)
    RUST_LOG                         Alternative log level setting

EXIT STATUS:
    The child's exit code, 124 on timeout, 126 when no process handle was
    obtained, 127 when the executable could not be started.

EXAMPLES:
    # Print the docker version, giving up after five seconds
    process-starter -t 5000 docker --version

    # Pass a pre-joined argument string
    process-starter -a '-f "project.yaml" up --detach' docker-compose
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("process-starter {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Argument for the executable is not valid Unicode.
    NotUnicode(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::NotUnicode(arg) => {
                write!(f, "argument is not valid unicode: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(args: &[&str]) -> Vec<OsString> {
        std::iter::once("process-starter")
            .chain(args.iter().copied())
            .map(OsString::from)
            .collect()
    }

    #[test]
    fn test_default_args() {
        let result = parse_args_from(args(&[])).unwrap();
        assert!(result.executable.is_none());
        assert!(result.arguments.is_empty());
        assert!(result.timeout_ms.is_none());
        assert!(!result.no_kill);
    }

    #[test]
    fn test_executable_and_arguments() {
        let result = parse_args_from(args(&["docker", "--version"])).unwrap();
        assert_eq!(result.executable.as_deref(), Some("docker"));
        assert_eq!(result.arguments, vec!["--version"]);
    }

    #[test]
    fn test_options_after_executable_belong_to_it() {
        let result = parse_args_from(args(&["-t", "50", "sleep", "-t", "--no-kill"])).unwrap();
        assert_eq!(result.timeout_ms, Some(50));
        assert_eq!(result.executable.as_deref(), Some("sleep"));
        assert_eq!(result.arguments, vec!["-t", "--no-kill"]);
        assert!(!result.no_kill);
    }

    #[test]
    fn test_args_line_comes_first() {
        let result =
            parse_args_from(args(&["-a", "-f \"my project.yaml\"", "docker-compose", "kill"]))
                .unwrap();
        let arguments = result.to_arguments();
        assert_eq!(arguments.as_slice(), ["-f", "my project.yaml", "kill"]);
    }

    #[test]
    fn test_long_options() {
        let result = parse_args_from(args(&[
            "--timeout",
            "1000",
            "--config",
            "/etc/starter.json",
            "--log-level",
            "debug",
            "--no-kill",
        ]))
        .unwrap();
        assert_eq!(result.timeout_ms, Some(1000));
        assert_eq!(result.config, Some(PathBuf::from("/etc/starter.json")));
        assert_eq!(result.log_level, Some("debug".to_string()));
        assert!(result.no_kill);
    }

    #[test]
    fn test_help_flag() {
        let result = parse_args_from(args(&["-h"])).unwrap();
        assert!(result.help);

        let result = parse_args_from(args(&["--help"])).unwrap();
        assert!(result.help);
    }

    #[test]
    fn test_version_flag() {
        let result = parse_args_from(args(&["-V"])).unwrap();
        assert!(result.version);
    }

    #[test]
    fn test_invalid_timeout() {
        let result = parse_args_from(args(&["-t", "soon"]));
        assert!(matches!(result, Err(ArgsError::InvalidValue("timeout", _))));
    }

    #[test]
    fn test_unknown_option() {
        let result = parse_args_from(args(&["--frobnicate"]));
        assert!(result.is_err());
    }
}
