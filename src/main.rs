//! process-starter binary entry point.

use std::io::Write;
use std::process::ExitCode;

use process_starter::cli::{parse_args, print_help, print_version};
use process_starter::{logging, ExecutableStarter, StarterConfig};
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'process-starter --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if args.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    let config = match StarterConfig::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let _ = logging::init_with_filter(config.log_filter());

    let mut starter = match ExecutableStarter::from_config(&config) {
        Ok(starter) => starter,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'process-starter --help' for more information.");
            return ExitCode::from(2);
        }
    };

    let arguments = args.to_arguments();
    debug!(timeout_ms = config.timeout_ms, "running {}", starter.executable());
    let outcome = starter.start(arguments, config.timeout()).await;

    // Captured output is final once start returns, success or not.
    let _ = std::io::stdout().write_all(starter.standard_output().as_bytes());
    let _ = std::io::stderr().write_all(starter.standard_error().as_bytes());

    let code = match outcome {
        Ok(code) => code,
        Err(e) => {
            debug!(error = ?e, "start failed");
            eprintln!("error: {}", e);
            e.exit_code()
        }
    };

    ExitCode::from(exit_status_byte(code))
}

/// Narrow a process exit code to the byte the OS reports.
fn exit_status_byte(code: i32) -> u8 {
    match u8::try_from(code) {
        Ok(byte) => byte,
        // -1 means "no code"; out-of-range codes are a generic failure.
        Err(_) => 1,
    }
}
