//! tweak-pset CLI Entry Point
//!
//! Tweaks a job's processing configuration before the job runs.
//!
//! # Usage
//!
//! ```bash
//! # Analysis job over two files restricted to a lumi mask
//! tweak-pset Analysis /srv/job "['/store/a.root', '/store/b.root']" "{'1': [[1, 10]]}"
//!
//! # Monte Carlo job: first/last event, first lumi, first run, seeding, LHE input
//! tweak-pset MC /srv/job "['MCFakeFile-1']" "{}" 1 500 1 1 AutomaticSeeding False
//! ```

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use crabinterface::logging::setup_logging;
use crabinterface::pset::{decode_positional, setup_pset, JobMode};
use crabinterface::VERSION;

/// Output modules tweaked when none are configured.
const DEFAULT_OUTPUT_MODULES: &[&str] = &["o"];

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    positional: Vec<String>,
    one_event_mode: Option<String>,
    verbose: bool,
}

fn print_usage() {
    println!("Usage: tweak-pset [OPTIONS] MODE LOCATION INPUT_FILES RUN_AND_LUMIS");
    println!("                  [FIRST_EVENT LAST_EVENT FIRST_LUMI FIRST_RUN SEEDING LHE_INPUT]");
    println!();
    println!("Arguments:");
    println!("  MODE                MC for Monte Carlo production, anything else for analysis");
    println!("  LOCATION            Job working directory holding PSet.json");
    println!("  INPUT_FILES         Literal list of input LFNs");
    println!("  RUN_AND_LUMIS       Literal map of run -> [[first, last], ...]");
    println!("  (MC only)           FIRST_EVENT LAST_EVENT FIRST_LUMI FIRST_RUN SEEDING LHE_INPUT");
    println!();
    println!("Options:");
    println!("  --oneEventMode V    Accepted for compatibility; has no effect");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("tweak-pset {}", VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--oneEventMode" => {
                i += 1;
                if i >= args.len() {
                    return Err("--oneEventMode requires a value".to_string());
                }
                config.one_event_mode = Some(args[i].clone());
            }
            arg if arg.starts_with("--oneEventMode=") => {
                config.one_event_mode = Some(arg["--oneEventMode=".len()..].to_string());
            }
            // Negative numbers are positional values
            arg if arg.starts_with("--") => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => config.positional.push(arg.clone()),
        }
        i += 1;
    }

    Ok(config)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    println!("{}", "Beginning TweakPSet".bold());
    println!(" arguments: {:?}", config.positional);

    if config.one_event_mode.is_some() {
        println!("{}", "One event mode disabled; the option has no effect".yellow());
    }

    let decoded = decode_positional(&config.positional).map_err(|e| {
        error!("Invalid arguments: {}", e);
        e
    })?;

    if decoded.mode == JobMode::MonteCarlo {
        info!("Monte Carlo job, seeding: {:?}", decoded.seeding);
    }

    let output_modules = DEFAULT_OUTPUT_MODULES.iter().map(|m| m.to_string()).collect();
    let tweak = decoded.to_tweak(output_modules);

    let output = setup_pset(&decoded.location, &tweak, &decoded.input_files, &decoded.mask)?;

    println!("Tweaked configuration written to {}", output.display());
    println!("{}", "Finished TweakPSet".bold().green());
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_positional_and_one_event_mode() {
        let config = parse_arguments(&args(&[
            "tweak-pset",
            "MC",
            ".",
            "[]",
            "{}",
            "1",
            "-1",
            "--oneEventMode",
            "True",
        ]))
        .unwrap();

        assert_eq!(config.positional, args(&["MC", ".", "[]", "{}", "1", "-1"]));
        assert_eq!(config.one_event_mode.as_deref(), Some("True"));
    }

    #[test]
    fn test_parse_one_event_mode_equals() {
        let config = parse_arguments(&args(&["tweak-pset", "--oneEventMode=False"])).unwrap();
        assert_eq!(config.one_event_mode.as_deref(), Some("False"));
    }

    #[test]
    fn test_parse_missing_option_value() {
        assert!(parse_arguments(&args(&["tweak-pset", "--oneEventMode"])).is_err());
    }

    #[test]
    fn test_parse_unknown_option() {
        assert!(parse_arguments(&args(&["tweak-pset", "--lfn"])).is_err());
    }
}
