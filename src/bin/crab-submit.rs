//! crab-submit CLI Entry Point
//!
//! Submits a workflow described by a YAML submission file.
//!
//! # Usage
//!
//! ```bash
//! # Submit with the default service configuration
//! crab-submit crab_ttbar.yaml --user-dn "/DC=ch/DC=cern/OU=Users/CN=jdoe"
//!
//! # Use a service configuration and block T1 sites
//! crab-submit crab_ttbar.yaml --config service.yaml --no-t1-access
//! ```

use std::env;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info, warn};

use crabinterface::config::ServiceConfig;
use crabinterface::logging::setup_logging;
use crabinterface::sites::FileCatalog;
use crabinterface::store::{JsonFileStore, LocalRequestManager};
use crabinterface::users::JsonFileRegistry;
use crabinterface::workflow::{load_request, DataWorkflow};
use crabinterface::{APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    request_path: Option<String>,
    config_path: Option<String>,
    user_dn: Option<String>,
    username: Option<String>,
    no_t1_access: bool,
    verbose: bool,
}

fn print_banner() {
    println!();
    println!("{}", format!("{} v{}", APP_NAME, VERSION).bold());
    println!("Workflow submission");
    println!();
}

fn print_usage() {
    println!("Usage: crab-submit [OPTIONS] <REQUEST_FILE>");
    println!();
    println!("Arguments:");
    println!("  <REQUEST_FILE>      Path to the YAML submission file");
    println!();
    println!("Options:");
    println!("  --config PATH       Service configuration YAML");
    println!("  --user-dn DN        Distinguished name of the submitting user");
    println!("  --username NAME     Submitting user (default: $USER)");
    println!("  --no-t1-access      Blacklist all T1 sites");
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
                println!("crab-submit {}", VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => config.verbose = true,
            "--no-t1-access" => config.no_t1_access = true,
            "--config" | "--user-dn" | "--username" => {
                i += 1;
                if i >= args.len() {
                    return Err(format!("{} requires a value", arg));
                }
                let value = Some(args[i].clone());
                match arg.as_str() {
                    "--config" => config.config_path = value,
                    "--user-dn" => config.user_dn = value,
                    _ => config.username = value,
                }
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.request_path.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                config.request_path = Some(arg.clone());
            }
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
    print_banner();

    let request_path = config
        .request_path
        .ok_or("No submission file given; see --help")?;

    let service = match &config.config_path {
        Some(path) => ServiceConfig::load(path)?,
        None => {
            info!("No service configuration given, using defaults");
            ServiceConfig::default()
        }
    };

    let sites_file = service
        .known_sites_file
        .clone()
        .ok_or("The service configuration does not name a known_sites_file")?;

    let username = config
        .username
        .or_else(|| env::var("USER").ok())
        .ok_or("Cannot determine the submitting user; pass --username")?;

    let mut request = load_request(&request_path, &username)?;
    match config.user_dn {
        Some(dn) => request.user_dn = dn,
        None => warn!("No --user-dn given; the user is registered without a DN"),
    }
    request.blacklist_t1 = config.no_t1_access;

    let catalog = FileCatalog::new(sites_file);
    let users = JsonFileRegistry::new(service.users_file.clone());
    let store = JsonFileStore::new(service.request_store_dir());
    let manager = LocalRequestManager::open(service.states_file.clone())?;

    let mut workflow = DataWorkflow::new(
        service,
        &catalog,
        Box::new(users),
        Box::new(store),
        Box::new(manager),
    )?;

    let problems = workflow.validate(&request);
    if !problems.is_empty() {
        for problem in &problems {
            error!("{}", problem);
        }
        return Err(format!(
            "Request '{}' has {} validation problems",
            request.name,
            problems.len()
        )
        .into());
    }

    let results = workflow.submit(&request).map_err(|e| {
        error!("Submission of '{}' failed: {}", request.name, e);
        e
    })?;

    for result in &results {
        println!(
            "{} {}",
            "Submitted".green().bold(),
            result.request_name
        );
    }
    println!("{}", serde_json::to_string_pretty(&results)?);

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
    fn test_parse_all_options() {
        let config = parse_arguments(&args(&[
            "crab-submit",
            "crab.yaml",
            "--config",
            "service.yaml",
            "--user-dn",
            "/CN=jdoe",
            "--username",
            "jdoe",
            "--no-t1-access",
        ]))
        .unwrap();

        assert_eq!(config.request_path.as_deref(), Some("crab.yaml"));
        assert_eq!(config.config_path.as_deref(), Some("service.yaml"));
        assert_eq!(config.user_dn.as_deref(), Some("/CN=jdoe"));
        assert_eq!(config.username.as_deref(), Some("jdoe"));
        assert!(config.no_t1_access);
        assert!(!config.verbose);
    }

    #[test]
    fn test_parse_missing_value() {
        assert!(parse_arguments(&args(&["crab-submit", "--config"])).is_err());
    }

    #[test]
    fn test_parse_two_request_files() {
        assert!(parse_arguments(&args(&["crab-submit", "a.yaml", "b.yaml"])).is_err());
    }
}
