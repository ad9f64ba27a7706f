//! # Projects CLI
//!
//! Entry point for the project manager console.

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

use cli_console::commands::CommandHandler;
use cli_console::toolbar_demo::{self, ToolbarDemo};
use cli_console::{console_logger, load_settings, ConsoleOptions};
use services_projects::{HttpProjectApi, ProjectsConfig};
use services_toolbar::LinePrompt;

struct Invocation {
    options: ConsoleOptions,
    command: Vec<String>,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("projects");

    let invocation = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(program);
        process::exit(1);
    });

    match run(invocation) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run(invocation: Invocation) -> Result<String, String> {
    let settings = load_settings(&invocation.options)?;
    let logger = console_logger(&settings);

    if invocation.command.first().map(String::as_str) == Some("toolbar-demo") {
        let script = match invocation.command.get(1) {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| format!("Failed to read script file: {}", e))?,
            None => toolbar_demo::DEFAULT_SCRIPT.to_string(),
        };
        let steps = toolbar_demo::parse_script(&script)?;
        let prompt = LinePrompt::new(io::stdin().lock(), io::stderr());
        let mut demo = ToolbarDemo::new(&toolbar_demo::sample_document(), prompt, &settings, logger);
        return Ok(demo.run(&steps).join("\n"));
    }

    let config = ProjectsConfig::from_settings(&settings).map_err(|e| e.to_string())?;
    let api = HttpProjectApi::new(&config).map_err(|e| e.to_string())?;
    CommandHandler::new(api, logger).execute(&invocation.command)
}

fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut options = ConsoleOptions::default();
    let mut command = Vec::new();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--api" | "-a" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --api".to_string());
                }
                options.api_url = Some(args[i].clone());
            }
            "--settings" | "-s" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --settings".to_string());
                }
                options.settings_file = Some(PathBuf::from(&args[i]));
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            _ => {
                command.extend_from_slice(&args[i..]);
                break;
            }
        }
        i += 1;
    }

    if command.is_empty() {
        return Err("No command given".to_string());
    }
    Ok(Invocation { options, command })
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS] <COMMAND>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -a, --api <URL>          Backend base URL (overrides PROJECTS_API_URL)");
    eprintln!("  -s, --settings <FILE>    JSON settings file");
    eprintln!("  -h, --help               Show this help message");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  ls                           List projects");
    eprintln!("  new <TITLE> <DESCRIPTION>    Create a project and print its editor route");
    eprintln!("  rm <ID>                      Delete a project");
    eprintln!("  open <ID>                    Print the editor route of a project");
    eprintln!("  toolbar-demo [SCRIPT]        Replay toolbar clicks against a sample document");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --api http://localhost:8000 ls", program);
    eprintln!("  {} new \"Thesis\" \"Chapter drafts\"", program);
}
