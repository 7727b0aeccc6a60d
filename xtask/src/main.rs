use std::process;

use anyhow::Result;
use clap::{ArgMatches, Command};

const BIN_NAME: &str = "pagefix";

fn main() -> Result<()> {
    let args = clap::command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("install").about("Install pagefix binary locally"))
        .subcommand(
            Command::new("run")
                .about("Build and run pagefix with arguments")
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .arg(clap::Arg::new("args")
                    .help("Arguments to pass to pagefix")
                    .action(clap::ArgAction::Append)
                    .num_args(0..))
        )
        .subcommand(
            Command::new("test")
                .about("Test Operations")
                .subcommand(Command::new("all").about("Run every test suite in the workspace"))
                .subcommand(Command::new("core").about("Run tests for pagefix-core"))
                .subcommand(Command::new("bin").about("Run unit tests for pagefix-bin"))
                .subcommand(Command::new("integration").about("Run CLI integration tests"))
        )
        .get_matches();

    match args.subcommand() {
        Some(("install", _args)) => install(),
        Some(("run", args)) => handle_run_command(args),
        Some(("test", args)) => handle_test_commands(args),
        Some((command, _)) => anyhow::bail!("Unexpected command: {command}"),
        None => anyhow::bail!("Expected subcommand"),
    }
}

fn install() -> Result<()> {
    println!("Installing {BIN_NAME}...");
    cargo(&["install", "--path", "crates/pagefix-bin"], "Failed to install pagefix")?;
    println!("✓ {BIN_NAME} installed successfully");
    Ok(())
}

fn handle_run_command(args: &ArgMatches) -> Result<()> {
    let run_args: Vec<String> = args.get_many::<String>("args")
        .map_or(Vec::new(), |vals| vals.cloned().collect());

    let mut cargo_args = vec!["run", "--bin", BIN_NAME, "--"];
    cargo_args.extend(run_args.iter().map(String::as_str));

    cargo(&cargo_args, "Failed to run pagefix")
}

fn handle_test_commands(args: &ArgMatches) -> Result<()> {
    match args.subcommand() {
        Some(("all", _args)) => test_all(),
        Some(("core", _args)) => test_core(),
        Some(("bin", _args)) => test_bin(),
        Some(("integration", _args)) => test_integration(),
        _ => {
            println!("Available test commands:");
            println!("  all          - Run every test suite in the workspace");
            println!("  core         - Run tests for pagefix-core");
            println!("  bin          - Run unit tests for pagefix-bin");
            println!("  integration  - Run CLI integration tests");
            Ok(())
        }
    }
}

fn test_all() -> Result<()> {
    println!("🧪 Running all tests for the pagefix workspace...\n");

    let suites: [(&str, fn() -> Result<()>); 3] = [
        ("pagefix-core", test_core),
        ("pagefix-bin", test_bin),
        ("integration", test_integration),
    ];

    let mut failed = Vec::new();
    for (name, suite) in suites {
        match suite() {
            Ok(()) => println!("✅ {name} tests passed\n"),
            Err(err) => {
                println!("❌ {name} tests failed: {err:?}\n");
                failed.push(name);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("Test suites failed: {}", failed.join(", "));
    }

    println!("🎉 All tests passed successfully!");
    Ok(())
}

fn test_core() -> Result<()> {
    println!("🧪 Running pagefix-core tests...");
    cargo(&["test", "--package", "pagefix-core"], "Core tests failed")
}

fn test_bin() -> Result<()> {
    println!("🧪 Running pagefix-bin unit tests...");
    cargo(&["test", "--package", "pagefix-bin", "--bins"], "Binary tests failed")
}

fn test_integration() -> Result<()> {
    println!("🧪 Running integration tests...");
    cargo(&["test", "--package", "pagefix-bin", "--test", "cli"], "Integration tests failed")
}

fn cargo(args: &[&str], failure: &str) -> Result<()> {
    let status = process::Command::new("cargo").args(args).status()?;

    if !status.success() {
        anyhow::bail!("{failure}");
    }
    Ok(())
}
