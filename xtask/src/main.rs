//! Development automation tasks for the PS-LANG workspace.
//!
//! Run with: `cargo xtask <command>`
//!
//! This is a CLI tool for developers, so `println!` and `eprintln!` are
//! used for user-facing output rather than structured logging.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::{Command, ExitCode};

use anyhow::{bail, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Ci,
    Fmt,
    Clippy,
    Check,
    Test,
    Deny,
    Audit,
    Help,
}

impl Task {
    fn parse(name: Option<&str>) -> Option<Self> {
        match name {
            Some("ci") => Some(Self::Ci),
            Some("fmt") => Some(Self::Fmt),
            Some("clippy") => Some(Self::Clippy),
            Some("check") => Some(Self::Check),
            Some("test") => Some(Self::Test),
            Some("deny") => Some(Self::Deny),
            Some("audit") => Some(Self::Audit),
            Some("help") | None => Some(Self::Help),
            Some(_) => None,
        }
    }

    fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Ci => run_ci(),
            Self::Fmt => cargo(&["fmt", "--all", "--", "--check"])
                .context("format check failed; run 'cargo fmt --all' to fix"),
            Self::Clippy => cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]),
            Self::Check => cargo(&["check", "-p", "pslang-api", "--bins", "--tests"]),
            Self::Test => cargo(&["test", "--workspace"]),
            Self::Deny => cargo_plugin("deny", &["check"]),
            Self::Audit => cargo_plugin("audit", &[]),
            Self::Help => {
                print_help();
                Ok(())
            }
        }
    }
}

fn main() -> ExitCode {
    let arg = env::args().nth(1);
    let Some(task) = Task::parse(arg.as_deref()) else {
        eprintln!("Unknown task: {}", arg.unwrap_or_default());
        eprintln!();
        print_help();
        return ExitCode::FAILURE;
    };

    match task.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Task failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("PS-LANG Development Tasks");
    println!();
    println!("USAGE:");
    println!("    cargo xtask <TASK>");
    println!();
    println!("TASKS:");
    println!("    ci        Run fmt, clippy, check, test, deny and audit in sequence");
    println!("    fmt       Check Rust code formatting");
    println!("    clippy    Run Clippy with warnings denied");
    println!("    check     Verify the pslang binary and its tests compile");
    println!("    test      Run all workspace tests");
    println!("    deny      Check dependencies with cargo-deny");
    println!("    audit     Audit dependencies for security vulnerabilities");
    println!("    help      Show this help message");
}

/// Run all CI checks in sequence
fn run_ci() -> anyhow::Result<()> {
    let steps = [Task::Fmt, Task::Clippy, Task::Check, Task::Test, Task::Deny, Task::Audit];

    for (index, step) in steps.iter().enumerate() {
        println!("\n==> Step {}/{}: {step:?}", index + 1, steps.len());
        step.run()?;
    }

    println!("\n✓ All CI checks passed!");
    Ok(())
}

fn cargo(args: &[&str]) -> anyhow::Result<()> {
    let status = Command::new("cargo").args(args).status().context("failed to spawn cargo")?;
    if !status.success() {
        bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}

/// Run a cargo subcommand provided by a separately installed plugin.
fn cargo_plugin(name: &str, args: &[&str]) -> anyhow::Result<()> {
    let installed = Command::new("cargo")
        .args([name, "--version"])
        .output()
        .is_ok_and(|o| o.status.success());
    if !installed {
        eprintln!("cargo-{name} is not installed.");
        eprintln!("Install it with: cargo install cargo-{name}");
        bail!("cargo-{name} not found");
    }

    let mut full = vec![name];
    full.extend_from_slice(args);
    cargo(&full)
}
