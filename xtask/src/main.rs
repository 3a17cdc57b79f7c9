use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::Command;

/// Lessons the smoke run walks through, in menu order.
const LESSONS: &[&str] = &[
    "animations",
    "lights",
    "shadows",
    "haunted-house",
    "particles",
    "galaxy",
    "scroll",
    "physics",
    "imported-models",
];

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for frameloop")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests, deny and doc in sequence
    Check,
    /// Check formatting on all crates
    Fmt,
    /// Run clippy with warnings denied
    Clippy,
    /// Run all tests
    Test,
    /// Run cargo deny (licenses, bans, sources)
    Deny,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Run every lesson headless on a simulated clock
    Lessons {
        /// Frames per lesson
        #[arg(short = 'n', long, default_value_t = 120)]
        frames: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt", &["fmt", "--all", "--", "--check"])?;
            clippy()?;
            cargo("test", &["test", "--workspace"])?;
            deny()?;
            cargo("doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Fmt => cargo("fmt", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => clippy()?,
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Deny => deny()?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
        Commands::Lessons { frames } => smoke_lessons(frames)?,
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .with_context(|| format!("spawning cargo {label}"))?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed");
    }
    Ok(())
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn deny() -> Result<()> {
    cargo("deny", &["deny", "check", "licenses", "bans", "sources"])
}

fn smoke_lessons(frames: u64) -> Result<()> {
    let frames = frames.to_string();
    for lesson in LESSONS {
        cargo(
            lesson,
            &[
                "run",
                "--quiet",
                "-p",
                "frameloop-cli",
                "--",
                "run",
                lesson,
                "--simulated",
                "--frames",
                &frames,
            ],
        )?;
    }
    println!("==> {} lessons ran", LESSONS.len());
    Ok(())
}
