use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for tileworld")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt, clippy, tests and docs, stopping at the first failure
    Check,
    /// cargo fmt --check
    Fmt,
    /// clippy with warnings denied
    Clippy,
    /// Run tests, optionally for one crate
    Test {
        /// Package to test, e.g. tileworld-kernel
        #[arg(short, long)]
        package: Option<String>,
    },
    /// Build rustdoc for the workspace
    Doc,
    /// Run the headless demo through the CLI
    Demo {
        #[arg(short, long, default_value = "3")]
        seconds: u32,
    },
}

/// One cargo invocation with the label printed before it runs.
struct Step {
    label: &'static str,
    args: Vec<String>,
}

impl Step {
    fn new(label: &'static str, args: &[&str]) -> Self {
        Self {
            label,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn run(&self) -> Result<()> {
        println!("==> {}: cargo {}", self.label, self.args.join(" "));
        let status = Command::new("cargo").args(&self.args).status()?;
        if !status.success() {
            anyhow::bail!("{} failed ({status})", self.label);
        }
        Ok(())
    }
}

fn fmt() -> Step {
    Step::new("fmt", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Step {
    Step::new(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test(package: Option<&str>) -> Step {
    match package {
        Some(p) => Step::new("test", &["test", "-p", p]),
        None => Step::new("test", &["test", "--workspace"]),
    }
}

fn doc() -> Step {
    Step::new("doc", &["doc", "--workspace", "--no-deps"])
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let steps = match cli.command {
        Commands::Check => vec![fmt(), clippy(), test(None), doc()],
        Commands::Fmt => vec![fmt()],
        Commands::Clippy => vec![clippy()],
        Commands::Test { package } => vec![test(package.as_deref())],
        Commands::Doc => vec![doc()],
        Commands::Demo { seconds } => {
            let seconds = seconds.to_string();
            vec![Step::new(
                "demo",
                &["run", "-p", "tileworld-cli", "--", "run", "--seconds", &seconds],
            )]
        }
    };
    for step in &steps {
        step.run()?;
    }
    Ok(())
}
