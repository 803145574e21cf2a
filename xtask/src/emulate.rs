use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;

pub fn run(cmdline: &str, log: &str) -> Result<()> {
    println!();
    println!("{}", "🖥  Starting host emulator...".cyan().bold());
    if !cmdline.is_empty() {
        println!("   {}", format!("cmdline: {cmdline}").dimmed());
    }
    println!();

    let status = Command::new("cargo")
        .args([
            "run",
            "-p",
            "spidma",
            "--example",
            "host_loopback",
            "--features",
            "emulator",
            "--",
        ])
        .args(cmdline.split_ascii_whitespace())
        .env("RUST_LOG", log)
        .status()
        .context("Failed to run the host emulator")?;

    if !status.success() {
        eprintln!("{}", "✗ Emulator exited with an error".red().bold());
        anyhow::bail!("Emulator failed");
    }

    println!();
    println!("{}", "✓ Emulator finished".green());
    Ok(())
}
