use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

use crate::cargo::{Step, HW_TARGET};

const CHIP: &str = "STM32H743ZITx";

/// Keys the kernel reads from its command line
const OPTION_KEYS: [&str; 4] = ["logdev", "loglevel", "width", "height"];

/// Loopback wiring on the Nucleo-H743ZI (SPI1 on the Zio connector)
const WIRING: [&str; 3] = [
    "Bridge PA7 (SPI1 MOSI) to PA6 (SPI1 MISO) for loopback data",
    "CE0 is PD14, CE1 is PD15; LD1 (PB0) flickers while a transfer runs",
    "Console on USART3 (ST-LINK VCP) at 3 Mbaud; the reboot magic restarts the board",
];

/// Command line tokens the kernel would silently ignore.
pub fn ignored_tokens(cmdline: &str) -> Vec<&str> {
    cmdline
        .split_ascii_whitespace()
        .filter(|token| match token.split_once('=') {
            Some((key, _)) => !OPTION_KEYS.contains(&key),
            None => true,
        })
        .collect()
}

pub fn image_path(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/{HW_TARGET}/{profile}/spidma")
}

pub fn build_step<'a>(release: bool, cmdline: &'a str, defmt_log: &'a str) -> Step<'a> {
    let mut args = vec!["build", "-p", "spidma", "--bin", "spidma", "--target", HW_TARGET, "--features", "hardware"];
    if release {
        args.push("--release");
    }
    Step::new("Build spidma", &args)
        .env("SPIDMA_CMDLINE", cmdline)
        .env("DEFMT_LOG", defmt_log)
}

pub fn run(release: bool, cmdline: &str, defmt_log: &str) -> Result<()> {
    let mode = if release { "release" } else { "debug" };

    println!();
    println!("{}", format!("🔨 Building spidma ({mode}, DEFMT_LOG={defmt_log})...").cyan().bold());
    if !cmdline.is_empty() {
        println!("   {}", format!("baked cmdline: {cmdline}").dimmed());
    }
    for token in ignored_tokens(cmdline) {
        println!("   {}", format!("⚠ '{token}' is not a kernel option and will be ignored").yellow());
    }
    println!();

    build_step(release, cmdline, defmt_log).run()?;
    show_sections(release);

    println!("{}", "🔌 Wiring:".cyan());
    for line in WIRING {
        println!("   {}", line.dimmed());
    }
    println!();

    println!("{}", format!("📡 Flashing to {CHIP}...").cyan().bold());
    let flash_start = Instant::now();
    let status = Command::new("probe-rs")
        .args(["run", "--chip", CHIP, &image_path(release)])
        .status()
        .context("Failed to run probe-rs. Is probe-rs installed? (cargo install probe-rs-tools)")?;

    // `probe-rs run` streams RTT until the harness halts or reboots.
    if !status.success() {
        eprintln!("{}", "✗ probe-rs exited with an error".red().bold());
        anyhow::bail!("Flash failed - check that the ST-LINK is connected and the board is powered");
    }

    println!(
        "{}",
        format!("✓ Session ended after {:.2}s", flash_start.elapsed().as_secs_f64()).green()
    );
    println!();
    Ok(())
}

fn show_sections(release: bool) {
    let Ok(out) = Command::new("rust-size").args(["-A", &image_path(release)]).output() else {
        return;
    };
    if !out.status.success() {
        return;
    }
    // Code, data and the DMA buffers.
    println!("{}", "📊 Image sections:".cyan());
    for line in String::from_utf8_lossy(&out.stdout)
        .lines()
        .filter(|l| [".text", ".rodata", ".axisram", ".bss", ".data"].iter().any(|s| l.starts_with(s)))
    {
        println!("   {}", line.dimmed());
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_options_are_not_flagged() {
        assert!(ignored_tokens("logdev=ttyS1 loglevel=3 width=320 height=240").is_empty());
        assert!(ignored_tokens("").is_empty());
    }

    #[test]
    fn unknown_keys_and_bare_words_are_flagged() {
        assert_eq!(ignored_tokens("loglevel=3 keymap=DE quiet"), ["keymap=DE", "quiet"]);
    }

    #[test]
    fn build_bakes_cmdline_and_defmt_level() {
        let step = build_step(true, "loglevel=3", "debug");
        assert!(step.args.contains(&"--release"));
        assert!(step.args.contains(&HW_TARGET));
        assert!(step.env.contains(&("SPIDMA_CMDLINE", "loglevel=3")));
        assert!(step.env.contains(&("DEFMT_LOG", "debug")));
        assert_eq!(image_path(true), "target/thumbv7em-none-eabihf/release/spidma");
    }
}
