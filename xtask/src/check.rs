use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{Step, HW_TARGET};

/// Builds every configuration the harness ships in, then lints.
///
/// The hardware binary and the host emulator share the kernel; `platform`
/// must stay `no_std` both with and without its defmt derives.
pub fn steps() -> Vec<Step<'static>> {
    vec![
        Step::new(
            "Hardware image (STM32H743, defmt)",
            &["check", "-p", "spidma", "--bins", "--target", HW_TARGET, "--features", "hardware"],
        ),
        Step::new(
            "Host emulator (host_loopback)",
            &["check", "-p", "spidma", "--examples", "--features", "emulator"],
        ),
        Step::new(
            "Collaborator traits (no_std)",
            &["check", "-p", "platform", "--target", HW_TARGET, "--no-default-features"],
        ),
        Step::new(
            "Collaborator traits (no_std + defmt)",
            &["check", "-p", "platform", "--target", HW_TARGET, "--features", "defmt"],
        ),
        Step::new(
            "Clippy (host targets)",
            &["clippy", "--workspace", "--all-targets", "--features", "spidma/emulator", "--", "-D", "warnings"],
        )
        .advisory(),
        Step::new("Formatting", &["fmt", "--all", "--check"]).advisory(),
    ]
}

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking harness configurations...".cyan().bold());
    println!();

    let start = Instant::now();
    let mut warnings = 0u32;
    for step in steps() {
        if step.run()?.is_none() {
            warnings = warnings.saturating_add(1);
        }
    }

    let done = format!("✓ Checks completed in {:.2}s", start.elapsed().as_secs_f64());
    if warnings == 0 {
        println!("{}", done.green().bold());
    } else {
        println!("{}", format!("{done} ({warnings} advisory steps reported problems)").yellow().bold());
    }
    println!();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn hardware_checks_use_the_cross_target() {
        for step in steps().iter().filter(|s| s.args.contains(&"hardware") || s.args.contains(&"platform")) {
            assert!(step.args.contains(&HW_TARGET), "{}", step.label);
            assert!(!step.advisory, "{}", step.label);
        }
    }

    #[test]
    fn only_lints_are_advisory() {
        let advisory: Vec<_> = steps().iter().filter(|s| s.advisory).map(|s| s.args[0]).collect();
        assert_eq!(advisory, ["clippy", "fmt"]);
    }
}
