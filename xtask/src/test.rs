use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{Step, HW_TARGET};
use crate::flash;

/// Host integration suites: boot order, run loop, hexdump/options
/// properties, build configuration, collaborator contracts and DMA
/// region placement.
const INTEGRATION: [(&str, &str); 6] = [
    ("spidma", "integration_boot_sequence"),
    ("spidma", "integration_transfer"),
    ("spidma", "hexdump_proptest"),
    ("spidma", "build_config"),
    ("platform", "contracts_proptest"),
    ("platform", "dma_regions"),
];

/// Which suites to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub unit: bool,
    pub integration: bool,
    /// Build the release image and check the `.axisram` buffer placement.
    pub elf: bool,
}

impl Selection {
    pub fn new(unit_only: bool, integration_only: bool, elf: bool) -> Self {
        Self {
            unit: !integration_only,
            integration: !unit_only,
            elf,
        }
    }
}

pub fn steps(selection: Selection) -> Vec<Step<'static>> {
    let mut steps = Vec::new();
    if selection.unit {
        steps.push(Step::new("Unit tests", &["test", "--lib", "-p", "platform", "-p", "spidma"]));
        steps.push(Step::new("xtask", &["test", "-p", "xtask"]));
    }
    if selection.integration {
        for (package, suite) in INTEGRATION {
            steps.push(Step::new(suite, &["test", "-p", package, "--test", suite]));
        }
        steps.push(Step::new("Doc tests", &["test", "--doc", "-p", "platform", "-p", "spidma"]).advisory());
    }
    if selection.elf {
        steps.push(
            Step::new(
                "Release image",
                &["build", "-p", "spidma", "--bin", "spidma", "--release", "--target", HW_TARGET, "--features", "hardware"],
            )
            .env("DEFMT_LOG", "debug"),
        );
        steps.push(Step::new("ELF sections", &["test", "-p", "spidma", "--test", "elf_sections"]));
    }
    steps
}

pub fn run(unit_only: bool, integration_only: bool, elf: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running harness tests...".cyan().bold());
    if elf {
        println!("   {}", format!("ELF checks read {}", flash::image_path(true)).dimmed());
    }
    println!();

    let start = Instant::now();
    for step in steps(Selection::new(unit_only, integration_only, elf)) {
        step.run()?;
    }

    println!(
        "{}",
        format!("✓ Tests completed in {:.2}s", start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(selection: Selection) -> Vec<&'static str> {
        steps(selection).iter().map(|s| s.label).collect()
    }

    #[test]
    fn default_runs_every_host_suite() {
        let all = labels(Selection::new(false, false, false));
        assert!(all.contains(&"integration_transfer"));
        assert!(all.contains(&"dma_regions"));
        assert!(!all.contains(&"ELF sections"));
    }

    #[test]
    fn unit_only_skips_integration() {
        assert_eq!(labels(Selection::new(true, false, false)), ["Unit tests", "xtask"]);
    }

    #[test]
    fn elf_check_builds_the_release_image_first() {
        let elf = labels(Selection::new(true, false, true));
        assert_eq!(elf, ["Unit tests", "xtask", "Release image", "ELF sections"]);
    }
}
