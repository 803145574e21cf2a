use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// Cross target of the Nucleo-H743ZI image
pub const HW_TARGET: &str = "thumbv7em-none-eabihf";

/// One `cargo` invocation with a label for the console.
pub struct Step<'a> {
    pub label: &'a str,
    pub args: Vec<&'a str>,
    pub env: Vec<(&'a str, &'a str)>,
    /// A failing advisory step is reported but does not stop the task.
    pub advisory: bool,
}

impl<'a> Step<'a> {
    pub fn new(label: &'a str, args: &[&'a str]) -> Self {
        Self {
            label,
            args: args.to_vec(),
            env: Vec::new(),
            advisory: false,
        }
    }

    pub fn env(mut self, key: &'a str, value: &'a str) -> Self {
        self.env.push((key, value));
        self
    }

    pub fn advisory(mut self) -> Self {
        self.advisory = true;
        self
    }

    /// Run the step, returning its stdout. `Ok(None)` is a failed advisory step.
    pub fn run(&self) -> Result<Option<String>> {
        println!("{}", format!("  {}...", self.label).cyan());
        let start = Instant::now();

        let output = Command::new("cargo")
            .args(&self.args)
            .envs(self.env.iter().copied())
            .output()
            .with_context(|| format!("Failed to run cargo {}", self.args.join(" ")))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            if self.advisory {
                eprintln!("{}", format!("  ⚠ {} reported problems", self.label).yellow().bold());
                eprintln!("{}", String::from_utf8_lossy(&output.stderr));
                println!();
                return Ok(None);
            }
            eprintln!("{}", format!("  ✗ {} failed", self.label).red().bold());
            eprintln!();
            for line in stdout.lines() {
                eprintln!("  {line}");
            }
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            anyhow::bail!("{} failed", self.label);
        }

        let summary = TestSummary::parse(&stdout)
            .map(|s| format!(" ({s})"))
            .unwrap_or_default();
        println!(
            "{}",
            format!(
                "  ✓ {}{} in {:.2}s",
                self.label,
                summary,
                start.elapsed().as_secs_f64()
            )
            .green()
        );
        println!();
        Ok(Some(stdout))
    }
}

/// Totals over every `test result:` line of a cargo test run; one line is
/// printed per test binary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub binaries: u32,
    pub passed: u32,
    pub failed: u32,
    pub ignored: u32,
}

impl TestSummary {
    pub fn parse(output: &str) -> Option<Self> {
        let mut summary = Self::default();
        for line in output.lines() {
            let Some(result) = line.split("test result:").nth(1) else {
                continue;
            };
            summary.binaries = summary.binaries.saturating_add(1);
            for part in result.split(';') {
                let mut words = part.split_whitespace().rev();
                let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                    continue;
                };
                let Ok(count) = count.parse::<u32>() else {
                    continue;
                };
                let total = match kind {
                    "passed" => &mut summary.passed,
                    "failed" => &mut summary.failed,
                    "ignored" => &mut summary.ignored,
                    _ => continue,
                };
                *total = total.saturating_add(count);
            }
        }
        (summary.binaries > 0).then_some(summary)
    }
}

impl std::fmt::Display for TestSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} passed, {} ignored across {} binaries",
            self.passed, self.ignored, self.binaries
        )
    }
}
