//! ELF section address verification tests.
// ELF test file: expect/unwrap/cast/indexing are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
)]
//!
//! These tests verify that the linker script (memory.x) places the SPI
//! transfer buffers in AXI SRAM. DTCM (0x20000000) is NOT reachable by
//! DMA1 on STM32H743: a buffer there leaves RX at its 0x55 fill.
//!
//! # How to run
//! These tests require the ARM ELF binary to be pre-built:
//! ```
//! cargo build --release --target thumbv7em-none-eabihf --no-default-features --features hardware
//! cargo test -p spidma --test elf_sections
//! ```

use std::path::PathBuf;

use spidma::config::TEST_DATA_LENGTH;

/// Path to the built ARM ELF binary (set by build.rs or environment).
fn spidma_elf_path() -> Option<PathBuf> {
    // Try environment variable first (set by CI)
    if let Ok(path) = std::env::var("SPIDMA_ELF_PATH") {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
    }
    // Try conventional cargo output path
    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())?;
    let elf = workspace_root
        .join("target")
        .join("thumbv7em-none-eabihf")
        .join("release")
        .join("spidma");
    if elf.exists() {
        Some(elf)
    } else {
        None
    }
}

/// Skip a test with a message if the ELF is not available.
macro_rules! require_elf {
    () => {
        match spidma_elf_path() {
            Some(p) => p,
            None => {
                eprintln!(
                    "SKIP: ARM ELF not found — run \
                     `cargo build --release --target thumbv7em-none-eabihf` first"
                );
                return;
            }
        }
    };
}

#[test]
fn axisram_section_address_is_correct() {
    let elf_path = require_elf!();

    // Parse ELF using object crate — check if available
    // If not, fall back to running arm-none-eabi-readelf
    let output = std::process::Command::new("arm-none-eabi-readelf")
        .args(["-S", "--wide", elf_path.to_str().unwrap()])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            // Look for .axisram section
            if let Some(line) = text.lines().find(|l| l.contains(".axisram")) {
                // readelf -S output format: [Nr] Name   Type   Addr   Off   Size ...
                // The address field should start with 24 (0x24000000 range)
                assert!(
                    line.contains("2400"),
                    ".axisram section must be in AXI SRAM (0x24000000), got: {line}"
                );
            } else {
                panic!(".axisram section missing: TX_BUFFER/RX_BUFFER live there");
            }
        }
        Ok(out) => {
            eprintln!(
                "arm-none-eabi-readelf failed: {}",
                String::from_utf8_lossy(&out.stderr)
            );
        }
        Err(e) => {
            eprintln!("SKIP: arm-none-eabi-readelf not found: {e}");
        }
    }
}

#[test]
fn transfer_buffers_not_in_dtcm() {
    let elf_path = require_elf!();

    let output = std::process::Command::new("arm-none-eabi-nm")
        .args(["--print-size", "--radix=hex", elf_path.to_str().unwrap()])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            // DTCM is 0x20000000–0x20020000 (128 KB)
            // TX_BUFFER and RX_BUFFER must sit in AXI SRAM
            for line in text.lines() {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 4 {
                    let addr_str = parts[0];
                    let name = parts[parts.len() - 1];
                    if name.contains("TX_BUFFER") || name.contains("RX_BUFFER") {
                        if let Ok(addr) = u32::from_str_radix(addr_str, 16) {
                            assert!(
                                platform::dma::is_dma_accessible(addr, TEST_DATA_LENGTH as u32),
                                "{name} at 0x{addr:08X} is not DMA reachable"
                            );
                        }
                    }
                }
            }
        }
        Ok(_) | Err(_) => {
            eprintln!("SKIP: arm-none-eabi-nm not available");
        }
    }
}

fn memory_x() -> String {
    std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/../../memory.x"))
        .expect("memory.x must exist at workspace root")
}

#[test]
fn memory_x_axisram_section_defined() {
    let memory_x = memory_x();
    assert!(
        memory_x.contains(".axisram (NOLOAD)"),
        "memory.x must define .axisram NOLOAD section"
    );
    assert!(
        memory_x.contains("} > AXISRAM"),
        "memory.x .axisram section must target AXISRAM"
    );
    assert!(
        memory_x.contains("ORIGIN = 0x24000000"),
        "memory.x must define AXISRAM region at 0x24000000"
    );
}

#[test]
fn memory_x_dtcm_not_dma_accessible_documented() {
    let memory_x = memory_x();
    assert!(
        memory_x.contains("not reachable by DMA"),
        "memory.x must document that DTCM is NOT DMA-accessible"
    );
}

#[test]
fn axisram_section_is_cache_line_aligned() {
    let memory_x = memory_x();
    assert!(memory_x.contains("ALIGN(32)"));
}
