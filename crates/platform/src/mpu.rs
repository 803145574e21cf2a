//! MPU (Memory Protection Unit) configuration for STM32H743 / Cortex-M7
//!
//! # Purpose
//!
//! The SPI transfer buffers are written by the CPU (TX fill) and by DMA
//! (RX). With the D-cache on, the CPU may read a stale RX line or DMA may
//! read a TX line still sitting in cache. Marking AXI SRAM non-cacheable
//! before any DMA starts removes both hazards without per-transfer cache
//! maintenance.
//!
//! # References
//!
//! - ARM Cortex-M7 TRM DDI0489F: MPU Region Attribute and Size Register
//! - ST AN4838: Introduction to MPU Management on STM32 MCUs
//! - ST AN4839: Level 1 cache on STM32F7 and STM32H7
//!
//! # MPU Region Requirements (Cortex-M7, ARM DDI0489F §B3.5)
//!
//! - Minimum region size: **32 bytes** (SIZE field = 4)
//! - Size must be a **power of 2**
//! - Base address must be **aligned to the region size**
//! - SIZE field encoding: `SIZE = log2(size_bytes) − 1`
//!
//! Non-cacheable normal memory is **TEX = 001, S = 0, C = 0, B = 0**.

use crate::dma::{AXI_SRAM_BASE, AXI_SRAM_SIZE_BYTES};

/// MPU configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MpuError {
    /// Region size is not a power of two.
    SizeNotPowerOfTwo,
    /// Region size is zero.
    SizeZero,
    /// Base address is not aligned to the region size.
    AddressMisaligned,
    /// Region size is below the 32-byte Cortex-M7 minimum.
    SizeTooSmall,
}

/// Memory attributes for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MpuAttributes {
    /// Non-cacheable normal memory for CPU/DMA shared buffers.
    ///
    /// TEX=001, S=0, C=0, B=0
    NonCacheable,
    /// Write-back, no write-allocate: CPU-only RAM.
    ///
    /// TEX=000, S=0, C=1, B=1
    WriteBackNoWriteAllocate,
}

/// A validated MPU region descriptor.
#[derive(Debug, Clone, Copy)]
pub struct MpuRegion {
    base: u32,
    size: u32,
    attrs: MpuAttributes,
}

impl MpuRegion {
    /// Create a new MPU region, validating size and alignment.
    ///
    /// # Errors
    ///
    /// - [`MpuError::SizeZero`] if `size == 0`
    /// - [`MpuError::SizeTooSmall`] if `size < 32`
    /// - [`MpuError::SizeNotPowerOfTwo`] if `size` is not a power of two
    /// - [`MpuError::AddressMisaligned`] if `base % size != 0`
    pub fn new(base: u32, size: u32, attrs: MpuAttributes) -> Result<Self, MpuError> {
        if size == 0 {
            return Err(MpuError::SizeZero);
        }
        if size < 32 {
            return Err(MpuError::SizeTooSmall);
        }
        if !size.is_power_of_two() {
            return Err(MpuError::SizeNotPowerOfTwo);
        }
        if base & (size.wrapping_sub(1)) != 0 {
            return Err(MpuError::AddressMisaligned);
        }
        Ok(Self { base, size, attrs })
    }

    /// Encode the size as the RASR `SIZE` field value (`log2(size) − 1`).
    ///
    /// # Errors
    ///
    /// - [`MpuError::SizeZero`] if `size == 0`
    /// - [`MpuError::SizeNotPowerOfTwo`] if `size` is not a power of two
    #[allow(clippy::cast_possible_truncation)] // trailing_zeros() of a u32 is at most 31
    pub fn encode_size(size: u32) -> Result<u8, MpuError> {
        if size == 0 {
            return Err(MpuError::SizeZero);
        }
        if !size.is_power_of_two() {
            return Err(MpuError::SizeNotPowerOfTwo);
        }
        Ok((size.trailing_zeros() as u8).saturating_sub(1))
    }

    /// Base address of this region.
    #[must_use]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Size of this region in bytes.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Memory attributes assigned to this region.
    #[must_use]
    pub fn attrs(&self) -> MpuAttributes {
        self.attrs
    }

    /// `(RBAR, RASR)` register pair for hardware slot `region_number`.
    ///
    /// RBAR sets VALID=1 so the REGION field selects the slot.
    /// RASR carries AP=full access, XN=1, the attribute bits, SIZE and ENABLE.
    #[must_use]
    pub fn register_pair(&self, region_number: u8) -> (u32, u32) {
        let rbar = self.base | (1 << 4) | (u32::from(region_number) & 0xF);
        let attr = match self.attrs {
            MpuAttributes::NonCacheable => NON_CACHEABLE_ATTR_MASK,
            MpuAttributes::WriteBackNoWriteAllocate => WRITE_BACK_ATTR_MASK,
        };
        // size was validated in `new`, so encode_size cannot fail here
        let size_field = Self::encode_size(self.size).unwrap_or(0);
        let rasr = attr | (u32::from(size_field) << 1) | 1;
        (rbar, rasr)
    }
}

/// RASR attribute bits for non-cacheable DMA memory: XN=1, AP=011, TEX=001.
pub const NON_CACHEABLE_ATTR_MASK: u32 = 0x1308_0000;

/// RASR attribute bits for write-back RAM: XN=1, AP=011, TEX=000, C=1, B=1.
pub const WRITE_BACK_ATTR_MASK: u32 = 0x1303_0000;

/// Region holding the SPI transfer buffers (whole AXI SRAM, non-cacheable).
#[must_use]
pub fn transfer_buffer_region() -> MpuRegion {
    MpuRegion {
        base: AXI_SRAM_BASE,
        size: AXI_SRAM_SIZE_BYTES,
        attrs: MpuAttributes::NonCacheable,
    }
}

/// `(RBAR, RASR)` pairs to program at boot, in slot order.
///
/// | Slot | Region   | Base        | Size   | RBAR        | RASR        |
/// |------|----------|-------------|--------|-------------|-------------|
/// | 0    | AXI SRAM | 0x2400_0000 | 512 KB | 0x2400_0010 | 0x1308_0025 |
#[must_use]
pub fn boot_register_pairs() -> [(u32, u32); 1] {
    [transfer_buffer_region().register_pair(0)]
}
