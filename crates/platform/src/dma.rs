//! DMA buffer placement rules for STM32H743ZI.
//!
//! | Memory Region | Base Address | Size   | DMA1/2 | Use case |
//! |---------------|-------------|--------|--------|----------|
//! | DTCM          | 0x2000_0000 | 128 KB | NO     | CPU-only: stack, ISR scratch |
//! | AXI SRAM      | 0x2400_0000 | 512 KB | YES    | SPI TX/RX transfer buffers |
//! | SRAM1/2 (D2)  | 0x3000_0000 | 256 KB | YES    | Embassy task stacks |
//!
//! The SPI DMA streams (DMA1) cannot reach DTCM. A buffer declared on the
//! stack of the main task lands in DTCM and the transfer silently moves
//! zeroes, so the transfer buffers are statics in `.axisram`.
//!
//! ```rust,ignore
//! #[link_section = ".axisram"]
//! static TX: StaticCell<Align32<[u8; TEST_DATA_LENGTH]>> = StaticCell::new();
//! ```

/// Base address of AXI SRAM (DMA1/2/MDMA accessible, D1 domain).
pub const AXI_SRAM_BASE: u32 = 0x2400_0000;

/// Size of AXI SRAM in bytes (512 KB).
pub const AXI_SRAM_SIZE_BYTES: u32 = 512 * 1024;

/// Base address of DTCM (not reachable by any DMA controller).
pub const DTCM_BASE: u32 = 0x2000_0000;

/// Size of DTCM in bytes (128 KB).
pub const DTCM_SIZE_BYTES: u32 = 128 * 1024;

/// Base address of D2 SRAM1/2/3.
pub const SRAM_D2_BASE: u32 = 0x3000_0000;

/// Size of D2 SRAM1/2/3 in bytes (288 KB).
pub const SRAM_D2_SIZE_BYTES: u32 = 288 * 1024;

/// Cortex-M7 D-cache line size.
pub const CACHE_LINE_BYTES: usize = 32;

/// Check that `[addr, addr + len)` lies entirely inside memory DMA1/DMA2
/// can reach (AXI SRAM or D2 SRAM).
#[must_use]
pub fn is_dma_accessible(addr: u32, len: u32) -> bool {
    let Some(end) = addr.checked_add(len) else {
        return false;
    };
    within(addr, end, AXI_SRAM_BASE, AXI_SRAM_SIZE_BYTES)
        || within(addr, end, SRAM_D2_BASE, SRAM_D2_SIZE_BYTES)
}

fn within(start: u32, end: u32, base: u32, size: u32) -> bool {
    match base.checked_add(size) {
        Some(limit) => start >= base && end <= limit,
        None => false,
    }
}

/// A `#[repr(align(32))]` wrapper that puts a DMA buffer on its own
/// cache lines.
///
/// ```ignore
/// use platform::dma::Align32;
///
/// #[link_section = ".axisram"]
/// static mut RX: Align32<[u8; 2000]> = Align32([0u8; 2000]);
/// ```
#[derive(Clone, Copy)]
#[repr(align(32))]
pub struct Align32<T>(
    /// The inner value. Public so callers can construct and destructure the wrapper.
    pub T,
);

impl<T> core::ops::Deref for Align32<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::DerefMut for Align32<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
