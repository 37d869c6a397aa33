//! Volatile access to memory-mapped register blocks.
//!
//! Every driver sits on a [`RegBlock`]: on hardware the base address comes
//! from the memory map, in tests it points at a plain buffer.

/// A bounds-checked window of 32-bit device registers.
#[derive(Debug, Clone, Copy)]
pub struct RegBlock {
    base: usize,
    len: usize,
}

impl RegBlock {
    /// # Safety
    ///
    /// `base..base + len` must stay a valid mapping for the block's lifetime
    /// (device registers on target, a live buffer in tests), not aliased by
    /// safe references.
    pub const unsafe fn new(base: usize, len: usize) -> Self {
        Self { base, len }
    }

    /// Read the 32-bit register at byte offset `offset`.
    ///
    /// # Safety
    ///
    /// `offset` must address a readable register of this block.
    #[inline]
    pub unsafe fn read_u32(&self, offset: usize) -> u32 {
        debug_assert!(offset + 4 <= self.len, "register read out of bounds");
        debug_assert!(offset % 4 == 0, "unaligned register read");
        core::ptr::read_volatile((self.base + offset) as *const u32)
    }

    /// Write the 32-bit register at byte offset `offset`.
    ///
    /// # Safety
    ///
    /// `offset` must address a writable register of this block.
    #[inline]
    pub unsafe fn write_u32(&self, offset: usize, value: u32) {
        debug_assert!(offset + 4 <= self.len, "register write out of bounds");
        debug_assert!(offset % 4 == 0, "unaligned register write");
        core::ptr::write_volatile((self.base + offset) as *mut u32, value);
    }

    /// Set `mask` bits in the register at `offset` (read-modify-write).
    ///
    /// # Safety
    ///
    /// Same contract as [`Self::read_u32`] and [`Self::write_u32`].
    #[inline]
    pub unsafe fn set_bits(&self, offset: usize, mask: u32) {
        self.write_u32(offset, self.read_u32(offset) | mask);
    }

    /// Clear `mask` bits in the register at `offset` (read-modify-write).
    ///
    /// # Safety
    ///
    /// Same contract as [`Self::read_u32`] and [`Self::write_u32`].
    #[inline]
    pub unsafe fn clear_bits(&self, offset: usize, mask: u32) {
        self.write_u32(offset, self.read_u32(offset) & !mask);
    }
}
