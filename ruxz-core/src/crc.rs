//! CRC (Cyclic Redundancy Check) implementations.
//!
//! The XZ container uses two checksums:
//!
//! - **CRC-32 (ISO 3309)** for the structural checks (stream header, block
//!   headers, index) and as one of the stream check types.
//! - **CRC-64/ECMA-182 (reflected)** as the other common stream check type.
//!
//! Both use const-built lookup tables, one table per polynomial.

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-64 lookup table (polynomial 0xC96C5795D7870F42, reflected).
const CRC64_TABLE: [u64; 256] = {
    let mut table = [0u64; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u64;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xC96C5795D7870F42;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-32 calculator (ISO 3309).
///
/// - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
/// - Initial value: 0xFFFFFFFF
/// - Final XOR: 0xFFFFFFFF
///
/// # Example
///
/// ```
/// use ruxz_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"123456789");
/// assert_eq!(crc.finalize(), 0xCBF43926);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    /// Update the CRC with more data.
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.state;
        for &byte in data {
            crc = (crc >> 8) ^ CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize];
        }
        self.state = crc;
    }

    /// Finish and return the CRC value.
    pub fn finalize(&self) -> u32 {
        self.state ^ 0xFFFF_FFFF
    }

    /// Compute the CRC-32 of a complete buffer.
    pub fn compute(data: &[u8]) -> u32 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC-64/ECMA-182 calculator as used by the XZ check field.
///
/// - Polynomial: 0x42F0E1EBA9EA3693 (reflected: 0xC96C5795D7870F42)
/// - Initial value: 0xFFFFFFFFFFFFFFFF
/// - Final XOR: 0xFFFFFFFFFFFFFFFF
#[derive(Debug, Clone)]
pub struct Crc64 {
    state: u64,
}

impl Crc64 {
    /// Create a new CRC-64 calculator.
    pub fn new() -> Self {
        Self {
            state: 0xFFFF_FFFF_FFFF_FFFF,
        }
    }

    /// Update the CRC with more data.
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.state;
        for &byte in data {
            crc = (crc >> 8) ^ CRC64_TABLE[((crc ^ byte as u64) & 0xFF) as usize];
        }
        self.state = crc;
    }

    /// Finish and return the CRC value.
    pub fn finalize(&self) -> u64 {
        self.state ^ 0xFFFF_FFFF_FFFF_FFFF
    }

    /// Compute the CRC-64 of a complete buffer.
    pub fn compute(data: &[u8]) -> u64 {
        let mut crc = Self::new();
        crc.update(data);
        crc.finalize()
    }
}

impl Default for Crc64 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        // Standard check value for "123456789"
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), 0);
    }

    #[test]
    fn test_crc32_incremental_matches_oneshot() {
        let data = b"hello world, this is a crc test";
        let mut crc = Crc32::new();
        crc.update(&data[..10]);
        crc.update(&data[10..]);
        assert_eq!(crc.finalize(), Crc32::compute(data));
    }

    #[test]
    fn test_crc64_check_value() {
        // CRC-64/XZ check value for "123456789"
        assert_eq!(Crc64::compute(b"123456789"), 0x995DC9BBDF1939FA);
    }

    #[test]
    fn test_crc64_incremental_matches_oneshot() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut crc = Crc64::new();
        crc.update(&data[..7]);
        crc.update(&data[7..]);
        assert_eq!(crc.finalize(), Crc64::compute(data));
    }
}
