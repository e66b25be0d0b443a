//! Low-level components dedicated to bit manipulation for NMEA 2000 payloads.
//! Fields are packed LSB-first and seldom align with byte boundaries, so both
//! the reader and the writer address the buffer in bits.
use crate::error::{BitReaderError, BitWriterError};

/// Mask with the `bits` lowest bits set (`bits` in 0..=64).
#[inline]
pub(crate) const fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Sequential reader extracting bit segments from a `&[u8]`
/// without extra allocation or copies.
pub struct BitReader<'a> {
    /// Source buffer (typically a reassembled payload).
    buffer: &'a [u8],
    /// Current index expressed as number of bits consumed from the beginning.
    bit_cursor: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at the start of the provided buffer.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            bit_cursor: 0,
        }
    }

    /// Bits left between the cursor and the end of the buffer.
    pub fn remaining_bits(&self) -> usize {
        (self.buffer.len() * 8).saturating_sub(self.bit_cursor)
    }

    /// Read `num_bits` bits (1..=64) starting at the cursor.
    pub fn read_u64(&mut self, num_bits: u8) -> Result<u64, BitReaderError> {
        if !(1..=64).contains(&num_bits) {
            return Err(BitReaderError::TooLongForType {
                max: 64,
                asked: num_bits,
            });
        }
        let available = self.remaining_bits();
        if num_bits as usize > available {
            return Err(BitReaderError::OutOfBounds {
                asked: num_bits as usize,
                available,
            });
        }

        let mut result: u64 = 0;
        let mut bits_read: usize = 0;
        while bits_read < num_bits as usize {
            let absolute = self.bit_cursor + bits_read;
            let byte = self.buffer[absolute / 8];
            let offset = absolute % 8;
            let chunk = (8 - offset).min(num_bits as usize - bits_read);

            let mask = ((1u16 << chunk) - 1) as u8;
            result |= (((byte >> offset) & mask) as u64) << bits_read;
            bits_read += chunk;
        }
        self.bit_cursor += num_bits as usize;
        Ok(result)
    }

    /// Advance the cursor by `num_bits` without reading data.
    pub fn skip(&mut self, num_bits: usize) -> Result<(), BitReaderError> {
        let available = self.remaining_bits();
        if num_bits > available {
            return Err(BitReaderError::OutOfBounds {
                asked: num_bits,
                available,
            });
        }
        self.bit_cursor += num_bits;
        Ok(())
    }
}
//==================================================================================BITWRITER

/// Sequential writer laying bit segments into a `&mut [u8]`
/// without assuming byte alignment.
pub struct BitWriter<'a> {
    /// Target buffer.
    buffer: &'a mut [u8],
    /// Current position expressed in bits written.
    bit_cursor: usize,
}

impl<'a> BitWriter<'a> {
    /// Create a writer positioned at the start of the buffer.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            bit_cursor: 0,
        }
    }

    /// Number of bytes touched so far (a partial byte counts as one).
    pub fn byte_len(&self) -> usize {
        self.bit_cursor.div_ceil(8)
    }

    /// Write the `num_bits` (1..=64) lowest bits of `value`.
    pub fn write_u64(&mut self, value: u64, num_bits: u8) -> Result<(), BitWriterError> {
        if !(1..=64).contains(&num_bits) {
            return Err(BitWriterError::TooLongForType {
                max: 64,
                asked: num_bits,
            });
        }
        let available = (self.buffer.len() * 8).saturating_sub(self.bit_cursor);
        if num_bits as usize > available {
            return Err(BitWriterError::OutOfBounds {
                asked: num_bits as usize,
                available,
            });
        }

        let mut remaining = value;
        let mut bits_written: usize = 0;
        while bits_written < num_bits as usize {
            let absolute = self.bit_cursor + bits_written;
            let index = absolute / 8;
            let offset = absolute % 8;
            let chunk = (8 - offset).min(num_bits as usize - bits_written);

            let mask = ((1u16 << chunk) - 1) as u8;
            self.buffer[index] &= !(mask << offset);
            self.buffer[index] |= (remaining as u8 & mask) << offset;
            remaining >>= chunk;
            bits_written += chunk;
        }
        self.bit_cursor += num_bits as usize;
        Ok(())
    }

    /// Fill `num_bits` with ones (reserved bits), in chunks of up to 64 bits.
    pub fn write_ones(&mut self, num_bits: usize) -> Result<(), BitWriterError> {
        let mut left = num_bits;
        while left > 0 {
            let chunk = left.min(64);
            self.write_u64(u64::MAX, chunk as u8)?;
            left -= chunk;
        }
        Ok(())
    }

    /// Fill `num_bits` with zeros (spare bits).
    pub fn write_zeros(&mut self, num_bits: usize) -> Result<(), BitWriterError> {
        let mut left = num_bits;
        while left > 0 {
            let chunk = left.min(64);
            self.write_u64(0, chunk as u8)?;
            left -= chunk;
        }
        Ok(())
    }
}
