//! Circular output window (the LZMA dictionary).
//!
//! Decoded bytes land in a circular buffer so that back-references can be
//! resolved against recent output. Whenever the write position wraps, the
//! pending span is flushed into the growing output vector.

/// Circular dictionary buffer with an attached output accumulator.
#[derive(Debug)]
pub struct OutputWindow {
    buf: Vec<u8>,
    size: usize,
    pos: usize,
    stream_pos: usize,
    out: Vec<u8>,
    total: u64,
}

impl OutputWindow {
    /// Create a window with the given dictionary size.
    pub fn new(dict_size: u32) -> Self {
        let size = dict_size as usize;
        Self {
            buf: vec![0; size],
            size,
            pos: 0,
            stream_pos: 0,
            out: Vec::new(),
            total: 0,
        }
    }

    /// Total number of bytes flushed into the output so far.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Total number of bytes produced, counting the span not yet flushed.
    /// Unlike the write position, this never goes backward on a reset.
    pub fn produced(&self) -> u64 {
        self.total + (self.pos - self.stream_pos) as u64
    }

    /// Append one decoded byte.
    pub fn put_byte(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.pos += 1;
        if self.pos >= self.size {
            self.flush();
        }
    }

    /// Read a byte `dist` positions behind the write head (0 = most recent).
    pub fn get_byte(&self, dist: u32) -> u8 {
        let dist = dist as usize;
        let index = if dist < self.pos {
            self.pos - dist - 1
        } else {
            self.size - dist + self.pos - 1
        };
        self.buf[index]
    }

    /// Copy `len` bytes starting `dist` positions behind the write head.
    /// Overlapping copies replay bytes as they are written, so a distance
    /// of 0 repeats the last byte `len` times.
    pub fn copy_block(&mut self, dist: u32, len: u32) {
        let dist = dist as usize;
        let mut src = if dist < self.pos {
            self.pos - dist - 1
        } else {
            self.size - dist + self.pos - 1
        };

        for _ in 0..len {
            if src >= self.size {
                src = 0;
            }
            self.buf[self.pos] = self.buf[src];
            self.pos += 1;
            src += 1;
            if self.pos >= self.size {
                self.flush();
            }
        }
    }

    /// Move the pending span `[stream_pos, pos)` into the output vector and
    /// wrap the write head if it reached the end of the buffer.
    pub fn flush(&mut self) {
        let span = self.pos - self.stream_pos;
        if span > 0 {
            self.out
                .extend_from_slice(&self.buf[self.stream_pos..self.pos]);
            self.total += span as u64;
        }
        if self.pos >= self.size {
            self.pos = 0;
        }
        self.stream_pos = self.pos;
    }

    /// Discard the dictionary history. Pending output is flushed first.
    pub fn reset(&mut self) {
        self.flush();
        self.pos = 0;
        self.stream_pos = 0;
    }

    /// Flush and take the accumulated output.
    pub fn take_output(&mut self) -> Vec<u8> {
        self.flush();
        std::mem::take(&mut self.out)
    }

    /// Append a run of already-decoded bytes (uncompressed LZMA2 chunks).
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.put_byte(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let mut win = OutputWindow::new(16);
        win.put_byte(b'a');
        win.put_byte(b'b');
        win.put_byte(b'c');
        assert_eq!(win.get_byte(0), b'c');
        assert_eq!(win.get_byte(2), b'a');
    }

    #[test]
    fn test_copy_block_non_overlapping() {
        let mut win = OutputWindow::new(16);
        win.put_bytes(b"abcd");
        win.copy_block(3, 2);
        assert_eq!(win.take_output(), b"abcdab");
    }

    #[test]
    fn test_copy_block_overlapping_repeats() {
        let mut win = OutputWindow::new(16);
        win.put_byte(b'x');
        // dist 0 replays the byte just written
        win.copy_block(0, 5);
        assert_eq!(win.take_output(), b"xxxxxx");
    }

    #[test]
    fn test_wraparound_flushes() {
        let mut win = OutputWindow::new(4);
        win.put_bytes(b"abcdef");
        assert_eq!(win.take_output(), b"abcdef");
        // back-references still resolve across the wrap
        assert_eq!(win.get_byte(0), b'f');
        assert_eq!(win.get_byte(1), b'e');
    }

    #[test]
    fn test_copy_across_wrap() {
        let mut win = OutputWindow::new(4);
        win.put_bytes(b"abcd");
        win.copy_block(3, 3);
        assert_eq!(win.take_output(), b"abcdabc");
    }

    #[test]
    fn test_reset_clears_history_position() {
        let mut win = OutputWindow::new(8);
        win.put_bytes(b"abc");
        win.reset();
        win.put_bytes(b"xy");
        assert_eq!(win.get_byte(1), b'x');
        assert_eq!(win.take_output(), b"abcxy");
        assert_eq!(win.total(), 5);
    }
}
