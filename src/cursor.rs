
/// Forward-only reader over a caller-owned byte buffer.
///
/// Every read checks the remaining capacity first. A failed read returns
/// `None` and leaves the position unchanged, so the cursor can never advance
/// past the end of the buffer.
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> ByteReader<'a> {
        ByteReader { buf, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub(crate) fn bytes_consumed(&self) -> usize {
        self.pos
    }

    /// Number of bytes left to read.
    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn read_byte(&mut self) -> Option<u8> {
        let b = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    /// Reads a little-endian 16-bit sample (low byte first).
    pub(crate) fn read_sample(&mut self) -> Option<i16> {
        if self.remaining() < 2 {
            return None;
        }
        let sample = i16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
        self.pos += 2;
        Some(sample)
    }
}

/// Forward-only writer over a caller-owned byte buffer.
///
/// Every write checks the remaining capacity first. A failed write returns
/// `false` and leaves the buffer and position unchanged.
#[derive(Debug)]
pub(crate) struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> ByteWriter<'a> {
        ByteWriter { buf, pos: 0 }
    }

    /// Number of bytes written so far.
    pub(crate) fn bytes_consumed(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    #[must_use]
    pub(crate) fn write_byte(&mut self, value: u8) -> bool {
        if let Some(slot) = self.buf.get_mut(self.pos) {
            *slot = value;
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Writes a little-endian 16-bit sample (low byte first).
    ///
    /// Fails atomically: a buffer with only one byte left is not written to,
    /// so the output never ends in half a sample.
    #[must_use]
    pub(crate) fn write_sample(&mut self, value: i16) -> bool {
        if self.remaining() < 2 {
            return false;
        }
        let bytes = value.to_le_bytes();
        self.buf[self.pos] = bytes[0];
        self.buf[self.pos + 1] = bytes[1];
        self.pos += 2;
        true
    }
}
