use std::borrow::Cow;

/// A read-only view over a little-endian reflection buffer.
///
/// Unlike a cursor, every read takes an absolute position and nothing is
/// consumed, so the same buffer can be walked in any order. Reads that would
/// cross the end of the buffer return `None`.
///
/// ```
/// let bb = xidl_schema::ByteBuffer::new(&[4, 0, 0, 0, 2, 0, 0, 0, b'h', b'i']);
/// assert_eq!(bb.read_u32(0), Some(4));
/// assert_eq!(bb.read_string(4).as_deref(), Some("hi"));
/// assert_eq!(bb.read_u32(8), None);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ByteBuffer<'a> {
    data: &'a [u8],
}

impl<'a> ByteBuffer<'a> {
    /// Wrap the provided byte slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read `len` raw bytes starting at `pos`.
    pub fn read_bytes(&self, pos: usize, len: usize) -> Option<&'a [u8]> {
        let end = pos.checked_add(len)?;
        self.data.get(pos..end)
    }

    fn read_array<const N: usize>(&self, pos: usize) -> Option<[u8; N]> {
        self.read_bytes(pos, N)?.try_into().ok()
    }

    pub fn read_u8(&self, pos: usize) -> Option<u8> {
        self.data.get(pos).copied()
    }

    pub fn read_i8(&self, pos: usize) -> Option<i8> {
        self.read_u8(pos).map(|b| b as i8)
    }

    pub fn read_bool(&self, pos: usize) -> Option<bool> {
        self.read_u8(pos).map(|b| b != 0)
    }

    pub fn read_u16(&self, pos: usize) -> Option<u16> {
        self.read_array(pos).map(u16::from_le_bytes)
    }

    pub fn read_i32(&self, pos: usize) -> Option<i32> {
        self.read_array(pos).map(i32::from_le_bytes)
    }

    pub fn read_u32(&self, pos: usize) -> Option<u32> {
        self.read_array(pos).map(u32::from_le_bytes)
    }

    pub fn read_i64(&self, pos: usize) -> Option<i64> {
        self.read_array(pos).map(i64::from_le_bytes)
    }

    pub fn read_f64(&self, pos: usize) -> Option<f64> {
        self.read_array(pos).map(f64::from_le_bytes)
    }

    /// Follow the unsigned offset stored at `pos`. Offsets are relative to
    /// the position they are stored at.
    pub fn follow(&self, pos: usize) -> Option<usize> {
        let rel = self.read_u32(pos)? as usize;
        let target = pos.checked_add(rel)?;
        (target < self.data.len()).then_some(target)
    }

    /// Read a length-prefixed UTF-8 string whose length word sits at `pos`.
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn read_string(&self, pos: usize) -> Option<Cow<'a, str>> {
        let len = self.read_u32(pos)? as usize;
        let bytes = self.read_bytes(pos + 4, len)?;
        Some(String::from_utf8_lossy(bytes))
    }
}

#[test]
fn read_u8() {
    let bb = ByteBuffer::new(&[0, 1, 255]);
    assert_eq!(bb.read_u8(0), Some(0));
    assert_eq!(bb.read_u8(2), Some(255));
    assert_eq!(bb.read_u8(3), None);
    assert_eq!(bb.read_i8(2), Some(-1));
    assert_eq!(bb.read_bool(1), Some(true));
}

#[test]
fn read_fixed_width() {
    let bb = ByteBuffer::new(&[0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(bb.read_u16(0), Some(0x1234));
    assert_eq!(bb.read_i32(2), Some(-1));
    assert_eq!(bb.read_u32(0), Some(0xFFFF_1234));
    assert_eq!(bb.read_u32(3), None);
    assert_eq!(bb.read_i64(0), None);
}

#[test]
fn read_out_of_range_position() {
    let bb = ByteBuffer::new(&[1, 2, 3]);
    assert_eq!(bb.read_bytes(usize::MAX, 2), None);
    assert_eq!(bb.read_u16(usize::MAX), None);
    assert_eq!(bb.follow(usize::MAX - 1), None);
}

#[test]
fn follow_offset() {
    let bb = ByteBuffer::new(&[0, 0, 8, 0, 0, 0, 0, 0, 0, 0, 9]);
    assert_eq!(bb.follow(2), Some(10));
    assert_eq!(bb.follow(0), None);
    let dangling = ByteBuffer::new(&[200, 0, 0, 0]);
    assert_eq!(dangling.follow(0), None);
}

#[test]
fn read_string() {
    let bb = ByteBuffer::new(&[4, 0, 0, 0, 240, 159, 141, 149, 0]);
    assert_eq!(bb.read_string(0), Some(Cow::Borrowed("🍕")));
    let short = ByteBuffer::new(&[9, 0, 0, 0, b'a']);
    assert_eq!(short.read_string(0), None);
}

/// A growable little-endian buffer used to lay out reflection tables.
///
/// ```
/// let mut bb = xidl_schema::ByteBufferMut::new();
/// let at = bb.len();
/// bb.write_u32(0);
/// bb.write_string("hi");
/// bb.patch_u32(at, 7);
/// assert_eq!(bb.data(), [7, 0, 0, 0, 2, 0, 0, 0, b'h', b'i', 0]);
/// ```
#[derive(Debug, Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Consumes this buffer and returns the underlying backing store.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.data.push(u8::from(value));
    }

    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write a length-prefixed, NUL-terminated UTF-8 string.
    pub fn write_string(&mut self, value: &str) {
        self.write_u32(value.len() as u32);
        self.write_bytes(value.as_bytes());
        self.data.push(0);
    }

    /// Overwrite four bytes at `pos` with `value`.
    pub fn patch_u32(&mut self, pos: usize, value: u32) {
        self.data[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn patch_i32(&mut self, pos: usize, value: i32) {
        self.data[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    pub fn patch_u16(&mut self, pos: usize, value: u16) {
        self.data[pos..pos + 2].copy_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_fixed_width() {
    assert_eq!(write_once(|bb| bb.write_bool(true)), [1]);
    assert_eq!(write_once(|bb| bb.write_u16(0x1234)), [0x34, 0x12]);
    assert_eq!(write_once(|bb| bb.write_i32(-2)), [0xFE, 0xFF, 0xFF, 0xFF]);
    assert_eq!(write_once(|bb| bb.write_i64(1)), [1, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn write_string() {
    assert_eq!(write_once(|bb| bb.write_string("")), [0, 0, 0, 0, 0]);
    assert_eq!(
        write_once(|bb| bb.write_string("🍕")),
        [4, 0, 0, 0, 240, 159, 141, 149, 0]
    );
}

#[test]
fn write_then_read() {
    let mut out = ByteBufferMut::new();
    out.write_u32(0);
    out.write_u16(9);
    out.write_string("wamp");
    out.patch_u32(0, 6);
    let data = out.data();
    let bb = ByteBuffer::new(&data);
    assert_eq!(bb.read_u16(4), Some(9));
    let at = bb.follow(0).unwrap();
    assert_eq!(bb.read_string(at).as_deref(), Some("wamp"));
}
