use std::borrow::Cow;
use std::marker::PhantomData;

use crate::bb::ByteBuffer;

/// A table inside a reflection buffer, addressed by its absolute position.
///
/// Field access goes through the table's vtable: slot `n` is described by the
/// `u16` at vtable byte `4 + 2n`, which holds the field's offset from the start
/// of the table, or zero when the field was not written.
#[derive(Clone, Copy, Debug)]
pub struct Table<'a> {
    bb:  ByteBuffer<'a>,
    pos: usize,
}

impl<'a> Table<'a> {
    /// Bind a table at `pos`. Returns `None` if the table header or its vtable
    /// header lies outside the buffer.
    pub fn new(bb: ByteBuffer<'a>, pos: usize) -> Option<Table<'a>> {
        let table = Table { bb, pos };
        let vtable = table.vtable()?;
        bb.read_u16(vtable + 2)?;
        Some(table)
    }

    pub fn buffer(&self) -> ByteBuffer<'a> {
        self.bb
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    fn vtable(&self) -> Option<usize> {
        let soffset = self.bb.read_i32(self.pos)? as i64;
        let vtable = self.pos as i64 - soffset;
        usize::try_from(vtable).ok()
    }

    /// Absolute position of the field stored in `slot`, if present.
    pub fn field(&self, slot: u16) -> Option<usize> {
        let vtable = self.vtable()?;
        let vtable_len = self.bb.read_u16(vtable)? as usize;
        let entry = 4 + 2 * slot as usize;
        if entry + 2 > vtable_len {
            return None;
        }
        match self.bb.read_u16(vtable + entry)? {
            0 => None,
            offset => Some(self.pos + offset as usize),
        }
    }

    pub fn get_bool(&self, slot: u16, default: bool) -> bool {
        self.field(slot)
            .and_then(|at| self.bb.read_bool(at))
            .unwrap_or(default)
    }

    pub fn get_i8(&self, slot: u16, default: i8) -> i8 {
        self.field(slot)
            .and_then(|at| self.bb.read_i8(at))
            .unwrap_or(default)
    }

    pub fn get_u16(&self, slot: u16, default: u16) -> u16 {
        self.field(slot)
            .and_then(|at| self.bb.read_u16(at))
            .unwrap_or(default)
    }

    pub fn get_i32(&self, slot: u16, default: i32) -> i32 {
        self.field(slot)
            .and_then(|at| self.bb.read_i32(at))
            .unwrap_or(default)
    }

    pub fn get_i64(&self, slot: u16, default: i64) -> i64 {
        self.field(slot)
            .and_then(|at| self.bb.read_i64(at))
            .unwrap_or(default)
    }

    pub fn get_f64(&self, slot: u16, default: f64) -> f64 {
        self.field(slot)
            .and_then(|at| self.bb.read_f64(at))
            .unwrap_or(default)
    }

    /// String stored in `slot`, or `None` when the slot is absent.
    pub fn get_opt_str(&self, slot: u16) -> Option<Cow<'a, str>> {
        let at = self.bb.follow(self.field(slot)?)?;
        self.bb.read_string(at)
    }

    /// String stored in `slot`; an absent slot reads as the empty string.
    pub fn get_str(&self, slot: u16) -> Cow<'a, str> {
        self.get_opt_str(slot).unwrap_or(Cow::Borrowed(""))
    }

    /// Sub-table referenced from `slot`.
    pub fn get_table(&self, slot: u16) -> Option<Table<'a>> {
        let at = self.bb.follow(self.field(slot)?)?;
        Table::new(self.bb, at)
    }

    /// Vector of `T` referenced from `slot`; an absent slot reads as empty.
    pub fn get_vector<T: Follow<'a>>(&self, slot: u16) -> Vector<'a, T> {
        self.field(slot)
            .and_then(|at| self.bb.follow(at))
            .map(|at| Vector::new(self.bb, at))
            .unwrap_or_else(|| Vector::empty(self.bb))
    }
}

/// Decode a vector element from the offset word stored at `pos`. Decoding is
/// total: an offset that leads nowhere yields a detached value that reads as
/// all defaults.
pub trait Follow<'a>: Sized {
    fn follow(bb: ByteBuffer<'a>, pos: usize) -> Self;
}

impl<'a> Follow<'a> for Table<'a> {
    fn follow(bb: ByteBuffer<'a>, pos: usize) -> Self {
        bb.follow(pos)
            .and_then(|at| Table::new(bb, at))
            .unwrap_or(Table { bb, pos: usize::MAX })
    }
}

impl<'a> Follow<'a> for Cow<'a, str> {
    fn follow(bb: ByteBuffer<'a>, pos: usize) -> Self {
        bb.follow(pos)
            .and_then(|at| bb.read_string(at))
            .unwrap_or(Cow::Borrowed(""))
    }
}

/// A length-prefixed vector of offsets, decoded element by element on access.
#[derive(Debug)]
pub struct Vector<'a, T> {
    bb:     ByteBuffer<'a>,
    start:  usize,
    len:    usize,
    marker: PhantomData<T>,
}

impl<T> Clone for Vector<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Vector<'_, T> {}

impl<'a, T: Follow<'a>> Vector<'a, T> {
    fn new(bb: ByteBuffer<'a>, pos: usize) -> Vector<'a, T> {
        // Clamp the declared length to what the buffer can actually hold.
        let declared = bb.read_u32(pos).unwrap_or(0) as usize;
        let room = bb.len().saturating_sub(pos + 4) / 4;
        Vector {
            bb,
            start: pos + 4,
            len: declared.min(room),
            marker: PhantomData,
        }
    }

    fn empty(bb: ByteBuffer<'a>) -> Vector<'a, T> {
        Vector { bb, start: 0, len: 0, marker: PhantomData }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Element `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> T {
        assert!(
            i < self.len,
            "index {i} out of range for vector of length {}",
            self.len
        );
        T::follow(self.bb, self.start + 4 * i)
    }

    pub fn iter(&self) -> VectorIter<'a, T> {
        VectorIter { vector: *self, next: 0 }
    }
}

pub struct VectorIter<'a, T> {
    vector: Vector<'a, T>,
    next:   usize,
}

impl<'a, T: Follow<'a>> Iterator for VectorIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.next >= self.vector.len {
            return None;
        }
        let item = self.vector.get(self.next);
        self.next += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.vector.len - self.next;
        (left, Some(left))
    }
}

impl<'a, T: Follow<'a>> ExactSizeIterator for VectorIter<'a, T> {}

impl<'a, T: Follow<'a>> IntoIterator for Vector<'a, T> {
    type Item = T;
    type IntoIter = VectorIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
