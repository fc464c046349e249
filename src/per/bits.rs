//! Reading and writing bits.
//!
//! This is a private module. Its public items are re-exported by the
//! parent.

use std::ops;
use bitvec::prelude::*;
use bytes::Bytes;
use crate::decode::ContentError;
use crate::encode::Target;


//------------ BitWriter -----------------------------------------------------

/// A buffer collecting bits.
///
/// Bits are appended most significant bit first. The complete encoding is
/// padded with zero bits to a full octet when it is taken out of the
/// writer.
#[derive(Clone, Debug, Default)]
pub struct BitWriter {
    bits: BitVec<u8, Msb0>,
}

impl BitWriter {
    /// Creates a new, empty writer.
    pub fn new() -> Self {
        BitWriter { bits: BitVec::new() }
    }

    /// Returns the number of bits written so far.
    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    /// Returns whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Appends a single bit.
    pub fn put_bit(&mut self, bit: bool) {
        self.bits.push(bit)
    }

    /// Appends the `count` least significant bits of `value`.
    ///
    /// # Panics
    ///
    /// The method panics if `count` is larger than 64.
    pub fn put_bits(&mut self, value: u64, count: u32) {
        let count = count as usize;
        self.bits.extend_from_bitslice(
            &value.view_bits::<Msb0>()[64 - count..]
        )
    }

    /// Appends full octets.
    pub fn put_octets(&mut self, data: &[u8]) {
        self.bits.extend_from_bitslice(data.view_bits::<Msb0>())
    }

    /// Appends the bits in `range` of `data`.
    ///
    /// # Panics
    ///
    /// The method panics if the range goes beyond the end of `data`.
    pub fn put_bit_range(&mut self, data: &[u8], range: ops::Range<usize>) {
        self.bits.extend_from_bitslice(&data.view_bits::<Msb0>()[range])
    }

    /// Appends everything written to another writer.
    pub fn append(&mut self, other: &BitWriter) {
        self.bits.extend_from_bitslice(&other.bits)
    }

    /// Pads the data with zero bits to a full octet.
    pub fn pad_to_octet(&mut self) {
        while self.bits.len() % 8 != 0 {
            self.bits.push(false)
        }
    }

    /// Converts the bits into octets, padding the last one with zeros.
    pub fn into_octets(mut self) -> Vec<u8> {
        self.pad_to_octet();
        self.bits.into_vec()
    }

    /// Writes the octets to a target.
    ///
    /// An empty encoding is written as a single zero octet since a
    /// complete encoding is never empty.
    pub fn flush<T: Target>(self, target: &mut T) -> Result<(), T::Error> {
        if self.bits.is_empty() {
            target.write_all(&[0])
        }
        else {
            target.write_all(&self.into_octets())
        }
    }
}


//------------ Refill --------------------------------------------------------

/// A source of more data for a bit cursor.
///
/// When a cursor has read all its data it asks its refill, if it has one,
/// for the next chunk. This is used for reading an open type whose
/// encoding is spread over several fragments.
pub trait Refill {
    /// Returns the next chunk of data or `None` if there is no more.
    fn refill(&mut self) -> Result<Option<Bytes>, ContentError>;
}


//------------ BitCursor -----------------------------------------------------

/// A cursor for reading bits.
///
/// The cursor reads from a chunk of octets. If a refill has been attached,
/// it is asked for the next chunk once the current one is exhausted.
/// Running out of data results in an error with reason
/// [`Incomplete`][crate::decode::Reason::Incomplete].
pub struct BitCursor<'a> {
    /// The current chunk.
    data: Bytes,

    /// The position of the next bit within the chunk.
    pos: usize,

    /// The number of bits in the chunk.
    end: usize,

    /// The number of bits in all previous chunks.
    base: usize,

    /// Where to get the next chunk from.
    refill: Option<&'a mut dyn Refill>,
}

impl<'a> BitCursor<'a> {
    /// Creates a cursor over the given data.
    pub fn new(data: Bytes) -> Self {
        let end = data.len() * 8;
        BitCursor { data, pos: 0, end, base: 0, refill: None }
    }

    /// Creates a cursor that asks `refill` for more data.
    pub fn with_refill(data: Bytes, refill: &'a mut dyn Refill) -> Self {
        let end = data.len() * 8;
        BitCursor { data, pos: 0, end, base: 0, refill: Some(refill) }
    }

    /// Returns the number of bits read so far.
    pub fn pos(&self) -> usize {
        self.base + self.pos
    }

    /// Returns the number of bits left in the current chunk.
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Makes sure at least one bit is available.
    fn ensure(&mut self) -> Result<(), ContentError> {
        while self.pos == self.end {
            let chunk = match self.refill.as_mut() {
                Some(refill) => refill.refill()?,
                None => None
            };
            match chunk {
                Some(chunk) => {
                    self.base += self.end;
                    self.end = chunk.len() * 8;
                    self.data = chunk;
                    self.pos = 0;
                }
                None => return Err(ContentError::incomplete())
            }
        }
        Ok(())
    }

    /// Returns the bits left in the current chunk.
    fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.data.view_bits::<Msb0>()[self.pos..self.end]
    }

    /// Reads a single bit.
    pub fn get_bit(&mut self) -> Result<bool, ContentError> {
        self.ensure()?;
        let bit = self.bits()[0];
        self.pos += 1;
        Ok(bit)
    }

    /// Reads `count` bits as an unsigned integer.
    ///
    /// # Panics
    ///
    /// The method panics if `count` is larger than 64.
    pub fn get_bits(&mut self, count: u32) -> Result<u64, ContentError> {
        assert!(count <= 64);
        let count = count as usize;
        if count == 0 {
            return Ok(0)
        }
        if self.remaining() >= count {
            let res = self.bits()[..count].load_be::<u64>();
            self.pos += count;
            return Ok(res)
        }
        let mut res = 0;
        for _ in 0..count {
            res = (res << 1) | u64::from(self.get_bit()?);
        }
        Ok(res)
    }

    /// Reads `count` octets.
    pub fn get_octets(&mut self, count: usize) -> Result<Vec<u8>, ContentError> {
        if self.pos % 8 == 0 && self.remaining() >= count * 8 {
            let start = self.pos / 8;
            let res = self.data.get(start..start + count).unwrap_or(
                &[]
            ).to_vec();
            self.pos += count * 8;
            return Ok(res)
        }
        let mut res = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            res.push(self.get_bits(8)? as u8);
        }
        Ok(res)
    }

    /// Reads `count` bits into octets, padding the last with zeros.
    pub fn get_bit_vec(&mut self, count: usize) -> Result<Vec<u8>, ContentError> {
        let mut res = BitVec::<u8, Msb0>::with_capacity(count.min(32768));
        for _ in 0..count {
            res.push(self.get_bit()?);
        }
        while res.len() % 8 != 0 {
            res.push(false)
        }
        Ok(res.into_vec())
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::decode::Reason;

    #[test]
    fn write_bits() {
        let mut writer = BitWriter::new();
        writer.put_bit(true);
        writer.put_bits(0b010, 3);
        writer.put_octets(b"\xFF");
        writer.put_bits(0, 0);
        assert_eq!(writer.bit_len(), 12);
        writer.put_bit_range(b"\x0F", 3..6);
        assert_eq!(writer.into_octets(), b"\xAF\xF6");
    }

    #[test]
    fn flush_empty() {
        let mut target = Vec::new();
        BitWriter::new().flush(&mut target).unwrap();
        assert_eq!(target, b"\x00");
    }

    #[test]
    fn read_bits() {
        let mut cursor = BitCursor::new(Bytes::from_static(b"\xAF\xF0"));
        assert!(cursor.get_bit().unwrap());
        assert_eq!(cursor.get_bits(3).unwrap(), 0b010);
        assert_eq!(cursor.get_octets(1).unwrap(), b"\xFF");
        assert_eq!(cursor.pos(), 12);
        assert_eq!(cursor.remaining(), 4);
        assert_eq!(cursor.get_bits(4).unwrap(), 0);
        assert_eq!(
            cursor.get_bit().unwrap_err().reason(), Reason::Incomplete
        );
    }

    struct Chunks(Vec<Bytes>);

    impl Refill for Chunks {
        fn refill(&mut self) -> Result<Option<Bytes>, ContentError> {
            if self.0.is_empty() {
                Ok(None)
            }
            else {
                Ok(Some(self.0.remove(0)))
            }
        }
    }

    #[test]
    fn read_across_chunks() {
        let mut chunks = Chunks(vec![
            Bytes::new(), Bytes::from_static(b"\x34")
        ]);
        let mut cursor = BitCursor::with_refill(
            Bytes::from_static(b"\x12"), &mut chunks
        );
        assert_eq!(cursor.get_bits(4).unwrap(), 0x1);
        assert_eq!(cursor.get_bits(8).unwrap(), 0x23);
        assert_eq!(cursor.get_bits(4).unwrap(), 0x4);
        assert_eq!(cursor.pos(), 16);
        assert!(cursor.get_bit().is_err());
    }
}
