//! Read-only views of PCI Option ROM images.
//!
//! An Option ROM, as far as this crate cares, is an undifferentiated blob of
//! bytes: x86 startup code, a PCI data structure, and a handful of firmware
//! images for the NIC's on-board processors. There is no index. The `OptionRom`
//! type wraps the raw bytes and provides the bounds-checked little-endian reads
//! and pattern searches that the locators are built from.

use std::io;
use std::ops::Range;

use crate::pattern::Pattern;

/// The two bytes every PCI expansion ROM image starts with.
pub const SIGNATURE: [u8; 2] = [0x55, 0xaa];

/// A borrowed Option ROM image.
#[derive(Copy, Clone, Debug)]
pub struct OptionRom<'rom> {
  bytes: &'rom [u8],
}

impl<'rom> OptionRom<'rom> {
  /// Wraps `bytes` as an Option ROM image.
  pub fn new(bytes: &'rom [u8]) -> Self {
    Self { bytes }
  }

  /// Returns the raw bytes of this image.
  pub fn bytes(&self) -> &'rom [u8] {
    self.bytes
  }

  /// Returns whether this image starts with the PCI expansion ROM signature.
  pub fn has_signature(&self) -> bool {
    self.bytes.starts_with(&SIGNATURE)
  }

  /// Returns `len` bytes starting at `offset`, if they are all in bounds.
  pub fn slice(&self, offset: usize, len: usize) -> Option<&'rom [u8]> {
    let end = offset.checked_add(len)?;
    self.bytes.get(offset..end)
  }

  /// Reads a little-endian `u16` at `offset`.
  pub fn read_u16_le(&self, offset: usize) -> Option<u16> {
    let bytes = self.slice(offset, 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
  }

  /// Reads a little-endian `u32` at `offset`.
  pub fn read_u32_le(&self, offset: usize) -> Option<u32> {
    let bytes = self.slice(offset, 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
  }

  /// Finds the first occurrence of `pattern` that starts at or after `from`.
  pub fn find(&self, pattern: &Pattern, from: usize) -> Option<usize> {
    pattern.find_at(self.bytes, from)
  }

  /// Dumps the bytes in `range` as rows of hex, with an ASCII column, to `w`.
  ///
  /// Each row is prefixed by its absolute offset within the image. Bytes
  /// outside of the image are silently dropped.
  pub fn dump(&self, range: Range<usize>, mut w: impl io::Write) -> io::Result<()> {
    let end = range.end.min(self.bytes.len());
    let start = range.start.min(end);

    let mut ascii_str = String::new();
    for (row, chunk) in self.bytes[start..end].chunks(16).enumerate() {
      write!(w, "{:06x}:", start + row * 16)?;

      ascii_str.clear();
      for &byte in chunk {
        write!(w, " {:02x}", byte)?;

        if 0x20 <= byte && byte <= 0x7e {
          ascii_str.push(byte as char);
        } else {
          ascii_str.push('.');
        }
      }
      for _ in chunk.len()..16 {
        write!(w, "   ")?;
      }
      writeln!(w, "  |{}|", ascii_str)?;
    }
    Ok(())
  }
}

/// Converts bytes stored as big-endian 32-bit words into host words.
///
/// Any trailing bytes that do not make up a full word are ignored; callers
/// are expected to have checked alignment already.
pub fn be_words(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
  bytes
    .chunks_exact(4)
    .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
}
