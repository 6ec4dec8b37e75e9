//! The binary headers that precede each MIPS firmware image.
//!
//! Two header layouts have been observed, distinguished only by their length.
//! Both are little-endian and end exactly where the firmware text begins, and
//! both share the same leading fields:
//! ```text
//! offset | size | field
//! -------+------+--------------
//!   0x00 |    6 | (three u16s)
//!   0x06 |    4 | entry point
//!   0x0a |    4 | text address
//!   0x0e |    2 | text length
//!   0x10 |  ... | (data/bss/sbss/rodata descriptors, unused here)
//! ```
//! The wide layout carries one more `u32`/`u16` pair in its tail than the
//! narrow one.

use serde::Deserialize;
use serde::Serialize;

use crate::rom::OptionRom;

/// Addresses of MIPS code live in the segment with this bit set.
pub const CODE_SEGMENT: u32 = 0x0800_0000;

/// A MIPS firmware header layout.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderVariant {
  /// The 46-byte layout.
  Wide,
  /// The 40-byte layout.
  Narrow,
}

impl HeaderVariant {
  /// All variants, in the order they should be tried.
  pub const PRIORITY: [HeaderVariant; 2] = [Self::Wide, Self::Narrow];

  /// Returns the length of this layout in bytes.
  pub fn len(self) -> usize {
    match self {
      Self::Wide => 0x2e,
      Self::Narrow => 0x28,
    }
  }

  /// Returns a name for this layout.
  pub fn name(self) -> &'static str {
    match self {
      Self::Wide => "wide",
      Self::Narrow => "narrow",
    }
  }

  /// Reads a header of this layout that ends at `text_start`.
  ///
  /// Returns `None` if the header would start before the beginning of the
  /// image. No validation is performed; see [`Header::is_plausible()`].
  ///
  /// [`Header::is_plausible()`]: struct.Header.html#method.is_plausible
  pub fn read(self, rom: &OptionRom, text_start: usize) -> Option<Header> {
    let offset = text_start.checked_sub(self.len())?;
    Some(Header {
      variant: self,
      offset,
      entry_point: rom.read_u32_le(offset + 0x06)?,
      text_address: rom.read_u32_le(offset + 0x0a)?,
      text_length: rom.read_u16_le(offset + 0x0e)? as u32,
    })
  }
}

/// A parsed MIPS firmware header.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Header {
  /// The layout this header was read with.
  pub variant: HeaderVariant,
  /// The offset of the first byte of the header within the ROM.
  pub offset: usize,
  /// The address execution starts at.
  pub entry_point: u32,
  /// The address the text section is loaded at.
  pub text_address: u32,
  /// The length of the text section, in bytes.
  pub text_length: u32,
}

impl Header {
  /// Returns whether both addresses in this header lie in the code segment.
  pub fn is_plausible(&self) -> bool {
    self.entry_point & CODE_SEGMENT == CODE_SEGMENT
      && self.text_address & CODE_SEGMENT == CODE_SEGMENT
  }

  /// Tries each layout in priority order, returning the first plausible
  /// header that ends at `text_start`.
  pub fn probe(rom: &OptionRom, text_start: usize) -> Option<Header> {
    HeaderVariant::PRIORITY
      .iter()
      .filter_map(|variant| variant.read(rom, text_start))
      .find(Header::is_plausible)
  }
}
