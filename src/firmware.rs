//! Firmware records, and the errors produced while locating them.

use std::fmt;

use crate::error;
use crate::rom::OptionRom;

/// The MIPS firmware images, in the order they are emitted.
pub const MIPS_NAMES: [&str; 4] = ["com", "rxp", "tpat", "txp"];

/// The RV2P firmware images, in the order they are emitted.
pub const RV2P_NAMES: [&str; 2] = ["rv2p_proc1", "rv2p_proc2"];

/// The lengths of the RV2P firmware images, in bytes.
pub const RV2P_LENS: [usize; 2] = [0x248, 0x430];

/// A family of firmware images, each of which becomes one output table.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Family {
  /// The four MIPS processor images.
  Mips,
  /// The two RV2P processor images.
  Rv2p,
}

impl Family {
  /// Returns a name for this family, as used in output symbol names.
  pub fn name(self) -> &'static str {
    match self {
      Self::Mips => "mips",
      Self::Rv2p => "rv2p",
    }
  }

  fn action(self) -> error::Action {
    match self {
      Self::Mips => error::Action::LocatingMips,
      Self::Rv2p => error::Action::LocatingRv2p,
    }
  }
}

impl fmt::Display for Family {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

/// A located firmware image.
///
/// Records are only created once the whole text section is known to be
/// inside the ROM, so [`payload()`] never fails for the ROM a record was
/// located in.
///
/// [`payload()`]: #method.payload
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct FirmwareRecord {
  /// The name of the image.
  pub name: String,
  /// The address execution starts at. Zero for RV2P images.
  pub entry_point: u32,
  /// The address the text section is loaded at. Zero for RV2P images.
  pub text_address: u32,
  /// The length of the text section, in bytes; always a multiple of four.
  pub text_length: u32,
  /// Where the text section starts within the ROM.
  pub byte_offset: usize,
}

impl FirmwareRecord {
  /// Creates a record, after checking that its text fits within `rom` and
  /// is made of whole words.
  pub fn new(
    family: Family,
    rom: &OptionRom,
    name: &str,
    entry_point: u32,
    text_address: u32,
    text_length: u32,
    byte_offset: usize,
  ) -> Result<Self, Error> {
    if text_length % 4 != 0 {
      return Err(Error::Misaligned {
        family,
        name: name.to_string(),
        len: text_length,
      });
    }
    if rom.slice(byte_offset, text_length as usize).is_none() {
      return Err(Error::Truncated {
        family,
        name: name.to_string(),
        offset: byte_offset,
        len: text_length,
      });
    }

    Ok(Self {
      name: name.to_string(),
      entry_point,
      text_address,
      text_length,
      byte_offset,
    })
  }

  /// Returns the text section of this image.
  ///
  /// # Panics
  ///
  /// Panics if `rom` is not the image this record was located in, and is too
  /// short to contain it.
  pub fn payload<'rom>(&self, rom: &OptionRom<'rom>) -> &'rom [u8] {
    &rom.bytes()[self.byte_offset..self.byte_offset + self.text_length as usize]
  }
}

/// An error produced while locating firmware.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Error {
  /// Indicates that the search key for a MIPS image does not occur in the
  /// ROM, or occurs too close to its start.
  NotFound {
    /// The image that was searched for.
    name: String,
  },
  /// Indicates that no header layout validates in front of a MIPS image.
  HeaderNotFound {
    /// The image whose header is missing.
    name: String,
    /// Where the image's text was expected to start.
    offset: usize,
  },
  /// Indicates that the zero run in front of the RV2P images was not found.
  SequenceNotFound {
    /// Where the search started.
    from: usize,
  },
  /// Indicates that the `push` instructions carrying the RV2P image lengths
  /// are missing, or out of order.
  SizeMismatch {
    /// Where `push 0x248` was found, if at all.
    proc1: Option<usize>,
    /// Where `push 0x430` was found, if at all.
    proc2: Option<usize>,
  },
  /// Indicates that an image's text section runs past the end of the ROM.
  Truncated {
    /// The family the image belongs to.
    family: Family,
    /// The image that was cut off.
    name: String,
    /// Where the image's text starts.
    offset: usize,
    /// The advertised length of the text.
    len: u32,
  },
  /// Indicates that an image's text section is not made of whole words.
  Misaligned {
    /// The family the image belongs to.
    family: Family,
    /// The image with the odd length.
    name: String,
    /// The advertised length of the text.
    len: u32,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::NotFound { name } => write!(f, "firmware not found: {}", name),
      Self::HeaderNotFound { name, .. } => {
        write!(f, "no valid header in front of firmware: {}", name)
      }
      Self::SequenceNotFound { .. } => {
        write!(f, "RV2P start sequence not found")
      }
      Self::SizeMismatch { proc1, proc2 } => write!(
        f,
        "RV2P size check failed: push 0x248 {}, push 0x430 {}",
        describe_hit(*proc1),
        describe_hit(*proc2)
      ),
      Self::Truncated {
        name, offset, len, ..
      } => write!(
        f,
        "firmware {} runs past the end of the ROM (0x{:x} bytes at 0x{:x})",
        name, len, offset
      ),
      Self::Misaligned { name, len, .. } => write!(
        f,
        "firmware {} has a length that is not a whole number of words: 0x{:x}",
        name, len
      ),
    }
  }
}

fn describe_hit(offset: Option<usize>) -> String {
  match offset {
    Some(offset) => format!("at 0x{:x}", offset),
    None => "missing".to_string(),
  }
}

impl error::Error for Error {
  fn cause(&self) -> error::Cause<'_> {
    match self {
      Self::NotFound { name } => error::Cause::Firmware(name),
      Self::HeaderNotFound { offset, .. } => error::Cause::Offset(*offset),
      Self::SequenceNotFound { .. } => {
        error::Cause::Pattern("0x50 zero bytes followed by 0x00000008 0xac000001")
      }
      Self::SizeMismatch { .. } => {
        error::Cause::Pattern("push 0x248 followed by push 0x430")
      }
      Self::Truncated { offset, .. } => error::Cause::Offset(*offset),
      Self::Misaligned { name, .. } => error::Cause::Firmware(name),
    }
  }

  fn action(&self) -> Option<error::Action> {
    let family = match self {
      Self::NotFound { .. } | Self::HeaderNotFound { .. } => Family::Mips,
      Self::SequenceNotFound { .. } | Self::SizeMismatch { .. } => Family::Rv2p,
      Self::Truncated { family, .. } | Self::Misaligned { family, .. } => *family,
    };
    Some(family.action())
  }

  fn exit_code(&self) -> i32 {
    match self {
      Self::NotFound { .. } => 2,
      Self::HeaderNotFound { .. } => 3,
      Self::SequenceNotFound { .. } => 4,
      Self::SizeMismatch { .. } => 5,
      Self::Truncated { .. } | Self::Misaligned { .. } => 6,
    }
  }
}
