//! Byte-pattern search over ROM images.
//!
//! Every search the locators perform is for a fixed, known byte sequence.
//! Patterns are compiled into `regex::bytes` regexes with Unicode disabled, so
//! that `\xNN` escapes match raw bytes rather than code points.

use std::fmt;
use std::fmt::Write;

use lazy_static::lazy_static;
use regex::bytes::Regex;

/// A compiled byte pattern.
#[derive(Clone)]
pub struct Pattern {
  regex: Regex,
}

impl Pattern {
  /// Compiles a pattern matching exactly the bytes in `needle`.
  pub fn literal(needle: &[u8]) -> Self {
    let mut src = String::with_capacity(5 + needle.len() * 4);
    src.push_str("(?-u)");
    for byte in needle {
      let _ = write!(src, "\\x{:02x}", byte);
    }
    // Every byte is escaped, so the only way this can fail is by blowing
    // the regex size limit, which a handful of bytes cannot do.
    Self::from_regex(&src).unwrap_or_else(|e| unreachable!("{}", e))
  }

  /// Compiles a pattern from raw regex syntax.
  ///
  /// The syntax should begin with `(?-u)` if it is meant to match bytes.
  pub fn from_regex(src: &str) -> Result<Self, regex::Error> {
    Ok(Self {
      regex: Regex::new(src)?,
    })
  }

  /// Returns the offset of the first match in `haystack` starting at or after
  /// `from`.
  pub fn find_at(&self, haystack: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
      return None;
    }
    self.regex.find_at(haystack, from).map(|m| m.start())
  }
}

impl fmt::Debug for Pattern {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "Pattern({})", self.regex.as_str())
  }
}

/// The length of the zero run in front of the first RV2P image.
pub const ZERO_RUN: usize = 0x50;

lazy_static! {
  /// The zero run in front of the first RV2P image, followed by that image's
  /// first two words: `0x00000008` and `0xac000001`, little-endian.
  pub static ref RV2P_ANCHOR: Pattern = Pattern::from_regex(&format!(
    r"(?-u)\x00{{{}}}\x08\x00\x00\x00\x01\x00\x00\xac",
    ZERO_RUN
  ))
  .unwrap();

  /// `push 0x248`, as encoded by the x86 loader: the size of the first RV2P
  /// image.
  pub static ref PUSH_PROC1_LEN: Pattern =
    Pattern::literal(&[0x66, 0x68, 0x48, 0x02, 0x00, 0x00]);

  /// `push 0x430`, as encoded by the x86 loader: the size of the second RV2P
  /// image.
  pub static ref PUSH_PROC2_LEN: Pattern =
    Pattern::literal(&[0x66, 0x68, 0x30, 0x04, 0x00, 0x00]);
}
