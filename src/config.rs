//! Extraction configuration, and the per-revision offset tables used by
//! direct extraction.
//!
//! Before content scanning, firmware was pulled out of each ROM revision at
//! hard-coded offsets. Those tables are kept as a fallback strategy, and can be
//! extended with a JSON5 file:
//! ```text
//! {
//!   revisions: {
//!     "09": {
//!       mips: [{ name: "com", offset: 17696, header: "wide" }, ...],
//!       rv2p: [{ name: "rv2p_proc1", offset: 18828, len: 584 }, ...],
//!     },
//!   },
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error;
use crate::header::HeaderVariant;

/// Options for a single extraction run.
#[derive(Clone, Debug)]
pub struct Config {
  /// The hardware revision label, used to tag output.
  pub revision: String,
  /// Whether to echo parsed header fields.
  pub verbose: bool,
  /// Whether to still look for RV2P images after MIPS extraction fails.
  pub keep_going: bool,
  /// How to find firmware in the ROM.
  pub strategy: Strategy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      revision: String::new(),
      verbose: false,
      keep_going: false,
      strategy: Strategy::Scan,
    }
  }
}

/// A method for finding firmware in a ROM.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Strategy {
  /// Search the ROM's contents for keys and known byte sequences.
  Scan,
  /// Read firmware from fixed offsets.
  Direct(Layout),
}

/// Where firmware lives within one ROM revision.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct Layout {
  /// The MIPS images, in output order.
  pub mips: Vec<MipsEntry>,
  /// The RV2P images, in output order.
  pub rv2p: Vec<Rv2pEntry>,
}

/// The location of a MIPS image.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct MipsEntry {
  /// The image's name.
  pub name: String,
  /// Where the image's text starts; its header ends here.
  pub offset: usize,
  /// The layout of the image's header.
  pub header: HeaderVariant,
}

/// The location of an RV2P image.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub struct Rv2pEntry {
  /// The image's name.
  pub name: String,
  /// Where the image starts.
  pub offset: usize,
  /// The length of the image, in bytes.
  pub len: u32,
}

/// A set of `Layout`s, keyed by revision label.
#[derive(Clone, PartialEq, Eq, Debug, Default, Deserialize, Serialize)]
pub struct OffsetTables {
  /// Known revisions.
  pub revisions: BTreeMap<String, Layout>,
}

impl OffsetTables {
  /// Returns the tables for the revisions this tool has always known about.
  pub fn builtin() -> Self {
    use HeaderVariant::Narrow;
    use HeaderVariant::Wide;

    let mut revisions = BTreeMap::new();
    revisions.insert(
      "09".to_string(),
      Layout::new(
        [(0x4520, Wide), (0x37f2, Wide), (0x40d2, Narrow), (0x3b4e, Narrow)],
        [0x498c, 0x4bd4],
      ),
    );
    revisions.insert(
      "06".to_string(),
      Layout::new(
        [(0x3f3c, Wide), (0x3200, Wide), (0x3b08, Narrow), (0x3508, Narrow)],
        [0x44c0, 0x4708],
      ),
    );
    Self { revisions }
  }

  /// Loads tables from the JSON5 file at `path`.
  pub fn load(path: &Path) -> Result<Self, Error> {
    let text = fs::read_to_string(path).map_err(|e| Error::Io {
      path: path.to_path_buf(),
      error: e,
    })?;
    Self::parse(&text).map_err(|e| Error::Parse {
      path: path.to_path_buf(),
      error: e,
    })
  }

  /// Parses tables out of JSON5 `text`.
  pub fn parse(text: &str) -> Result<Self, json5::Error> {
    json5::from_str(text)
  }

  /// Adds every revision in `other` to this set, replacing any that are
  /// already present.
  pub fn merge(&mut self, other: OffsetTables) {
    self.revisions.extend(other.revisions);
  }

  /// Returns the layout for `revision`, if it is known.
  pub fn get(&self, revision: &str) -> Option<&Layout> {
    self.revisions.get(revision)
  }
}

impl Layout {
  fn new(mips: [(usize, HeaderVariant); 4], rv2p: [usize; 2]) -> Self {
    use crate::firmware::MIPS_NAMES;
    use crate::firmware::RV2P_LENS;
    use crate::firmware::RV2P_NAMES;

    Self {
      mips: MIPS_NAMES
        .iter()
        .zip(mips.iter())
        .map(|(name, &(offset, header))| MipsEntry {
          name: name.to_string(),
          offset,
          header,
        })
        .collect(),
      rv2p: RV2P_NAMES
        .iter()
        .zip(rv2p.iter().zip(RV2P_LENS.iter()))
        .map(|(name, (&offset, &len))| Rv2pEntry {
          name: name.to_string(),
          offset,
          len: len as u32,
        })
        .collect(),
    }
  }
}

/// An error produced while loading offset tables.
#[derive(Debug)]
pub enum Error {
  /// Indicates that the file could not be read.
  Io {
    /// The file being read.
    path: PathBuf,
    /// The underlying error.
    error: io::Error,
  },
  /// Indicates that the file is not valid JSON5, or doesn't describe offset
  /// tables.
  Parse {
    /// The file being parsed.
    path: PathBuf,
    /// The underlying error.
    error: json5::Error,
  },
  /// Indicates that direct extraction was requested for a revision with no
  /// table.
  UnknownRevision {
    /// The requested revision.
    revision: String,
    /// The revisions that do have tables.
    known: Vec<String>,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Io { error, .. } => write!(f, "{}", error),
      Self::Parse { error, .. } => write!(f, "{}", error),
      Self::UnknownRevision { revision, known } => write!(
        f,
        "no offset table for revision {:?} (known: {})",
        revision,
        known.join(", ")
      ),
    }
  }
}

impl error::Error for Error {
  fn cause(&self) -> error::Cause<'_> {
    match self {
      Self::Io { path, .. } | Self::Parse { path, .. } => error::Cause::File(path),
      Self::UnknownRevision { revision, .. } => error::Cause::Revision(revision),
    }
  }

  fn action(&self) -> Option<error::Action> {
    match self {
      Self::UnknownRevision { .. } => None,
      _ => Some(error::Action::LoadingOffsets),
    }
  }

  fn exit_code(&self) -> i32 {
    7
  }
}
