//! Synthetic Option ROM images for tests.

use crate::firmware::MIPS_NAMES;
use crate::firmware::RV2P_LENS;
use crate::header::HeaderVariant;
use crate::mips::search_key;
use crate::pattern::ZERO_RUN;

/// Writes the entry point, text address and text length of a header of the
/// given layout that ends at `text_start`. Nothing else is touched.
pub fn write_header(
  bytes: &mut [u8],
  text_start: usize,
  variant: HeaderVariant,
  entry: u32,
  addr: u32,
  len: u16,
) {
  let offset = text_start - variant.len();
  bytes[offset + 0x06..offset + 0x0a].copy_from_slice(&entry.to_le_bytes());
  bytes[offset + 0x0a..offset + 0x0e].copy_from_slice(&addr.to_le_bytes());
  bytes[offset + 0x0e..offset + 0x10].copy_from_slice(&len.to_le_bytes());
}

/// A MIPS image to embed.
#[derive(Clone, Debug)]
pub struct Mips {
  pub name: &'static str,
  pub variant: HeaderVariant,
  pub entry: u32,
  pub addr: u32,
  pub len: u16,
  pub fill: u8,
}

/// Builds a ROM that looks, to the locators, like a real one.
#[derive(Clone, Debug)]
pub struct Builder {
  pub mips: Vec<Mips>,
  /// Leaves out the search key of this image, so it can't be found.
  pub drop_key: Option<&'static str>,
  /// Puts `push 0x430` in front of `push 0x248`.
  pub swap_pushes: bool,
  /// Leaves out the `push 0x430` entirely.
  pub drop_push: bool,
  /// Puts the RV2P images in front of the MIPS ones.
  pub rv2p_first: bool,
}

/// The result of `Builder::build()`.
#[derive(Clone, Debug)]
pub struct Synthetic {
  pub bytes: Vec<u8>,
  /// Where each MIPS image's text starts, in `Builder::mips` order.
  pub starts: Vec<usize>,
  /// Where the first RV2P image starts.
  pub rv2p_start: usize,
}

impl Default for Builder {
  fn default() -> Self {
    let variants = [
      HeaderVariant::Wide,
      HeaderVariant::Wide,
      HeaderVariant::Narrow,
      HeaderVariant::Narrow,
    ];
    let lens = [0x100, 0x80, 0x40, 0xc0];
    let mips = MIPS_NAMES
      .iter()
      .enumerate()
      .map(|(i, &name)| Mips {
        name,
        variant: variants[i],
        entry: 0x0800_0078 + 0x10 * i as u32,
        addr: 0x0800_0000 + 0x1000 * i as u32,
        len: lens[i],
        fill: 0x11 * (i as u8 + 1),
      })
      .collect();

    Self {
      mips,
      drop_key: None,
      swap_pushes: false,
      drop_push: false,
      rv2p_first: false,
    }
  }
}

const RV2P_TAG: [u8; 8] = [0x08, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0xac];
const PUSH_PROC1: [u8; 6] = [0x66, 0x68, 0x48, 0x02, 0x00, 0x00];
const PUSH_PROC2: [u8; 6] = [0x66, 0x68, 0x30, 0x04, 0x00, 0x00];

impl Builder {
  pub fn build(&self) -> Synthetic {
    let mut bytes = vec![0u8; 0x1000];
    bytes[0] = 0x55;
    bytes[1] = 0xaa;

    let (proc1_at, proc2_at) = if self.swap_pushes {
      (0x110, 0x100)
    } else {
      (0x100, 0x110)
    };
    bytes[proc1_at..proc1_at + 6].copy_from_slice(&PUSH_PROC1);
    if !self.drop_push {
      bytes[proc2_at..proc2_at + 6].copy_from_slice(&PUSH_PROC2);
    }

    let mut rv2p_start = 0;
    if self.rv2p_first {
      rv2p_start = push_rv2p(&mut bytes);
    }

    let mut starts = Vec::new();
    for mips in &self.mips {
      let start = bytes.len() + 0x40;
      bytes.resize(start + mips.len as usize, mips.fill);
      for b in &mut bytes[start - 0x40..start] {
        *b = 0;
      }
      write_header(&mut bytes, start, mips.variant, mips.entry, mips.addr, mips.len);
      if self.drop_key != Some(mips.name) {
        bytes[start + 0x10..start + 0x14].copy_from_slice(&search_key(mips.name));
      }
      starts.push(start);
    }

    if !self.rv2p_first {
      rv2p_start = push_rv2p(&mut bytes);
    }
    bytes.resize(bytes.len() + 0x40, 0xff);

    Synthetic {
      bytes,
      starts,
      rv2p_start,
    }
  }
}

/// Appends a zero run plus both RV2P images, returning where the first image
/// starts.
fn push_rv2p(bytes: &mut Vec<u8>) -> usize {
  let start = bytes.len() + ZERO_RUN + 0x30;
  bytes.resize(start, 0);
  bytes.resize(start + RV2P_LENS[0], 0x5a);
  bytes.resize(start + RV2P_LENS[0] + RV2P_LENS[1], 0x6b);
  bytes[start..start + 8].copy_from_slice(&RV2P_TAG);
  start
}
