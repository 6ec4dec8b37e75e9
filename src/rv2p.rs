//! The RV2P firmware locator.
//!
//! The two RV2P images are not tagged. They sit back to back after the MIPS
//! images, behind a run of 0x50 zero bytes, and the first one always starts
//! with the same two instructions. Their lengths are fixed; the x86 loader
//! pushes both onto the stack before copying the images out, which makes for a
//! handy sanity check.

use crate::config::Config;
use crate::firmware::Error;
use crate::firmware::Family;
use crate::firmware::FirmwareRecord;
use crate::firmware::RV2P_LENS;
use crate::firmware::RV2P_NAMES;
use crate::pattern;
use crate::pattern::ZERO_RUN;
use crate::rom::OptionRom;

/// Locates both RV2P images, searching from `max_offset` onwards.
///
/// `max_offset` should be the furthest MIPS text start, as reported by
/// [`mips::locate()`].
///
/// [`mips::locate()`]: ../mips/fn.locate.html
pub fn locate(
  rom: &OptionRom,
  max_offset: usize,
  config: &Config,
) -> Result<Vec<FirmwareRecord>, Error> {
  let start = find_start(rom, max_offset)?;
  check_sizes(rom)?;
  if config.verbose {
    log::info!("rv2p images start at 0x{:06x}", start);
  }

  let mut offset = start;
  let mut records = Vec::with_capacity(RV2P_NAMES.len());
  for (&name, &len) in RV2P_NAMES.iter().zip(&RV2P_LENS) {
    records.push(FirmwareRecord::new(
      Family::Rv2p,
      rom,
      name,
      0,
      0,
      len as u32,
      offset,
    )?);
    offset += len;
  }
  Ok(records)
}

/// Finds the start of the first image.
fn find_start(rom: &OptionRom, max_offset: usize) -> Result<usize, Error> {
  let found = rom.find(&pattern::RV2P_ANCHOR, max_offset);
  log::debug!(
    "rv2p zero run after 0x{:x}: {:x?}",
    max_offset,
    found
  );
  match found {
    Some(offset) => Ok(offset + ZERO_RUN),
    None => Err(Error::SequenceNotFound { from: max_offset }),
  }
}

/// Checks that the loader pushes the first image's length before the
/// second's.
fn check_sizes(rom: &OptionRom) -> Result<(), Error> {
  let proc1 = rom.find(&pattern::PUSH_PROC1_LEN, 0);
  let proc2 = rom.find(&pattern::PUSH_PROC2_LEN, 0);
  log::debug!("rv2p length pushes: {:x?}, {:x?}", proc1, proc2);

  match (proc1, proc2) {
    (Some(a), Some(b)) if a < b => Ok(()),
    _ => Err(Error::SizeMismatch { proc1, proc2 }),
  }
}
