//! Direct extraction, from fixed per-revision offsets.
//!
//! This is the fallback for when scanning can't make sense of a ROM whose
//! layout is already known. Headers are still checked, since a wrong revision
//! label would otherwise produce garbage tables without complaint.

use crate::config::Config;
use crate::config::Layout;
use crate::firmware::Error;
use crate::firmware::Family;
use crate::firmware::FirmwareRecord;
use crate::mips::report_header;
use crate::rom::OptionRom;

/// Reads the MIPS images described by `layout`.
pub fn locate_mips(
  rom: &OptionRom,
  layout: &Layout,
  config: &Config,
) -> Result<Vec<FirmwareRecord>, Error> {
  let mut records = Vec::with_capacity(layout.mips.len());
  for entry in &layout.mips {
    let header = entry
      .header
      .read(rom, entry.offset)
      .filter(|h| h.is_plausible())
      .ok_or_else(|| Error::HeaderNotFound {
        name: entry.name.clone(),
        offset: entry.offset,
      })?;
    report_header(rom, config, &entry.name, &header);

    records.push(FirmwareRecord::new(
      Family::Mips,
      rom,
      &entry.name,
      header.entry_point,
      header.text_address,
      header.text_length,
      entry.offset,
    )?);
  }
  Ok(records)
}

/// Reads the RV2P images described by `layout`.
pub fn locate_rv2p(
  rom: &OptionRom,
  layout: &Layout,
) -> Result<Vec<FirmwareRecord>, Error> {
  layout
    .rv2p
    .iter()
    .map(|entry| {
      FirmwareRecord::new(
        Family::Rv2p,
        rom,
        &entry.name,
        0,
        0,
        entry.len,
        entry.offset,
      )
    })
    .collect()
}
