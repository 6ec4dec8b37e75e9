//! The extraction pipeline, from ROM bytes to output tables.

use crate::config::Config;
use crate::config::Strategy;
use crate::direct;
use crate::error::Errors;
use crate::firmware::Error;
use crate::firmware::Family;
use crate::firmware::FirmwareRecord;
use crate::firmware::MIPS_NAMES;
use crate::mips;
use crate::rom::OptionRom;
use crate::rv2p;
use crate::table::Table;

/// Both output tables for one ROM.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Tables {
  /// The MIPS firmware table.
  pub mips: Table,
  /// The RV2P firmware table.
  pub rv2p: Table,
}

/// Extracts both firmware tables from `rom`.
///
/// Unless `config.keep_going` is set, a MIPS failure is reported without
/// looking for RV2P images at all.
pub fn extract(rom: &[u8], config: &Config) -> Result<Tables, Errors<Error>> {
  let rom = OptionRom::new(rom);
  if !rom.has_signature() {
    log::warn!("image does not start with an Option ROM signature (55 aa)");
  }

  let (mips, rv2p) = match &config.strategy {
    Strategy::Scan => {
      let search = mips::locate(&rom, &MIPS_NAMES, config);
      log::debug!("furthest MIPS image starts at 0x{:x}", search.max_offset);
      let max_offset = search.max_offset;
      run_second(search.records, config, || {
        rv2p::locate(&rom, max_offset, config)
      })?
    }
    Strategy::Direct(layout) => {
      let records = direct::locate_mips(&rom, layout, config);
      run_second(records, config, || direct::locate_rv2p(&rom, layout))?
    }
  };

  Ok(Tables {
    mips: Table::assemble(Family::Mips, &config.revision, &rom, &mips),
    rv2p: Table::assemble(Family::Rv2p, &config.revision, &rom, &rv2p),
  })
}

type Records = Vec<FirmwareRecord>;

/// Runs the RV2P half of the pipeline after the MIPS half, honoring
/// `keep_going`.
fn run_second(
  mips: Result<Records, Error>,
  config: &Config,
  rv2p: impl FnOnce() -> Result<Records, Error>,
) -> Result<(Records, Records), Errors<Error>> {
  let mips = match mips {
    Ok(records) => records,
    Err(e) if !config.keep_going => return Err(e.into()),
    Err(e) => {
      let mut errors = Errors::from(e);
      if let Err(e) = rv2p() {
        errors.push(e);
      }
      return Err(errors);
    }
  };

  Ok((mips, rv2p()?))
}
