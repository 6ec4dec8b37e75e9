//! The MIPS firmware locator.
//!
//! Each MIPS image carries its own name, space-padded to four bytes and stored
//! backwards, 0x10 bytes into its text section. Finding an image is therefore a
//! matter of finding its name, stepping back to the start of the text, and
//! reading whichever header layout sits in front of it.

use crate::config::Config;
use crate::firmware::Error;
use crate::firmware::Family;
use crate::firmware::FirmwareRecord;
use crate::header::Header;
use crate::pattern::Pattern;
use crate::rom::OptionRom;

/// How far into an image's text its search key lives.
pub const KEY_OFFSET: usize = 0x10;

/// The outcome of a MIPS search.
///
/// `max_offset` is reported even when locating fails, since the RV2P search
/// starts from it.
#[derive(Debug)]
pub struct Search {
  /// The located images, in order, or the first error encountered.
  pub records: Result<Vec<FirmwareRecord>, Error>,
  /// The furthest text start of any image whose key was found.
  pub max_offset: usize,
}

/// Builds the search key for the image called `name`.
///
/// The name is padded with spaces, or truncated, to four bytes, and then
/// reversed: `"com"` becomes `b" moc"`.
pub fn search_key(name: &str) -> [u8; 4] {
  let mut key = [b' '; 4];
  for (slot, byte) in key.iter_mut().zip(name.bytes()) {
    *slot = byte;
  }
  key.reverse();
  key
}

/// Locates the images called `names` in `rom`.
pub fn locate(rom: &OptionRom, names: &[&str], config: &Config) -> Search {
  Locator::new(rom, config).run(names)
}

/// The main state struct for the locator.
struct Locator<'a, 'rom> {
  rom: &'a OptionRom<'rom>,
  config: &'a Config,

  /// The furthest text start seen so far.
  max_offset: usize,
  /// The first error seen, if any.
  error: Option<Error>,
}

impl<'a, 'rom> Locator<'a, 'rom> {
  fn new(rom: &'a OptionRom<'rom>, config: &'a Config) -> Self {
    Self {
      rom,
      config,
      max_offset: 0,
      error: None,
    }
  }

  fn run(mut self, names: &[&str]) -> Search {
    let mut records = Vec::with_capacity(names.len());
    for name in names {
      let start = match self.find_text(name) {
        Ok(start) => start,
        Err(e) => {
          self.fail(e);
          continue;
        }
      };

      // Keys are still searched for after a failure, so that `max_offset`
      // accounts for every image in the ROM. Their records are discarded.
      self.max_offset = self.max_offset.max(start);
      if self.error.is_some() {
        continue;
      }

      match self.read_record(name, start) {
        Ok(record) => records.push(record),
        Err(e) => self.fail(e),
      }
    }

    let records = match self.error {
      Some(e) => Err(e),
      None => Ok(records),
    };
    Search {
      records,
      max_offset: self.max_offset,
    }
  }

  /// Records `error`, unless an earlier one was already recorded.
  fn fail(&mut self, error: Error) {
    if self.error.is_none() {
      self.error = Some(error);
    }
  }

  fn read_record(&self, name: &str, start: usize) -> Result<FirmwareRecord, Error> {
    let header = match Header::probe(self.rom, start) {
      Some(header) => header,
      None => {
        return Err(Error::HeaderNotFound {
          name: name.to_string(),
          offset: start,
        })
      }
    };
    report_header(self.rom, self.config, name, &header);

    FirmwareRecord::new(
      Family::Mips,
      self.rom,
      name,
      header.entry_point,
      header.text_address,
      header.text_length,
      start,
    )
  }

  /// Finds the start of the text of the image called `name`.
  fn find_text(&self, name: &str) -> Result<usize, Error> {
    let key = search_key(name);
    let found = self
      .rom
      .find(&Pattern::literal(&key), 0)
      .and_then(|offset| offset.checked_sub(KEY_OFFSET));
    log::debug!(
      "key {:?} for {}: {:x?}",
      String::from_utf8_lossy(&key),
      name,
      found
    );

    found.ok_or_else(|| Error::NotFound {
      name: name.to_string(),
    })
  }
}

/// Echoes a header's fields, when asked to.
pub(crate) fn report_header(
  rom: &OptionRom,
  config: &Config,
  name: &str,
  header: &Header,
) {
  let line = match describe_header(config, name, header) {
    Some(line) => line,
    None => return,
  };

  log::info!("{}", line);
  if log::log_enabled!(log::Level::Debug) {
    let mut dump = Vec::new();
    let range = header.offset..header.offset + header.variant.len();
    if rom.dump(range, &mut dump).is_ok() {
      log::debug!("{}", String::from_utf8_lossy(&dump).trim_end());
    }
  }
}

/// Formats the line `report_header()` echoes, or `None` if `config` isn't
/// verbose.
fn describe_header(config: &Config, name: &str, header: &Header) -> Option<String> {
  if !config.verbose {
    return None;
  }

  Some(format!(
    "{}: {} header at 0x{:06x}: entry 0x{:08x}, text 0x{:08x}, len 0x{:x}",
    name,
    header.variant.name(),
    header.offset,
    header.entry_point,
    header.text_address,
    header.text_length
  ))
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::firmware::MIPS_NAMES;
  use crate::testing::Builder;

  macro_rules! assert_key {
    ($name:literal => $key:literal) => {
      assert_eq!(&search_key($name), $key);
    };
  }

  #[test]
  fn keys() {
    assert_key!("com" => b" moc");
    assert_key!("rxp" => b" pxr");
    assert_key!("tpat" => b"tapt");
    assert_key!("txp" => b" pxt");
    assert_key!("" => b"    ");
    assert_key!("toolong" => b"loot");
  }

  #[test]
  fn locate_all() {
    let builder = Builder::default();
    let rom = builder.build();
    let search = locate(&OptionRom::new(&rom.bytes), &MIPS_NAMES, &Config::default());

    let records = search.records.unwrap();
    assert_eq!(records.len(), 4);
    for ((record, expected), &start) in
      records.iter().zip(&builder.mips).zip(&rom.starts)
    {
      assert_eq!(record.name, expected.name);
      assert_eq!(record.entry_point, expected.entry);
      assert_eq!(record.text_address, expected.addr);
      assert_eq!(record.text_length, expected.len as u32);
      assert_eq!(record.byte_offset, start);
    }
    assert_eq!(search.max_offset, *rom.starts.iter().max().unwrap());
  }

  #[test]
  fn missing_key() {
    let rom = Builder {
      drop_key: Some("tpat"),
      ..Builder::default()
    }
    .build();
    let search = locate(&OptionRom::new(&rom.bytes), &MIPS_NAMES, &Config::default());

    assert_eq!(
      search.records.unwrap_err(),
      Error::NotFound {
        name: "tpat".to_string()
      }
    );
    // `txp` comes after `tpat`, but is still accounted for.
    assert_eq!(search.max_offset, rom.starts[3]);
  }

  #[test]
  fn missing_header() {
    let mut builder = Builder::default();
    builder.mips[1].addr = 0x0010_0000;
    let rom = builder.build();
    let search = locate(&OptionRom::new(&rom.bytes), &MIPS_NAMES, &Config::default());

    assert_eq!(
      search.records.unwrap_err(),
      Error::HeaderNotFound {
        name: "rxp".to_string(),
        offset: rom.starts[1],
      }
    );
    assert_eq!(search.max_offset, rom.starts[3]);
  }

  #[test]
  fn first_error_wins() {
    let mut builder = Builder {
      drop_key: Some("txp"),
      ..Builder::default()
    };
    builder.mips[0].entry = 0;
    let rom = builder.build();
    let search = locate(&OptionRom::new(&rom.bytes), &MIPS_NAMES, &Config::default());

    assert!(matches!(
      search.records,
      Err(Error::HeaderNotFound { ref name, .. }) if name == "com"
    ));
    assert_eq!(search.max_offset, rom.starts[2]);
  }

  #[test]
  fn key_too_close_to_start() {
    let mut bytes = vec![0u8; 0x40];
    bytes[0x08..0x0c].copy_from_slice(b" moc");
    let search = locate(&OptionRom::new(&bytes), &["com"], &Config::default());
    assert_eq!(
      search.records.unwrap_err(),
      Error::NotFound {
        name: "com".to_string()
      }
    );
    assert_eq!(search.max_offset, 0);
  }

  #[test]
  fn verbose_echo() {
    let synthetic = Builder::default().build();
    let rom = OptionRom::new(&synthetic.bytes);
    let header = Header::probe(&rom, synthetic.starts[0]).unwrap();
    let verbose = Config {
      verbose: true,
      ..Config::default()
    };

    assert_eq!(describe_header(&Config::default(), "com", &header), None);
    assert_eq!(
      describe_header(&verbose, "com", &header).unwrap(),
      format!(
        "com: wide header at 0x{:06x}: entry 0x08000078, text 0x08000000, len 0x100",
        synthetic.starts[0] - 0x2e,
      )
    );

    // Echoing doesn't change what gets located.
    let quiet = locate(&rom, &MIPS_NAMES, &Config::default());
    let loud = locate(&rom, &MIPS_NAMES, &verbose);
    assert_eq!(quiet.records.unwrap(), loud.records.unwrap());
  }

  #[test]
  fn text_past_end_of_rom() {
    let mut builder = Builder::default();
    builder.mips.truncate(1);
    let mut rom = builder.build();
    rom.bytes.truncate(rom.starts[0] + 0x20);
    let search = locate(&OptionRom::new(&rom.bytes), &["com"], &Config::default());
    assert!(matches!(search.records, Err(Error::Truncated { .. })));
  }
}
