//! Output tables, ready to be compiled into a driver.
//!
//! A table starts with one fixed-size descriptor per image, followed by the
//! text of every image in order. The driver reads the table as an array of
//! native (little-endian) words, while the descriptors are consumed as
//! big-endian words; descriptor words are therefore stored byte-swapped.
//!
//! Descriptors look like this, one word per cell:
//! ```text
//! mips: | entry | text addr | text len | table offset | 0 x 6 |
//! rv2p: | 0     | text len  | table offset | 0 x 8 |
//! ```
//! The table offset of an image is the byte offset of its text within the
//! table, which is why the MIPS offsets start at `0xa0` (four descriptors of
//! ten words) and the RV2P offsets at `0x58` (two descriptors of eleven).

use std::io;

use crate::firmware::Family;
use crate::firmware::FirmwareRecord;
use crate::rom;
use crate::rom::OptionRom;

impl Family {
  /// The table offset of the first image's text.
  pub fn base_offset(self) -> u32 {
    match self {
      Self::Mips => 0xa0,
      Self::Rv2p => 0x58,
    }
  }

  /// The number of zero words following each descriptor.
  pub fn padding(self) -> usize {
    match self {
      Self::Mips => 6,
      Self::Rv2p => 8,
    }
  }

  /// Returns the meaningful words of the descriptor for `record`, before
  /// byte-swapping.
  pub fn descriptor(self, record: &FirmwareRecord, table_offset: u32) -> Vec<u32> {
    match self {
      Self::Mips => vec![
        record.entry_point,
        record.text_address,
        record.text_length,
        table_offset,
      ],
      Self::Rv2p => vec![0, record.text_length, table_offset],
    }
  }
}

/// Byte-swaps a descriptor word, so that it reads correctly as big-endian
/// after being laid out in memory as little-endian.
///
/// This is an involution: swapping twice gives back the original word.
pub fn swap_word(word: u32) -> u32 {
  u32::from_le_bytes(word.to_be_bytes())
}

/// An assembled output table.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Table {
  /// The family of images this table holds.
  pub family: Family,
  /// The hardware revision this table was extracted for.
  pub revision: String,
  /// The byte-swapped descriptors, padding included.
  pub header_words: Vec<u32>,
  /// The text of every image, in order, as native words.
  pub data_words: Vec<u32>,
}

impl Table {
  /// Assembles a table out of `records`, located in `rom`.
  pub fn assemble(
    family: Family,
    revision: &str,
    rom: &OptionRom,
    records: &[FirmwareRecord],
  ) -> Self {
    let mut header_words = Vec::new();
    let mut data_words = Vec::new();

    let mut table_offset = family.base_offset();
    for record in records {
      header_words.extend(
        family
          .descriptor(record, table_offset)
          .into_iter()
          .map(swap_word),
      );
      header_words.extend(std::iter::repeat(0).take(family.padding()));

      data_words.extend(rom::be_words(record.payload(rom)));
      table_offset += record.text_length;
    }

    Self {
      family,
      revision: revision.to_string(),
      header_words,
      data_words,
    }
  }

  /// Returns an iterator over every word of this table, descriptors first.
  pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
    self.header_words.iter().chain(&self.data_words).copied()
  }

  /// Returns the name of the C array this table is emitted as.
  pub fn symbol(&self) -> String {
    format!("bnx2_{}_{}_firmware", self.family.name(), self.revision)
  }

  /// Dumps this table to `w` as a C array definition, preceded by a comment
  /// naming `source`.
  pub fn dump(&self, source: &str, mut w: impl io::Write) -> io::Result<()> {
    writeln!(w, "/* {} */", source)?;
    writeln!(w, "static const uint32_t {}[] = {{", self.symbol())?;
    let words = self.words().collect::<Vec<_>>();
    for line in words.chunks(6) {
      write!(w, "\t")?;
      for (i, word) in line.iter().enumerate() {
        if i != 0 {
          write!(w, " ")?;
        }
        write!(w, "0x{:08x},", word)?;
      }
      writeln!(w, "")?;
    }
    writeln!(w, "}};")?;
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::config::Config;
  use crate::firmware::MIPS_NAMES;
  use crate::testing::Builder;

  fn tables() -> (Table, Table) {
    let rom = Builder::default().build();
    let rom = OptionRom::new(&rom.bytes);
    let config = Config::default();

    let search = crate::mips::locate(&rom, &MIPS_NAMES, &config);
    let rv2p = crate::rv2p::locate(&rom, search.max_offset, &config).unwrap();
    let mips = search.records.unwrap();
    (
      Table::assemble(Family::Mips, "09", &rom, &mips),
      Table::assemble(Family::Rv2p, "09", &rom, &rv2p),
    )
  }

  /// Reads the descriptors of `table` back out, unswapped.
  fn descriptors(table: &Table) -> Vec<Vec<u32>> {
    let stride = match table.family {
      Family::Mips => 4,
      Family::Rv2p => 3,
    } + table.family.padding();
    table
      .header_words
      .chunks(stride)
      .map(|d| d.iter().copied().map(swap_word).collect())
      .collect()
  }

  #[test]
  fn swap() {
    assert_eq!(swap_word(0x0800_0078), 0x7800_0008);
    assert_eq!(swap_word(0xa0), 0xa000_0000);
    assert_eq!(swap_word(swap_word(0x1234_5678)), 0x1234_5678);
  }

  #[test]
  fn mips_descriptors() {
    let builder = Builder::default();
    let (mips, _) = tables();
    let descriptors = descriptors(&mips);
    assert_eq!(descriptors.len(), 4);

    let mut expected_offset = 0xa0;
    for (d, m) in descriptors.iter().zip(&builder.mips) {
      assert_eq!(d[0], m.entry);
      assert_eq!(d[1], m.addr);
      assert_eq!(d[2], m.len as u32);
      assert_eq!(d[3], expected_offset);
      assert_eq!(&d[4..], &[0; 6]);
      expected_offset += m.len as u32;
    }
  }

  #[test]
  fn rv2p_descriptors() {
    let (_, rv2p) = tables();
    assert_eq!(
      descriptors(&rv2p),
      vec![
        vec![0, 0x248, 0x58, 0, 0, 0, 0, 0, 0, 0, 0],
        vec![0, 0x430, 0x58 + 0x248, 0, 0, 0, 0, 0, 0, 0, 0],
      ]
    );
  }

  #[test]
  fn lengths_add_up() {
    let (mips, rv2p) = tables();
    let mips_len: u32 = Builder::default().mips.iter().map(|m| m.len as u32).sum();
    assert_eq!(mips_len as usize, 4 * mips.data_words.len());
    assert_eq!(0x248 + 0x430, 4 * rv2p.data_words.len());
    assert_eq!(mips.header_words.len(), 4 * 10);
    assert_eq!(rv2p.header_words.len(), 2 * 11);
    // The base offsets are exactly the size of the descriptors.
    assert_eq!(mips.header_words.len() * 4, 0xa0);
    assert_eq!(rv2p.header_words.len() * 4, 0x58);
  }

  #[test]
  fn offsets_increase() {
    let (mips, rv2p) = tables();
    for table in &[mips, rv2p] {
      let offset_at = match table.family {
        Family::Mips => 3,
        Family::Rv2p => 2,
      };
      let offsets = descriptors(table)
        .iter()
        .map(|d| d[offset_at])
        .collect::<Vec<_>>();
      assert_eq!(offsets[0], table.family.base_offset());
      assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }
  }

  #[test]
  fn data_is_big_endian() {
    let (mips, rv2p) = tables();
    // The first image's key is its fifth word.
    assert_eq!(mips.data_words[0], 0x1111_1111);
    assert_eq!(mips.data_words[4], u32::from_be_bytes(*b" moc"));
    // The RV2P images start with their tag, stored little-endian.
    assert_eq!(rv2p.data_words[0], 0x0800_0000);
    assert_eq!(rv2p.data_words[1], 0x0100_00ac);
    assert_eq!(*rv2p.data_words.last().unwrap(), 0x6b6b_6b6b);
  }

  #[test]
  fn dump_as_c() {
    let rom = vec![0u8; 0x10];
    let rom = OptionRom::new(&rom);
    let record = FirmwareRecord {
      name: "rv2p_proc1".to_string(),
      entry_point: 0,
      text_address: 0,
      text_length: 8,
      byte_offset: 0,
    };
    let table = Table::assemble(Family::Rv2p, "06", &rom, &[record]);

    let mut out = Vec::new();
    table.dump("bcm5706.rom", &mut out).unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "/* bcm5706.rom */\n\
       static const uint32_t bnx2_rv2p_06_firmware[] = {\n\
       \t0x00000000, 0x08000000, 0x58000000, 0x00000000, 0x00000000, 0x00000000,\n\
       \t0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000, 0x00000000,\n\
       \t0x00000000,\n\
       };\n"
    );
  }
}
