//! The `bnx2fw` command-line tool.

#![deny(missing_docs)]
#![deny(unused)]
#![deny(warnings)]
#![deny(unsafe_code)]

use std::fmt;
use std::fs;
use std::io;
use std::io::Write;
use std::path::PathBuf;

use structopt::StructOpt;

use bnx2fw::config::Config;
use bnx2fw::config::OffsetTables;
use bnx2fw::config::Strategy;
use bnx2fw::error;
use bnx2fw::error::Errors;

/// Extracts bnx2 MIPS and RV2P firmware from an Option ROM image, printing
/// it as C arrays.
#[derive(StructOpt, Debug)]
#[structopt(name = "bnx2fw")]
struct Opts {
  /// The Option ROM image to read.
  #[structopt(parse(from_os_str))]
  rom: PathBuf,

  /// The hardware revision, e.g. `09` or `06`; used to name the arrays.
  revision: String,

  /// Echo each parsed firmware header.
  #[structopt(short, long)]
  verbose: bool,

  /// Read firmware from the revision's fixed offsets instead of scanning.
  #[structopt(long)]
  direct: bool,

  /// A JSON5 file of extra per-revision offset tables.
  #[structopt(long, parse(from_os_str))]
  offsets: Option<PathBuf>,

  /// Look for RV2P firmware even if MIPS firmware can't be found.
  #[structopt(short, long)]
  keep_going: bool,

  /// Where to write the arrays; defaults to stdout.
  #[structopt(short, long, parse(from_os_str))]
  output: Option<PathBuf>,
}

/// An I/O failure on one of the files named on the command line.
#[derive(Debug)]
struct FileError {
  action: error::Action,
  path: PathBuf,
  error: io::Error,
}

impl fmt::Display for FileError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.error)
  }
}

impl error::Error for FileError {
  fn cause(&self) -> error::Cause<'_> {
    error::Cause::File(&self.path)
  }

  fn action(&self) -> Option<error::Action> {
    Some(self.action)
  }

  fn exit_code(&self) -> i32 {
    7
  }
}

fn strategy(opts: &Opts) -> Result<Strategy, bnx2fw::config::Error> {
  if !opts.direct {
    return Ok(Strategy::Scan);
  }

  let mut tables = OffsetTables::builtin();
  if let Some(path) = &opts.offsets {
    tables.merge(OffsetTables::load(path)?);
  }
  match tables.get(&opts.revision) {
    Some(layout) => Ok(Strategy::Direct(layout.clone())),
    None => Err(bnx2fw::config::Error::UnknownRevision {
      revision: opts.revision.clone(),
      known: tables.revisions.keys().cloned().collect(),
    }),
  }
}

fn main() {
  let opts = Opts::from_args();

  env_logger::Builder::new()
    .filter_level(if opts.verbose {
      log::LevelFilter::Info
    } else {
      log::LevelFilter::Warn
    })
    .parse_default_env()
    .init();

  if opts.offsets.is_some() && !opts.direct {
    log::warn!("--offsets has no effect without --direct");
  }

  let strategy = match strategy(&opts) {
    Ok(strategy) => strategy,
    Err(e) => return Errors::from(e).dump_and_die(),
  };
  let config = Config {
    revision: opts.revision.clone(),
    verbose: opts.verbose,
    keep_going: opts.keep_going,
    strategy,
  };

  let bytes = match fs::read(&opts.rom) {
    Ok(bytes) => bytes,
    Err(e) => {
      return Errors::from(FileError {
        action: error::Action::Reading,
        path: opts.rom.clone(),
        error: e,
      })
      .dump_and_die()
    }
  };
  log::info!("read {} bytes from {}", bytes.len(), opts.rom.display());

  let tables = match bnx2fw::extract(&bytes, &config) {
    Ok(tables) => tables,
    Err(errors) => return errors.dump_and_die(),
  };

  let source = opts.rom.display().to_string();
  let result = match &opts.output {
    Some(path) => fs::File::create(path)
      .and_then(|file| write_tables(&tables, &source, io::BufWriter::new(file))),
    None => write_tables(&tables, &source, io::stdout().lock()),
  };
  if let Err(e) = result {
    Errors::from(FileError {
      action: error::Action::Writing,
      path: opts.output.clone().unwrap_or_else(|| PathBuf::from("<stdout>")),
      error: e,
    })
    .dump_and_die()
  }
}

fn write_tables(
  tables: &bnx2fw::Tables,
  source: &str,
  mut w: impl Write,
) -> io::Result<()> {
  tables.mips.dump(source, &mut w)?;
  writeln!(w, "")?;
  tables.rv2p.dump(source, &mut w)?;
  w.flush()
}
