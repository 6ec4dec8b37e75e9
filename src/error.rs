//! Error printing facilities.
//!
//! These functions are used to simplify the display of extraction errors to
//! the user. The [`Error`] trait describes how a Rust error type can be
//! converted into a simple diagnostic.
//!
//! [`Error`]: trait.Error.html

use std::fmt;
use std::io;
use std::path::Path;

/// An error which can be described as a diagnostic.
///
/// Types that implement `Error` must also implement [`std::fmt::Display`]. For
/// the user-displayed error to look right, this implementation should only be
/// one line long.
///
/// [`std::fmt::Display`]: https://doc.rust-lang.org/std/fmt/trait.Display.html
pub trait Error: fmt::Debug + fmt::Display {
  /// Returns a `Cause` describing the input that resulted in the error.
  fn cause(&self) -> Cause<'_>;
  /// Returns an action this error is associated with, if any at all.
  fn action(&self) -> Option<Action>;
  /// Returns the process exit code this error should be reported with.
  fn exit_code(&self) -> i32;
}

/// A collection of errors that may built up over the course of an action.
///
/// The type parameter `E` should be a type implementing [`Error`].
///
/// [`Error`]: trait.Error.html
#[derive(Debug)]
pub struct Errors<E>(Vec<E>);

impl<E> Errors<E> {
  /// Creates an empty `Errors`.
  pub fn new() -> Self {
    Errors(Vec::new())
  }

  /// Returns true if this `Errors` hasn't had any errors added yet.
  pub fn is_ok(&self) -> bool {
    self.0.is_empty()
  }

  /// Adds a new error to this `Errors`.
  pub fn push(&mut self, error: E) {
    self.0.push(error);
  }

  /// Returns the errors collected so far, in the order they were pushed.
  pub fn as_slice(&self) -> &[E] {
    &self.0
  }
}

impl<E> From<E> for Errors<E> {
  fn from(error: E) -> Self {
    Errors(vec![error])
  }
}

impl<E: Error> Errors<E> {
  /// Dumps this collection of errors as user-displayable text into `sink`.
  ///
  /// Returns `Ok(true)` if anything was written.
  pub fn dump_to(&self, mut sink: impl io::Write) -> io::Result<bool> {
    if self.0.is_empty() {
      return Ok(false);
    }

    for (i, error) in self.0.iter().enumerate() {
      writeln!(sink, "error: {}", error)?;
      match error.action() {
        Some(action) => {
          writeln!(sink, "  while {} {}", action.describe(), error.cause())?
        }
        None => writeln!(sink, "  at {}", error.cause())?,
      }

      if i != self.0.len() - 1 {
        writeln!(sink, "")?;
      }
    }

    Ok(true)
  }

  /// Calls `dump_to()` on `stderr`, exiting the process if any errors are
  /// present.
  ///
  /// The exit code is taken from the first error in the collection.
  pub fn dump_and_die(self) {
    // Writing to stderr is fairly unlikely to fail, so panicking is a fine
    // response here.
    if self.dump_to(io::stderr()).unwrap() {
      if self.0.len() > 1 {
        eprintln!("");
        eprintln!("error: there were {} errors", self.0.len());
      }
      std::process::exit(self.0[0].exit_code())
    }
  }
}

/// The place where an error occured, to varrying degrees of specificity.
pub enum Cause<'a> {
  /// A firmware image, by name.
  Firmware(&'a str),
  /// A byte offset within the ROM image.
  Offset(usize),
  /// A byte pattern that was searched for, described for humans.
  Pattern(&'a str),
  /// A hardware revision label.
  Revision(&'a str),
  /// A file, for when we don't know much about where the error came from
  /// within.
  File(&'a Path),
}

impl fmt::Display for Cause<'_> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Self::Firmware(name) => write!(f, "firmware `{}`", name),
      Self::Offset(offset) => write!(f, "at offset 0x{:06x}", offset),
      Self::Pattern(desc) => write!(f, "looking for {}", desc),
      Self::Revision(rev) => write!(f, "revision `{}`", rev),
      Self::File(path) => write!(f, "{}", path.display()),
    }
  }
}

/// An action that the extractor performs, which an error may be associated
/// with.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Action {
  /// Locating the four MIPS firmware images.
  LocatingMips,
  /// Locating the two RV2P firmware images.
  LocatingRv2p,
  /// Reading the ROM image from disk.
  Reading,
  /// Writing the output tables.
  Writing,
  /// Loading per-revision offset tables.
  LoadingOffsets,
}

impl Action {
  fn describe(self) -> &'static str {
    match self {
      Self::LocatingMips => "locating MIPS firmware,",
      Self::LocatingRv2p => "locating RV2P firmware,",
      Self::Reading => "reading",
      Self::Writing => "writing",
      Self::LoadingOffsets => "loading offset tables from",
    }
  }
}
