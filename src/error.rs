//! Error printing facilities.
//!
//! These functions are used to simplify the display of various conversion
//! errors to the user. The [`Error`] trait describes how a Rust error type can
//! be converted into a simple diagonstic.
//!
//! [`Error`]: trait.Error.html

use std::fmt;
use std::io;
use std::path::Path;

use crate::int::BankAddr;
use crate::isx;

/// An error which can be described as a diagnostic.
///
/// Types that implement `Error` must also implement [`std::fmt::Display`]. For
/// the user-displayed error to look right, this implementation should only be
/// one line long.
///
/// [`std::fmt::Display`]: https://doc.rust-lang.org/std/fmt/trait.Display.html
pub trait Error: fmt::Debug + fmt::Display {
  /// Returns a `Cause` describing the input that resulted in the error.
  fn cause(&self) -> Cause;
  /// Returns an action this error is associated with, if any at all.
  fn action(&self) -> Option<Action>;
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

  /// Returns the number of errors collected so far.
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Adds a new error to this `Errors`.
  pub fn push(&mut self, error: E) {
    self.0.push(error);
  }

  /// Extends this `Errors` by consuming another `Errors`.
  pub fn extend(&mut self, mut errors: Errors<E>) {
    self.0.reserve(errors.0.len());
    for e in errors.0.drain(..) {
      self.push(e);
    }
  }

  /// Returns an iterator over the collected errors.
  pub fn iter(&self) -> impl Iterator<Item = &E> {
    self.0.iter()
  }

  /// Converts this collection into a `Result`, returning `Ok(value)` if no
  /// errors were collected.
  pub fn into_result<T>(self, value: T) -> Result<T, Self> {
    if self.is_ok() {
      Ok(value)
    } else {
      Err(self)
    }
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
  /// `file` names the input the errors refer to.
  ///
  /// Returns `Ok(true)` if anything was written.
  pub fn dump_to(&self, file: &Path, mut sink: impl io::Write) -> io::Result<bool> {
    if self.0.is_empty() {
      return Ok(false);
    }

    for (i, error) in self.0.iter().enumerate() {
      writeln!(sink, "error: {}", error)?;
      let action = error.action().map(Action::describe);
      match (error.cause(), action) {
        (Cause::Offset(offset), Some(action)) => writeln!(
          sink,
          "  while {} {} at offset 0x{:x}",
          action,
          file.display(),
          offset
        )?,
        (Cause::Offset(offset), None) => {
          writeln!(sink, "  at {}+0x{:x}", file.display(), offset)?
        }
        (Cause::Addr(addr), Some(action)) => writeln!(
          sink,
          "  while {} {} at ${}",
          action,
          file.display(),
          addr
        )?,
        (Cause::Addr(addr), None) => {
          writeln!(sink, "  at ${} in {}", addr, file.display())?
        }
        (Cause::File, Some(action)) => {
          writeln!(sink, "  while {} {}", action, file.display())?
        }
        (Cause::File, None) => writeln!(sink, "  at {}", file.display())?,
      }

      if i != self.0.len() - 1 {
        writeln!(sink, "")?;
      }
    }

    Ok(true)
  }

  /// Calls `dump_to()` on `stderr`, exiting the process with the given
  /// `exit_code` if any errors are present.
  pub fn dump_and_die(self, file: &Path, code: i32) {
    // Writing to stderr is fairly unlikely to fail, so panicking is a fine
    // response here.
    if self.dump_to(file, io::stderr()).unwrap() {
      eprintln!("");
      eprintln!("error: there were {} errors", self.0.len());
      std::process::exit(code)
    }
  }
}

/// The place where an error occured, to varrying degrees of specificity.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Cause {
  /// An absolute byte offset within the ISX file.
  Offset(usize),
  /// A banked address in the cartridge address space.
  Addr(BankAddr),
  /// The file as a whole, for when we don't know much about where the error
  /// came from within.
  File,
}

/// An action that isx2gb performs, which an error may be associated with.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Action {
  /// The decoding step, walking the ISX record stream.
  Decoding,
  /// The layout step, placing records into regions.
  LayingOut,
  /// The assembly step, copying records into a ROM image.
  Assembling,
  /// The patching step, copying records onto an existing ROM.
  Patching,
}

impl Action {
  fn describe(self) -> &'static str {
    match self {
      Self::Decoding => "decoding",
      Self::LayingOut => "laying out",
      Self::Assembling => "assembling",
      Self::Patching => "patching",
    }
  }
}

impl Error for isx::Error {
  fn cause(&self) -> Cause {
    match *self {
      isx::Error::MalformedHeader(_) => Cause::File,
      isx::Error::UnknownRecordType { offset, .. }
      | isx::Error::UnsupportedRomSize { offset, .. }
      | isx::Error::Truncated { offset } => Cause::Offset(offset),
    }
  }

  fn action(&self) -> Option<Action> {
    Some(Action::Decoding)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn dumps_offsets_and_actions() {
    let mut errors = Errors::new();
    errors.push(isx::Error::UnknownRecordType {
      tag: 0x42,
      offset: 0x30,
    });
    errors.push(isx::Error::MalformedHeader(isx::HeaderProblem::Signature));

    let mut out = Vec::new();
    assert!(errors.dump_to(Path::new("game.isx"), &mut out).unwrap());
    let text = String::from_utf8(out).unwrap();
    assert_eq!(
      text,
      "error: unknown record type $42\n  \
       while decoding game.isx at offset 0x30\n\
       \n\
       error: ISX signature not found\n  \
       while decoding game.isx\n"
    );
  }

  #[test]
  fn empty_errors_write_nothing() {
    let errors = Errors::<isx::Error>::new();
    let mut out = Vec::new();
    assert!(!errors.dump_to(Path::new("game.isx"), &mut out).unwrap());
    assert!(out.is_empty());
  }
}
