//! The ISX debug executable format.
//!
//! An ISX file consists of a 32-byte text header, starting with the signature
//! `"ISX "`, followed by a stream of variable-length binary *records*. Each
//! record begins with a tag byte describing how the rest of it is laid out:
//! code/data records carry bytes destined for a particular banked address,
//! while range, symbol and debug records carry information for debuggers.
//!
//! Records are self-describing only through their own length fields, so the
//! stream must be decoded strictly front to back.

use std::fmt;

mod record;

pub use record::*;

/// The length of the text header preceding the record stream.
pub const HEADER_LEN: usize = 32;

/// The signature every ISX file begins with.
pub const SIGNATURE: &[u8; 4] = b"ISX ";

/// A validated ISX file.
///
/// An `Isx` owns the raw file bytes. Everything decoded out of it refers back
/// into this buffer by offset, rather than copying it.
#[derive(Clone)]
pub struct Isx {
  bytes: Box<[u8]>,
}

impl Isx {
  /// Validates the header of `bytes`, returning an `Isx` on success.
  pub fn parse(bytes: impl Into<Box<[u8]>>) -> Result<Self, Error> {
    let bytes = bytes.into();
    if bytes.len() <= HEADER_LEN {
      return Err(Error::MalformedHeader(HeaderProblem::TooSmall(bytes.len())));
    }
    if !bytes.starts_with(SIGNATURE) {
      return Err(Error::MalformedHeader(HeaderProblem::Signature));
    }
    Ok(Self { bytes })
  }

  /// Returns the header text, with trailing padding removed.
  pub fn header_text(&self) -> String {
    String::from_utf8_lossy(&self.bytes[..HEADER_LEN])
      .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
      .to_string()
  }

  /// Returns the record stream, i.e., everything after the header.
  ///
  /// Payload pointers handed out by the decoder are offsets into this slice.
  pub fn stream(&self) -> &[u8] {
    &self.bytes[HEADER_LEN..]
  }

  /// Returns an iterator over the records in this file.
  pub fn records(&self) -> Records<'_> {
    Records::new(self.stream())
  }
}

impl fmt::Debug for Isx {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Isx")
      .field("header", &self.header_text())
      .field("len", &self.bytes.len())
      .finish()
  }
}

/// What was wrong with an ISX header.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum HeaderProblem {
  /// The file is no bigger than the header itself.
  TooSmall(usize),
  /// The file does not start with `"ISX "`.
  Signature,
}

/// An error produced while decoding an ISX file.
///
/// Every one of these is fatal: a malformed ISX file is rejected outright,
/// rather than risking a silently broken cartridge.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
  /// Indicates that the file is too small or lacks the ISX signature.
  MalformedHeader(HeaderProblem),
  /// Indicates a record tag this tool does not know how to skip.
  UnknownRecordType {
    /// The offending tag byte.
    tag: u8,
    /// The absolute file offset of the record.
    offset: usize,
  },
  /// Indicates a code/data record for a bank beyond 16 Mbit.
  UnsupportedRomSize {
    /// The bank byte of the record.
    bank: u8,
    /// The absolute file offset of the record.
    offset: usize,
  },
  /// Indicates a record that runs past the end of the file.
  Truncated {
    /// The absolute file offset of the record.
    offset: usize,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::MalformedHeader(HeaderProblem::TooSmall(len)) => {
        write!(f, "dubious file size ({} bytes), probably invalid", len)
      }
      Error::MalformedHeader(HeaderProblem::Signature) => {
        write!(f, "ISX signature not found")
      }
      Error::UnknownRecordType { tag, .. } => {
        write!(f, "unknown record type ${:02X}", tag)
      }
      Error::UnsupportedRomSize { bank, .. } => write!(
        f,
        "bank ${:02X} is out of range; ROMs above 16 Mbit are not supported",
        bank
      ),
      Error::Truncated { .. } => write!(f, "record runs past the end of the file"),
    }
  }
}
