//! Decoding of individual ISX records.

use log::debug;
use serde::Serialize;

use crate::int::read_u16_le;
use crate::int::read_u32_le;
use crate::int::BankAddr;
use crate::isx::Error;
use crate::isx::HEADER_LEN;

/// Tag for a code/data record.
pub const TAG_CODE: u8 = 0x01;
/// Tag for a range information record.
pub const TAG_RANGE: u8 = 0x13;
/// Tag for a symbol information record.
pub const TAG_SYMBOLS: u8 = 0x14;
/// Tags for the three kinds of length-prefixed debug information record.
pub const TAGS_DEBUG: [u8; 3] = [0x20, 0x21, 0x22];

/// The symbol flag marking a global symbol. Symbols with other flags are
/// dropped while decoding.
pub const GLOBAL_SYMBOL: u16 = 0x1000;

/// The first bank that does not fit in a 16 Mbit ROM.
pub const UNSUPPORTED_BANK: u8 = 0x80;

/// The length of a code/data record's fixed part: tag, bank, address, length.
const CODE_HEADER_LEN: usize = 6;
/// The length of a single range information entry.
const RANGE_ENTRY_LEN: usize = 9;

/// A single decoded record.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Record {
  /// A block of code or data destined for a banked address.
  Code(CodeRecord),
  /// Range information, which is skipped.
  Range {
    /// The number of nine-byte range entries.
    count: u16,
  },
  /// Symbol information. Only global symbols are kept.
  Symbols(Vec<Symbol>),
  /// Debug information, which is skipped.
  Debug {
    /// The record's tag, one of `TAGS_DEBUG`.
    tag: u8,
    /// The length of the record body following its length field.
    len: u32,
  },
}

/// The header of a code/data record, plus where to find its payload.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct CodeRecord {
  /// The bank the record was linked into.
  pub bank: u8,
  /// The address the record was linked at, as declared by the linker.
  pub offset: u16,
  /// The offset of the payload within the record stream.
  pub ptr: usize,
  /// The length of the payload.
  pub len: u16,
}

/// A global symbol, as recorded by the linker.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Symbol {
  /// The bank the symbol lives in.
  pub bank: u8,
  /// The symbol's address within its bank.
  pub offset: u16,
  /// The symbol's name.
  pub name: String,
}

impl Symbol {
  /// Returns this symbol's banked address.
  pub fn addr(&self) -> BankAddr {
    BankAddr::new(self.bank, self.offset)
  }
}

/// A bounds-checked little-endian reader over the record stream.
///
/// Any out-of-bounds read reports the record being decoded as truncated.
struct Reader<'isx> {
  stream: &'isx [u8],
  record: usize,
  pos: usize,
}

impl<'isx> Reader<'isx> {
  fn truncated(&self) -> Error {
    Error::Truncated {
      offset: self.record + HEADER_LEN,
    }
  }

  fn u8(&mut self) -> Result<u8, Error> {
    let byte = *self.stream.get(self.pos).ok_or_else(|| self.truncated())?;
    self.pos += 1;
    Ok(byte)
  }

  fn u16(&mut self) -> Result<u16, Error> {
    let val = read_u16_le(self.stream, self.pos).ok_or_else(|| self.truncated())?;
    self.pos += 2;
    Ok(val)
  }

  fn u32(&mut self) -> Result<u32, Error> {
    let val = read_u32_le(self.stream, self.pos).ok_or_else(|| self.truncated())?;
    self.pos += 4;
    Ok(val)
  }

  fn bytes(&mut self, len: usize) -> Result<&'isx [u8], Error> {
    let end = self.pos.checked_add(len).ok_or_else(|| self.truncated())?;
    let bytes = self.stream.get(self.pos..end).ok_or_else(|| self.truncated())?;
    self.pos = end;
    Ok(bytes)
  }

  fn skip(&mut self, len: usize) -> Result<(), Error> {
    self.bytes(len).map(|_| ())
  }
}

impl Record {
  /// Decodes the record starting at `pos` in `stream`.
  ///
  /// Returns the record along with the position of the record following it.
  pub fn read(stream: &[u8], pos: usize) -> Result<(Record, usize), Error> {
    let mut r = Reader {
      stream,
      record: pos,
      pos,
    };

    let tag = r.u8()?;
    let record = match tag {
      TAG_CODE => {
        let bank = r.u8()?;
        if bank >= UNSUPPORTED_BANK {
          return Err(Error::UnsupportedRomSize {
            bank,
            offset: pos + HEADER_LEN,
          });
        }
        let offset = r.u16()?;
        let len = r.u16()?;
        let ptr = r.pos;
        debug_assert_eq!(ptr, pos + CODE_HEADER_LEN);
        r.skip(len as usize)?;
        Record::Code(CodeRecord {
          bank,
          offset,
          ptr,
          len,
        })
      }
      TAG_RANGE => {
        let count = r.u16()?;
        r.skip(count as usize * RANGE_ENTRY_LEN)?;
        Record::Range { count }
      }
      TAG_SYMBOLS => {
        let count = r.u16()?;
        let mut symbols = Vec::new();
        for _ in 0..count {
          let name_len = r.u8()?;
          let name = String::from_utf8_lossy(r.bytes(name_len as usize)?);
          let flag = r.u16()?;
          let offset = r.u16()?;
          let bank = r.u8()?;
          // The bank byte is padded out to a word.
          r.skip(1)?;
          if flag == GLOBAL_SYMBOL {
            symbols.push(Symbol {
              bank,
              offset,
              name: name.into_owned(),
            });
          }
        }
        Record::Symbols(symbols)
      }
      tag if TAGS_DEBUG.contains(&tag) => {
        let len = r.u32()?;
        r.skip(len as usize)?;
        Record::Debug { tag, len }
      }
      tag => {
        return Err(Error::UnknownRecordType {
          tag,
          offset: pos + HEADER_LEN,
        })
      }
    };

    debug!(
      "record ${:02X} at 0x{:x}: {} bytes",
      tag,
      pos + HEADER_LEN,
      r.pos - pos
    );
    Ok((record, r.pos))
  }
}

/// An iterator over the records of a stream, returned by `Isx::records()`.
///
/// Each item is the stream position of a record along with the record itself.
/// Iteration stops after the first error.
pub struct Records<'isx> {
  stream: &'isx [u8],
  pos: usize,
  failed: bool,
}

impl<'isx> Records<'isx> {
  /// Creates a new iterator over the records in `stream`.
  pub fn new(stream: &'isx [u8]) -> Self {
    Self {
      stream,
      pos: 0,
      failed: false,
    }
  }
}

impl Iterator for Records<'_> {
  type Item = Result<(usize, Record), Error>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.failed || self.pos >= self.stream.len() {
      return None;
    }

    let pos = self.pos;
    match Record::read(self.stream, pos) {
      Ok((record, next)) => {
        self.pos = next;
        Some(Ok((pos, record)))
      }
      Err(e) => {
        self.failed = true;
        Some(Err(e))
      }
    }
  }
}
