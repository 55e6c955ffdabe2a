//! Integer types used by isx2gb.
//!
//! Game Boy cartridges address ROM through 16 KiB banks; ISX records name a
//! location as a bank byte plus a 16-bit address. This module provides a type
//! for handling such banked addresses cleanly, along with little-endian
//! readers for the record stream.

use std::fmt;

use serde::Serialize;

/// The size of a single ROM bank: sixteen kibibytes.
pub const BANK_LEN: usize = 0x4000;

/// A banked Game Boy address.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize)]
pub struct BankAddr {
  /// The "bank byte", selecting which 16 KiB ROM bank the address refers to.
  pub bank: u8,
  /// A 16-bit address within a bank's window.
  pub addr: u16,
}

impl BankAddr {
  /// Creates a new `BankAddr`.
  #[inline]
  pub const fn new(bank: u8, addr: u16) -> Self {
    Self { bank, addr }
  }

  /// Returns the physical offset of this address within a flat ROM image.
  ///
  /// `addr` is taken to be relative to the start of the bank.
  /// ```
  /// # use isx2gb::int::BankAddr;
  /// assert_eq!(BankAddr::new(2, 0x0010).rom_offset(), 0x8010);
  /// ```
  #[inline]
  pub const fn rom_offset(self) -> usize {
    self.bank as usize * BANK_LEN + self.addr as usize
  }
}

impl fmt::Display for BankAddr {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:02X}:{:04X}", self.bank, self.addr)
  }
}

/// Reads a little-endian `u16` at `at`, if `buf` is long enough.
#[inline]
pub fn read_u16_le(buf: &[u8], at: usize) -> Option<u16> {
  let bytes = buf.get(at..at.checked_add(2)?)?;
  Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Reads a little-endian `u32` at `at`, if `buf` is long enough.
#[inline]
pub fn read_u32_le(buf: &[u8], at: usize) -> Option<u32> {
  let bytes = buf.get(at..at.checked_add(4)?)?;
  Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn bank_addr_display() {
    assert_eq!(BankAddr::new(0x1f, 0x3abc).to_string(), "1F:3ABC");
    assert_eq!(BankAddr::new(0, 0x150).to_string(), "00:0150");
  }

  #[test]
  fn bank_addr_ordering() {
    assert!(BankAddr::new(0, 0x3fff) < BankAddr::new(1, 0x0000));
    assert!(BankAddr::new(1, 0x0001) > BankAddr::new(1, 0x0000));
  }

  #[test]
  fn little_endian_reads() {
    let buf = [0x34, 0x12, 0x78, 0x56];
    assert_eq!(read_u16_le(&buf, 0), Some(0x1234));
    assert_eq!(read_u16_le(&buf, 3), None);
    assert_eq!(read_u32_le(&buf, 0), Some(0x5678_1234));
    assert_eq!(read_u32_le(&buf, 1), None);
    assert_eq!(read_u16_le(&buf, usize::MAX), None);
  }
}
