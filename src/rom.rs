//! Types and functions for manipulating Game Boy ROM binaries.
//!
//! A Game Boy cartridge ROM is a flat sequence of 16 KiB banks. Bank 0 is
//! always mapped at `$0000..$3FFF`; any one of the remaining banks can be
//! paged into `$4000..$7FFF` by the cartridge's memory bank controller. A
//! banked address therefore maps to the physical offset
//! `bank * 0x4000 + (addr & 0x3fff)`.

use std::fmt;
use std::io;

use crate::int::BankAddr;
use crate::int::BANK_LEN;

pub mod checksum;

/// The offset of the CGB flag in the cartridge header.
pub const CGB_FLAG: usize = 0x0143;

/// The CGB flag value marking a Game Boy Color-only cartridge.
pub const CGB_ONLY: u8 = 0xc0;

/// A Game Boy ROM image.
#[derive(Clone)]
pub struct Rom {
  bytes: Box<[u8]>,
}

impl Rom {
  /// Creates a new `Rom` of `banks` banks, filled with zeroes.
  pub fn new(banks: usize) -> Self {
    Self::filled_with(banks, 0)
  }

  /// Creates a new `Rom` of `banks` banks, with the given value of `byte` in
  /// each slot.
  ///
  /// The fill is done by repeatedly doubling the filled prefix, which is much
  /// faster than setting bytes one at a time for multi-megabyte images.
  pub fn filled_with(banks: usize, byte: u8) -> Self {
    let mut bytes = vec![0; banks * BANK_LEN].into_boxed_slice();
    if byte != 0 && !bytes.is_empty() {
      bytes[0] = byte;
      let mut filled = 1;
      while filled < bytes.len() {
        let n = filled.min(bytes.len() - filled);
        bytes.copy_within(..n, filled);
        filled += n;
      }
    }
    Self { bytes }
  }

  /// Wraps an existing ROM image.
  pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
    Self {
      bytes: bytes.into(),
    }
  }

  /// Returns the number of bytes in this ROM.
  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  /// Returns the number of banks in this ROM, rounding up partial banks.
  pub fn banks(&self) -> usize {
    (self.bytes.len() + BANK_LEN - 1) / BANK_LEN
  }

  /// Returns the bytes at the bank-relative address `addr`, if the whole
  /// `len` bytes lie within the ROM.
  pub fn at(&mut self, addr: BankAddr, len: usize) -> Option<&mut [u8]> {
    let start = addr.rom_offset();
    let end = start.checked_add(len)?;
    self.bytes.get_mut(start..end)
  }

  /// Returns the raw ROM bytes.
  pub fn bytes(&self) -> &[u8] {
    &self.bytes
  }

  /// Returns the raw ROM bytes, mutably.
  pub fn bytes_mut(&mut self) -> &mut [u8] {
    &mut self.bytes
  }

  /// Returns whether the cartridge header marks this ROM as Game Boy
  /// Color-only.
  pub fn is_cgb_only(&self) -> bool {
    self.bytes.get(CGB_FLAG) == Some(&CGB_ONLY)
  }

  /// Returns the conventional file extension for this ROM: `gbc` for Color-only
  /// cartridges and `gb` for everything else.
  pub fn extension(&self) -> &'static str {
    if self.is_cgb_only() {
      "gbc"
    } else {
      "gb"
    }
  }

  /// Dumps the (interesting) contents of this ROM to the given `Write`.
  pub fn dump(&self, mut w: impl io::Write) -> io::Result<()> {
    let mut ascii_str = String::new();
    let iter = self
      .bytes
      .chunks(16)
      .enumerate()
      .filter(|(_, c)| c.iter().any(|&byte| byte != 0));
    for (addr, chunk) in iter {
      write!(w, "{:06x}:", addr * 16)?;

      ascii_str.clear();
      for &byte in chunk {
        write!(w, " {:02x}", byte)?;

        if 0x20 <= byte && byte <= 0x7e {
          ascii_str.push(byte as char);
        } else {
          ascii_str.push('.');
        }
      }
      writeln!(w, "  |{}|", ascii_str)?;
    }
    Ok(())
  }

  /// Consumes this `Rom`, returning the raw ROM bytes.
  pub fn into_bytes(self) -> Box<[u8]> {
    self.bytes
  }
}

impl fmt::Debug for Rom {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("Rom")
      .field("banks", &self.banks())
      .field("len", &self.bytes.len())
      .finish()
  }
}

/// Rounds a bank count up to the next power of two.
///
/// Real cartridges come in power-of-two sizes of at least two banks, so a
/// single bank is rounded up to two.
/// ```
/// # use isx2gb::rom::round_banks;
/// assert_eq!(round_banks(1), 2);
/// assert_eq!(round_banks(3), 4);
/// assert_eq!(round_banks(8), 8);
/// ```
pub fn round_banks(banks: usize) -> usize {
  banks.next_power_of_two().max(2)
}
