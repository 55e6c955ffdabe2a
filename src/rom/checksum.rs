//! Cartridge header checksums.
//!
//! The boot ROM refuses to start a cartridge whose header checksum is wrong,
//! and emulators and flashing tools complain about a bad global checksum.
//! Both are only meaningful for a cartridge with a real header, so they are
//! only touched when the Nintendo logo at `$0104` is intact.

use lazy_static::lazy_static;
use log::debug;
use log::warn;

/// The first byte of the Nintendo logo.
pub const LOGO_START: usize = 0x0104;
/// One past the last byte of the logo that is verified.
pub const LOGO_END: usize = 0x0133;
/// The first byte covered by the header checksum.
pub const TITLE_START: usize = 0x0134;
/// The header checksum byte.
pub const HEADER_CHECKSUM: usize = 0x014d;
/// The big-endian global checksum word.
pub const GLOBAL_CHECKSUM: usize = 0x014e;

/// The CRC of a valid logo.
pub const LOGO_CRC: u32 = 0x1538_07cd;

/// The (bit-reversed) CRC polynomial used to verify the logo.
const LOGO_POLY: u32 = 0xd582_8281;

lazy_static! {
  static ref LOGO_CRC_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
      let mut crc = i as u32;
      for _ in 0..8 {
        crc = if crc & 1 != 0 {
          (crc >> 1) ^ LOGO_POLY
        } else {
          crc >> 1
        };
      }
      *entry = crc;
    }
    table
  };
}

/// Computes the CRC used to recognize the Nintendo logo.
pub fn logo_crc(bytes: &[u8]) -> u32 {
  let crc = bytes.iter().fold(!0u32, |crc, &b| {
    LOGO_CRC_TABLE[((crc as u8) ^ b) as usize] ^ (crc >> 8)
  });
  !crc
}

/// Returns whether `rom` carries a valid Nintendo logo.
pub fn has_valid_logo(rom: &[u8]) -> bool {
  match rom.get(LOGO_START..LOGO_END) {
    Some(logo) => logo_crc(logo) == LOGO_CRC,
    None => false,
  }
}

/// Computes the header checksum over `$0134..=$014C`.
///
/// `rom` must be at least `$014D` bytes long.
pub fn header_checksum(rom: &[u8]) -> u8 {
  rom[TITLE_START..HEADER_CHECKSUM]
    .iter()
    .fold(0u8, |sum, &b| sum.wrapping_sub(b).wrapping_sub(1))
}

/// Computes the global checksum: the sum of every byte in the image,
/// excluding the global checksum itself.
///
/// `rom` must be at least `$0150` bytes long.
pub fn global_checksum(rom: &[u8]) -> u16 {
  let sum = rom
    .iter()
    .fold(0u16, |sum, &b| sum.wrapping_add(b as u16));
  sum
    .wrapping_sub(rom[GLOBAL_CHECKSUM] as u16)
    .wrapping_sub(rom[GLOBAL_CHECKSUM + 1] as u16)
}

/// Rewrites the header and global checksums of `rom`, if it carries a valid
/// Nintendo logo.
///
/// Returns whether anything was patched. A ROM without a valid logo is left
/// exactly as it is.
pub fn patch(rom: &mut [u8]) -> bool {
  if rom.len() < GLOBAL_CHECKSUM + 2 || !has_valid_logo(rom) {
    warn!("no valid Nintendo logo found; leaving header checksums alone");
    return false;
  }

  rom[HEADER_CHECKSUM] = header_checksum(rom);
  rom[GLOBAL_CHECKSUM..GLOBAL_CHECKSUM + 2].copy_from_slice(&[0, 0]);
  let global = global_checksum(rom);
  rom[GLOBAL_CHECKSUM..GLOBAL_CHECKSUM + 2].copy_from_slice(&global.to_be_bytes());

  debug!(
    "header checksum ${:02X}, global checksum ${:04X}",
    rom[HEADER_CHECKSUM], global
  );
  true
}
