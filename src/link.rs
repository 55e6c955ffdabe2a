//! The linker, which lays the ROM placements of an ISX file out into a ROM.

use std::fmt;

use log::debug;
use log::info;

use crate::error;
use crate::int::BankAddr;
use crate::isx::Isx;
use crate::layout::Layout;
use crate::layout::Placement;
use crate::layout::Region;
use crate::rom;
use crate::rom::Rom;

/// Options affecting the shape of a freshly linked ROM.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct Options {
  /// Fill unused space with `0xff` rather than `0x00`.
  pub fill: bool,
  /// Round the number of banks up to the next power of two.
  pub round: bool,
}

/// Links the ROM placements of `layout` into a new ROM image, patching the
/// header checksums afterwards.
///
/// `layout` must have been scanned from `isx`. Nothing is assembled if any
/// placement, in any region, overflows.
pub fn link(isx: &Isx, layout: &Layout, options: Options) -> Result<Rom, error::Errors<Error>> {
  check(layout)?;

  let mut banks = layout.bank_count();
  if options.round {
    banks = rom::round_banks(banks);
  }
  let mut rom = if options.fill {
    Rom::filled_with(banks, 0xff)
  } else {
    Rom::new(banks)
  };
  info!("assembling {} bank(s), {} bytes", banks, rom.len());

  Linker::new(isx, layout, &mut rom, error::Action::Assembling).run()?;
  rom::checksum::patch(rom.bytes_mut());
  Ok(rom)
}

/// Copies the ROM placements of `layout` onto an existing ROM image, patching
/// the header checksums afterwards.
///
/// Unlike `link()`, every placement must land inside the existing image.
pub fn patch(isx: &Isx, layout: &Layout, rom: &mut Rom) -> Result<(), error::Errors<Error>> {
  check(layout)?;
  Linker::new(isx, layout, rom, error::Action::Patching).run()?;
  rom::checksum::patch(rom.bytes_mut());
  Ok(())
}

/// Checks that no placement of `layout` overflows its region.
pub fn check(layout: &Layout) -> Result<(), error::Errors<Error>> {
  let mut errors = error::Errors::new();
  for (region, &placement) in layout.overflows() {
    errors.push(Error::RegionOverflow { region, placement });
  }
  errors.into_result(())
}

/// Returns the file name a placement is dumped to, given the output stem.
///
/// The bank and offset are separated by U+A789, which looks like a colon but
/// is allowed in file names everywhere.
pub fn dump_name(stem: &str, placement: &Placement) -> String {
  format!("{}_{:02X}\u{a789}{:04X}.bin", stem, placement.bank, placement.offset)
}

/// An error produced while linking.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
  /// Indicates that a placement runs past the end of its region.
  RegionOverflow {
    /// The region the placement is in.
    region: Region,
    /// The offending placement.
    placement: Placement,
  },
  /// Indicates that a placement does not fit in a newly assembled ROM.
  Unmapped {
    /// The address of the placement.
    addr: BankAddr,
    /// The length of the placement.
    len: u16,
  },
  /// Indicates that a placement runs past the end of the ROM being patched.
  PatchOutOfBounds {
    /// The address of the placement.
    addr: BankAddr,
    /// The length of the placement.
    len: u16,
    /// The size of the ROM being patched.
    rom_len: usize,
  },
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Error::RegionOverflow { region, placement } => write!(
        f,
        "{} data overflow: {} bytes at ${} run past the end of the region",
        region,
        placement.len,
        placement.addr()
      ),
      Error::Unmapped { addr, len } => {
        write!(f, "{} bytes at ${} do not fit in the ROM", len, addr)
      }
      Error::PatchOutOfBounds { addr, len, rom_len } => write!(
        f,
        "patching {} bytes at 0x{:08X} crosses the end of the {}-byte ROM",
        len,
        addr.rom_offset(),
        rom_len
      ),
    }
  }
}

impl error::Error for Error {
  fn cause(&self) -> error::Cause {
    match *self {
      Error::RegionOverflow { placement, .. } => error::Cause::Addr(placement.addr()),
      Error::Unmapped { addr, .. } | Error::PatchOutOfBounds { addr, .. } => {
        error::Cause::Addr(addr)
      }
    }
  }

  fn action(&self) -> Option<error::Action> {
    match self {
      Error::RegionOverflow { .. } => Some(error::Action::LayingOut),
      Error::Unmapped { .. } => Some(error::Action::Assembling),
      Error::PatchOutOfBounds { .. } => Some(error::Action::Patching),
    }
  }
}

struct Linker<'isx, 'rom> {
  isx: &'isx Isx,
  layout: &'isx Layout,
  rom: &'rom mut Rom,
  action: error::Action,

  errors: error::Errors<Error>,
}

impl<'isx, 'rom> Linker<'isx, 'rom> {
  pub fn new(
    isx: &'isx Isx,
    layout: &'isx Layout,
    rom: &'rom mut Rom,
    action: error::Action,
  ) -> Self {
    Self {
      isx,
      layout,
      rom,
      action,
      errors: error::Errors::new(),
    }
  }

  pub fn run(mut self) -> Result<(), error::Errors<Error>> {
    self.write_placements();
    self.errors.into_result(())
  }

  fn write_placements(&mut self) {
    let stream = self.isx.stream();
    let layout = self.layout;
    let rom_len = self.rom.len();
    // Placements never overlap in well-formed input, so the order they are
    // written in does not matter.
    for placement in layout.region(Region::Rom) {
      let addr = placement.addr();
      let len = placement.len;
      let dest = match self.rom.at(addr, len as usize) {
        Some(dest) => dest,
        None => {
          self.errors.push(match self.action {
            error::Action::Patching => Error::PatchOutOfBounds { addr, len, rom_len },
            _ => Error::Unmapped { addr, len },
          });
          continue;
        }
      };

      dest.copy_from_slice(placement.payload(stream));
      debug!("0x{:08X}: {:5} byte(s)", addr.rom_offset(), len);
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::int::BANK_LEN;
  use crate::layout::Status;
  use crate::rom::checksum;
  use crate::testing::IsxBuilder;

  fn scan(builder: IsxBuilder) -> (Isx, Layout) {
    let isx = Isx::parse(builder.build()).unwrap();
    let layout = Layout::scan(&isx).unwrap();
    (isx, layout)
  }

  #[test_log::test]
  fn single_record_cartridge() {
    let (isx, layout) = scan(
      IsxBuilder::new()
        .logo()
        .code(0, 0x0150, &[0xde, 0xad, 0xbe, 0xef]),
    );
    let rom = link(&isx, &layout, Options::default()).unwrap();
    let bytes = rom.bytes();
    assert_eq!(bytes.len(), BANK_LEN);
    assert_eq!(&bytes[0x150..0x154], &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(bytes[checksum::HEADER_CHECKSUM], 0xe7);
    assert_eq!(
      &bytes[checksum::GLOBAL_CHECKSUM..checksum::GLOBAL_CHECKSUM + 2],
      &[0x19, 0x65]
    );
    assert_eq!(rom.extension(), "gb");
  }

  #[test]
  fn split_record_lands_contiguously() {
    let payload = (0..0x20).collect::<Vec<u8>>();
    let (isx, layout) = scan(IsxBuilder::new().code(0, 0x3ff0, &payload));
    let rom = link(&isx, &layout, Options::default()).unwrap();
    assert_eq!(rom.len(), 2 * BANK_LEN);
    assert_eq!(&rom.bytes()[0x3ff0..0x4010], &payload[..]);
  }

  #[test]
  fn switchable_banks_and_padding() {
    let (isx, layout) = scan(
      IsxBuilder::new()
        .code(0, 0x0000, &[0x11])
        .code(2, 0x4000, &[0x22, 0x23])
        .code(0, 0xc000, &[0x33]),
    );
    let options = Options {
      fill: true,
      round: false,
    };
    let rom = link(&isx, &layout, options).unwrap();
    assert_eq!(rom.banks(), 3);
    assert_eq!(rom.bytes()[0], 0x11);
    assert_eq!(&rom.bytes()[0x8000..0x8003], &[0x22, 0x23, 0xff]);
    assert!(rom.bytes()[0x4000..0x8000].iter().all(|&b| b == 0xff));
  }

  #[test]
  fn rounding_grows_the_image() {
    let (isx, layout) = scan(IsxBuilder::new().code(2, 0x4000, &[1]));
    let options = Options {
      fill: false,
      round: true,
    };
    assert_eq!(link(&isx, &layout, options).unwrap().banks(), 4);

    let (isx, layout) = scan(IsxBuilder::new().code(0, 0x0100, &[1]));
    assert_eq!(link(&isx, &layout, options).unwrap().banks(), 2);
  }

  #[test]
  fn overflow_blocks_assembly() {
    let (isx, layout) = scan(
      IsxBuilder::new()
        .code(0, 0x0150, &[1])
        .code(2, 0x3ff0, &[0; 0x20])
        .code(0, 0xdff0, &[0; 0x20]),
    );
    let errors = link(&isx, &layout, Options::default()).unwrap_err();
    let errors = errors.iter().collect::<Vec<_>>();
    assert_eq!(errors.len(), 2);
    assert!(matches!(
      errors[0],
      Error::RegionOverflow {
        region: Region::Rom,
        placement: Placement {
          bank: 2,
          offset: 0x3ff0,
          len: 0x20,
          status: Status::Overflow,
          ..
        },
      }
    ));
    assert!(matches!(
      errors[1],
      Error::RegionOverflow {
        region: Region::Ram,
        ..
      }
    ));
  }

  #[test]
  fn split_tail_past_bank1_blocks_assembly() {
    let (isx, layout) = scan(
      IsxBuilder::new()
        .code(0, 0x3000, &[0xaa; 0x6000])
        .code(3, 0x4000, &[0xbb; 0x10]),
    );
    let errors = link(&isx, &layout, Options::default()).unwrap_err();
    let errors = errors.iter().collect::<Vec<_>>();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
      errors[0],
      Error::RegionOverflow {
        region: Region::Rom,
        placement: Placement {
          bank: 1,
          offset: 0,
          len: 0x5000,
          status: Status::Overflow,
          ..
        },
      }
    ));
    assert!(check(&layout).is_err());

    let mut rom = Rom::new(4);
    assert!(patch(&isx, &layout, &mut rom).is_err());
    assert!(rom.bytes().iter().all(|&b| b == 0));
  }

  #[test]
  fn patch_applies_records() {
    let (isx, layout) = scan(
      IsxBuilder::new()
        .code(1, 0x4100, &[0xaa, 0xbb])
        .code(0, 0xa000, &[0xcc]),
    );
    let mut rom = Rom::filled_with(4, 0x00);
    patch(&isx, &layout, &mut rom).unwrap();
    assert_eq!(&rom.bytes()[0x4100..0x4102], &[0xaa, 0xbb]);
    assert_eq!(rom.len(), 4 * BANK_LEN);
    assert!(rom.bytes()[..0x4100].iter().all(|&b| b == 0));
  }

  #[test]
  fn patch_rejects_records_past_the_end() {
    let (isx, layout) = scan(IsxBuilder::new().code(3, 0x7ff0, &[0; 0x10]));
    let mut rom = Rom::new(2);
    let errors = patch(&isx, &layout, &mut rom).unwrap_err();
    assert_eq!(
      errors.iter().collect::<Vec<_>>(),
      [&Error::PatchOutOfBounds {
        addr: BankAddr::new(3, 0x3ff0),
        len: 0x10,
        rom_len: 2 * BANK_LEN,
      }]
    );
  }

  #[test]
  fn dump_names() {
    let p = Placement {
      bank: 0x1a,
      offset: 0x0150,
      ptr: 0,
      len: 1,
      status: Status::Normal,
    };
    assert_eq!(dump_name("out/game", &p), "out/game_1A\u{a789}0150.bin");
  }
}
