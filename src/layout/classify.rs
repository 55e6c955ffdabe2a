//! Classification of code/data records into regions.
//!
//! The interesting case is ROM. Bank 0 is hard-wired at `$0000..$3FFF`, and
//! the linker is free to run bank 0 data straight on into `$4000`, which is
//! where the first switchable bank is mapped. Such records are split in two
//! at the bank boundary. Records in switchable banks, on the other hand, must
//! fit inside their bank's window; if they don't, the linker placed data past
//! the end of the bank, and the record is flagged as overflowing.

use crate::int::BANK_LEN;
use crate::isx::CodeRecord;
use crate::layout::Placement;
use crate::layout::Region;
use crate::layout::Status;

/// Mask for turning a switchable-window address into a bank-relative one.
const BANK_MASK: u16 = (BANK_LEN - 1) as u16;

/// The last valid byte of SRAM.
pub const SRAM_TOP: u32 = 0xbfff;

/// The last valid byte of internal RAM.
pub const RAM_TOP: u32 = 0xdfff;

/// The result of classifying a single record: one placement, or two if the
/// record was split across the bank 0/bank 1 boundary.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Classified {
  /// The region both placements belong to.
  pub region: Region,
  /// The first (or only) placement.
  pub first: Placement,
  /// The `SpannedTo` half of a split record, if any.
  pub second: Option<Placement>,
}

impl Classified {
  /// Returns an iterator over the placements, in order.
  pub fn placements(&self) -> impl Iterator<Item = Placement> {
    std::iter::once(self.first).chain(self.second)
  }
}

/// Classifies `record` into a region, splitting or flagging it as necessary.
///
/// The region is picked from the address the linker declared, once; splitting
/// does not move a record into another region.
pub fn classify(record: CodeRecord) -> Classified {
  let region = Region::of(record.offset);
  let mut first = Placement {
    bank: record.bank,
    offset: record.offset,
    ptr: record.ptr,
    len: record.len,
    status: Status::Normal,
  };
  let mut second = None;

  match region {
    Region::Rom if first.bank == 0 && (first.offset as usize) < BANK_LEN => {
      if first.end() >= BANK_LEN as u32 {
        let head = (BANK_LEN - first.offset as usize) as u16;
        let mut tail = Placement {
          bank: 1,
          offset: 0,
          ptr: first.ptr + head as usize,
          len: first.len - head,
          status: Status::SpannedTo,
        };
        // The tail must still fit in bank 1's window.
        if tail.end() > BANK_LEN as u32 {
          tail.status = Status::Overflow;
        }
        second = Some(tail);
        first.len = head;
        first.status = Status::SpannedFrom;
      }
    }
    Region::Rom => {
      // Bank 0 data at or past `$4000` actually lives in bank 1.
      if first.bank == 0 {
        first.bank = 1;
      }
      first.offset &= BANK_MASK;
      if first.end() > BANK_LEN as u32 {
        first.status = Status::Overflow;
      }
    }
    Region::Sram => {
      if first.end() > SRAM_TOP {
        first.status = Status::Overflow;
      }
    }
    Region::Ram => {
      if first.end() > RAM_TOP {
        first.status = Status::Overflow;
      }
    }
    Region::Bogus => {}
  }

  Classified {
    region,
    first,
    second,
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn record(bank: u8, offset: u16, len: u16) -> CodeRecord {
    CodeRecord {
      bank,
      offset,
      ptr: 0x100,
      len,
    }
  }

  fn placement(bank: u8, offset: u16, ptr: usize, len: u16, status: Status) -> Placement {
    Placement {
      bank,
      offset,
      ptr,
      len,
      status,
    }
  }

  #[test]
  fn plain_bank0_record() {
    let c = classify(record(0, 0x0150, 4));
    assert_eq!(c.region, Region::Rom);
    assert_eq!(c.first, placement(0, 0x0150, 0x100, 4, Status::Normal));
    assert_eq!(c.second, None);
  }

  #[test]
  fn bank0_record_is_split() {
    let c = classify(record(0, 0x3ff0, 0x20));
    assert_eq!(c.region, Region::Rom);
    assert_eq!(
      c.placements().collect::<Vec<_>>(),
      vec![
        placement(0, 0x3ff0, 0x100, 0x10, Status::SpannedFrom),
        placement(1, 0x0000, 0x110, 0x10, Status::SpannedTo),
      ]
    );
  }

  #[test]
  fn split_halves_cover_the_record() {
    let c = classify(record(0, 0x2000, 0x3000));
    let halves = c.placements().collect::<Vec<_>>();
    assert_eq!(halves.len(), 2);
    assert_eq!(halves[0].len + halves[1].len, 0x3000);
    assert_eq!(halves[0].ptr + halves[0].len as usize, halves[1].ptr);
    assert_eq!(halves[0].end(), 0x4000);
  }

  #[test]
  fn record_ending_on_the_boundary_is_split() {
    let c = classify(record(0, 0x3ff0, 0x10));
    assert_eq!(c.first.status, Status::SpannedFrom);
    assert_eq!(c.first.len, 0x10);
    assert_eq!(
      c.second,
      Some(placement(1, 0, 0x110, 0, Status::SpannedTo))
    );
  }

  #[test]
  fn split_tail_past_bank1_overflows() {
    let c = classify(record(0, 0x3000, 0x6000));
    assert_eq!(c.region, Region::Rom);
    assert_eq!(
      c.placements().collect::<Vec<_>>(),
      vec![
        placement(0, 0x3000, 0x100, 0x1000, Status::SpannedFrom),
        placement(1, 0x0000, 0x1100, 0x5000, Status::Overflow),
      ]
    );

    // Exactly filling bank 1 is fine.
    let c = classify(record(0, 0x3000, 0x5000));
    assert_eq!(
      c.second,
      Some(placement(1, 0x0000, 0x1100, 0x4000, Status::SpannedTo))
    );
  }

  #[test]
  fn switchable_bank_overflows_instead_of_splitting() {
    let c = classify(record(2, 0x3ff0, 0x20));
    assert_eq!(c.region, Region::Rom);
    assert_eq!(c.first, placement(2, 0x3ff0, 0x100, 0x20, Status::Overflow));
    assert_eq!(c.second, None);

    let c = classify(record(2, 0x3ff0, 0x10));
    assert_eq!(c.first.status, Status::Normal);
  }

  #[test]
  fn switchable_window_addresses_become_bank_relative() {
    let c = classify(record(3, 0x4123, 0x10));
    assert_eq!(c.first, placement(3, 0x0123, 0x100, 0x10, Status::Normal));

    let c = classify(record(3, 0x7ff0, 0x20));
    assert_eq!(c.first, placement(3, 0x3ff0, 0x100, 0x20, Status::Overflow));
  }

  #[test]
  fn bank0_window_data_moves_to_bank1() {
    let c = classify(record(0, 0x4000, 0x80));
    assert_eq!(c.region, Region::Rom);
    assert_eq!(c.first, placement(1, 0x0000, 0x100, 0x80, Status::Normal));
    assert_eq!(c.second, None);
  }

  #[test]
  fn sram_and_ram_overflow() {
    let c = classify(record(0, 0xa000, 0x100));
    assert_eq!((c.region, c.first.status), (Region::Sram, Status::Normal));
    let c = classify(record(0, 0xbf00, 0x100));
    assert_eq!((c.region, c.first.status), (Region::Sram, Status::Overflow));
    let c = classify(record(0, 0xbf00, 0xff));
    assert_eq!((c.region, c.first.status), (Region::Sram, Status::Normal));

    let c = classify(record(0, 0xc000, 0x1fff));
    assert_eq!((c.region, c.first.status), (Region::Ram, Status::Normal));
    let c = classify(record(0, 0xdff0, 0x20));
    assert_eq!((c.region, c.first.status), (Region::Ram, Status::Overflow));
  }

  #[test]
  fn overflow_does_not_wrap() {
    let c = classify(record(0, 0xdfff, 0xffff));
    assert_eq!(c.first.status, Status::Overflow);
  }

  #[test]
  fn bogus_records_are_never_flagged() {
    let c = classify(record(0, 0xff80, 0x100));
    assert_eq!(c.region, Region::Bogus);
    assert_eq!(c.first.status, Status::Normal);
    assert_eq!(c.first.offset, 0xff80);
  }
}
