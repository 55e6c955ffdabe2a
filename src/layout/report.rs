//! Human-readable layout reports.

use std::io;

use crate::int::BANK_LEN;
use crate::layout::bank_totals;
use crate::layout::Layout;
use crate::layout::Placement;
use crate::layout::Region;
use crate::layout::Status;

/// Dumps the layout of each of `regions` to `w`, bank by bank.
///
/// Regions without any placements are left out.
pub fn dump(layout: &Layout, regions: &[Region], mut w: impl io::Write) -> io::Result<()> {
  for &region in regions {
    dump_region(region, &layout.sorted(region), &mut w)?;
  }
  Ok(())
}

/// Dumps a single region, whose placements have already been sorted.
pub fn dump_region(region: Region, sorted: &[Placement], mut w: impl io::Write) -> io::Result<()> {
  let totals = bank_totals(sorted);
  for total in totals {
    writeln!(w, "{} bank ${:02X}:", region, total.bank)?;
    for p in sorted.iter().filter(|p| p.bank == total.bank) {
      let mut start = p.offset as u32;
      // Switchable banks are shown where the CPU sees them.
      if region == Region::Rom && p.bank > 0 {
        start |= BANK_LEN as u32;
      }
      let last = (start + p.len as u32).saturating_sub(1).max(start);

      match p.status {
        Status::Normal => {
          writeln!(w, "    ${:04X} - ${:04X}  {:5}", start, last, p.len)?
        }
        Status::SpannedFrom => {
          writeln!(w, "    ${:04X} -   >    {:5}", start, p.len)?
        }
        Status::SpannedTo => {
          writeln!(w, "      >   - ${:04X}  {:5}", last, p.len)?
        }
        Status::Overflow => {
          writeln!(w, "    ${:04X} - ${:04X}  {:5}  !", start, last, p.len)?
        }
      }
    }
    writeln!(w, "                   -----")?;
    writeln!(w, "                   {:5} bytes", total.bytes)?;
    writeln!(w, "")?;
  }
  Ok(())
}
