//! Symbol files for debuggers.
//!
//! The format is the one understood by BGB and most Game Boy debuggers since:
//! one symbol per line, as `BB:AAAA Name`, with the bank and address in
//! uppercase hexadecimal.

use std::io;

use crate::isx::Symbol;
use crate::layout::sort_symbols;

/// Writes `symbols` to `w` as a symbol file, sorted by bank and address.
pub fn write(symbols: &[Symbol], mut w: impl io::Write) -> io::Result<()> {
  let mut sorted = symbols.to_vec();
  sort_symbols(&mut sorted);
  for symbol in &sorted {
    writeln!(w, "{} {}", symbol.addr(), symbol.name)?;
  }
  Ok(())
}
