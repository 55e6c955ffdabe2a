//! Layout of ISX records in the cartridge address space.
//!
//! Every code/data record in an ISX file targets some banked address. The
//! address decides which *region* the record belongs to: ROM, external SRAM,
//! internal RAM, or nothing sensible at all. A [`Layout`] collects the
//! records of a whole file into these regions as [`Placement`]s, which point
//! back into the ISX record stream rather than copying any payload.
//!
//! [`Layout`]: struct.Layout.html
//! [`Placement`]: struct.Placement.html

use std::fmt;

use log::info;
use serde::Serialize;

use crate::int::BankAddr;
use crate::isx;
use crate::isx::CodeRecord;
use crate::isx::Isx;
use crate::isx::Record;
use crate::isx::Symbol;

mod classify;
pub mod report;

pub use classify::*;

/// A region of the Game Boy address space.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum Region {
  /// Cartridge ROM, `$0000..=$7FFF`.
  Rom,
  /// External cartridge RAM, `$A000..=$BFFF`.
  Sram,
  /// Internal work RAM, `$C000..=$DFFF`.
  Ram,
  /// Anything else. Such records are reported and otherwise ignored.
  Bogus,
}

impl Region {
  /// All regions, in reporting order.
  pub const ALL: &'static [Region] =
    &[Region::Rom, Region::Sram, Region::Ram, Region::Bogus];

  /// Returns the region a record linked at `offset` belongs to.
  pub fn of(offset: u16) -> Self {
    match offset {
      0x0000..=0x7fff => Region::Rom,
      0xa000..=0xbfff => Region::Sram,
      0xc000..=0xdfff => Region::Ram,
      _ => Region::Bogus,
    }
  }

  /// Returns a short name for this region, for reports.
  pub fn name(self) -> &'static str {
    match self {
      Region::Rom => "ROM",
      Region::Sram => "SRAM",
      Region::Ram => "RAM",
      Region::Bogus => "???",
    }
  }
}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// The status of a [`Placement`].
///
/// [`Placement`]: struct.Placement.html
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub enum Status {
  /// An ordinary record.
  Normal,
  /// The bank 0 half of a record split across the bank 0/bank 1 boundary.
  /// It is always followed by its bank 1 half, which is `SpannedTo` unless it
  /// runs past the end of bank 1.
  SpannedFrom,
  /// The bank 1 half of a split record.
  SpannedTo,
  /// A record running past the end of its region.
  Overflow,
}

/// A record placed into a region.
///
/// A `Placement` does not own its payload; it names a range of the ISX record
/// stream, resolved with `payload()`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Placement {
  /// The ROM bank, meaningful for ROM placements only.
  pub bank: u8,
  /// The address within the bank's window. ROM placements are always
  /// bank-relative, i.e. below `$4000` unless they overflow.
  pub offset: u16,
  /// The offset of the payload within the record stream.
  #[serde(skip)]
  pub ptr: usize,
  /// The payload length.
  pub len: u16,
  /// The placement's status.
  pub status: Status,
}

impl Placement {
  /// Returns the banked address of this placement.
  pub fn addr(&self) -> BankAddr {
    BankAddr::new(self.bank, self.offset)
  }

  /// Returns the address one past the last byte of this placement. This is
  /// computed in 32 bits, so it never wraps.
  pub fn end(&self) -> u32 {
    self.offset as u32 + self.len as u32
  }

  /// Returns this placement's payload within `stream`.
  ///
  /// `stream` must be the record stream this placement was decoded from.
  pub fn payload<'isx>(&self, stream: &'isx [u8]) -> &'isx [u8] {
    &stream[self.ptr..self.ptr + self.len as usize]
  }
}

/// The per-bank byte count of a region.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize)]
pub struct BankTotal {
  /// The bank being summed up.
  pub bank: u8,
  /// The number of distinct bytes used in the bank.
  pub bytes: u32,
}

/// Sorts `placements` by bank, and then by offset.
pub fn sort_placements(placements: &mut [Placement]) {
  placements.sort_by_key(|p| (p.bank, p.offset));
}

/// Sorts `symbols` by bank, and then by offset. Names do not participate.
pub fn sort_symbols(symbols: &mut [Symbol]) {
  symbols.sort_by_key(|s| (s.bank, s.offset));
}

/// Sums up the bytes used by each bank in `sorted`, which must be sorted with
/// `sort_placements()`.
///
/// Bytes covered by more than one placement are only counted once. Coverage
/// is tracked as the running maximum end, not the previous placement's end, so
/// a placement nested inside an earlier one never recounts bytes.
pub fn bank_totals(sorted: &[Placement]) -> Vec<BankTotal> {
  let mut totals = Vec::new();
  let mut current: Option<BankTotal> = None;
  let mut covered_to = 0u32;
  for p in sorted {
    let mut total = match current {
      Some(total) if total.bank == p.bank => total,
      prev => {
        totals.extend(prev);
        covered_to = 0;
        BankTotal {
          bank: p.bank,
          bytes: 0,
        }
      }
    };

    let start = p.offset as u32;
    let end = p.end();
    if start > covered_to {
      total.bytes += p.len as u32;
    } else if end > covered_to {
      total.bytes += end - covered_to;
    }
    covered_to = covered_to.max(end);
    current = Some(total);
  }
  totals.extend(current);
  totals
}

/// The records of an ISX file, sorted into regions.
#[derive(Clone, Debug, Default)]
pub struct Layout {
  rom: Vec<Placement>,
  sram: Vec<Placement>,
  ram: Vec<Placement>,
  bogus: Vec<Placement>,
  symbols: Vec<Symbol>,
  max_bank: u8,
}

impl Layout {
  /// Creates a new, empty `Layout`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Scans every record of `isx`, building its `Layout`.
  pub fn scan(isx: &Isx) -> Result<Self, isx::Error> {
    let mut layout = Self::new();
    let mut payload = 0usize;
    for record in isx.records() {
      match record? {
        (_, Record::Code(code)) => {
          payload += code.len as usize;
          layout.push(code);
        }
        (_, Record::Symbols(symbols)) => layout.symbols.extend(symbols),
        (_, Record::Range { .. }) | (_, Record::Debug { .. }) => {}
      }
    }

    info!(
      "scanned {} payload bytes: {} ROM, {} SRAM, {} RAM, {} bogus placements",
      payload,
      layout.rom.len(),
      layout.sram.len(),
      layout.ram.len(),
      layout.bogus.len()
    );
    Ok(layout)
  }

  /// Classifies `record` and adds it to the appropriate region.
  pub fn push(&mut self, record: CodeRecord) {
    let classified = classify(record);
    if classified.region == Region::Rom {
      for p in classified.placements() {
        self.max_bank = self.max_bank.max(p.bank);
      }
    }

    let region = match classified.region {
      Region::Rom => &mut self.rom,
      Region::Sram => &mut self.sram,
      Region::Ram => &mut self.ram,
      Region::Bogus => &mut self.bogus,
    };
    region.extend(classified.placements());
  }

  /// Returns the placements in `region`, in the order they were found.
  pub fn region(&self, region: Region) -> &[Placement] {
    match region {
      Region::Rom => &self.rom,
      Region::Sram => &self.sram,
      Region::Ram => &self.ram,
      Region::Bogus => &self.bogus,
    }
  }

  /// Returns the placements in `region`, sorted with `sort_placements()`.
  pub fn sorted(&self, region: Region) -> Vec<Placement> {
    let mut placements = self.region(region).to_vec();
    sort_placements(&mut placements);
    placements
  }

  /// Returns the global symbols found in the file, in the order they were
  /// found.
  pub fn symbols(&self) -> &[Symbol] {
    &self.symbols
  }

  /// Returns the global symbols, sorted with `sort_symbols()`.
  pub fn sorted_symbols(&self) -> Vec<Symbol> {
    let mut symbols = self.symbols.clone();
    sort_symbols(&mut symbols);
    symbols
  }

  /// Returns the number of ROM banks in use, which is one more than the
  /// highest bank any ROM placement lands in.
  pub fn bank_count(&self) -> usize {
    self.max_bank as usize + 1
  }

  /// Returns an iterator over all overflowing placements, in every region.
  pub fn overflows(&self) -> impl Iterator<Item = (Region, &Placement)> + '_ {
    Region::ALL.iter().flat_map(move |&region| {
      self
        .region(region)
        .iter()
        .filter(|p| p.status == Status::Overflow)
        .map(move |p| (region, p))
    })
  }

  /// Builds the serializable summary of this layout.
  pub fn metadata(&self) -> Metadata {
    Metadata {
      banks: self.bank_count(),
      rom: self.sorted(Region::Rom),
      sram: self.sorted(Region::Sram),
      ram: self.sorted(Region::Ram),
      bogus: self.sorted(Region::Bogus),
      symbols: self.sorted_symbols(),
    }
  }
}

/// A serializable summary of a [`Layout`], for consumption by other tools.
///
/// [`Layout`]: struct.Layout.html
#[derive(Clone, Debug, Serialize)]
pub struct Metadata {
  /// The number of ROM banks in use.
  pub banks: usize,
  /// Sorted ROM placements.
  pub rom: Vec<Placement>,
  /// Sorted SRAM placements.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub sram: Vec<Placement>,
  /// Sorted RAM placements.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub ram: Vec<Placement>,
  /// Sorted bogus placements.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub bogus: Vec<Placement>,
  /// Sorted global symbols.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub symbols: Vec<Symbol>,
}

impl Metadata {
  /// Serializes this summary as JSON5 text.
  pub fn to_json5(&self) -> Result<String, json5::Error> {
    json5::to_string(self)
  }
}
