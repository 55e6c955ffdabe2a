//! Helpers for building synthetic ISX files in tests.

use crate::isx::HEADER_LEN;
use crate::isx::TAG_CODE;
use crate::isx::TAG_RANGE;
use crate::isx::TAG_SYMBOLS;

/// The Nintendo logo bitmap found at `$0104` of every licensed cartridge.
pub const NINTENDO_LOGO: [u8; 48] = [
  0xce, 0xed, 0x66, 0x66, 0xcc, 0x0d, 0x00, 0x0b, 0x03, 0x73, 0x00, 0x83,
  0x00, 0x0c, 0x00, 0x0d, 0x00, 0x08, 0x11, 0x1f, 0x88, 0x89, 0x00, 0x0e,
  0xdc, 0xcc, 0x6e, 0xe6, 0xdd, 0xdd, 0xd9, 0x99, 0xbb, 0xbb, 0x67, 0x63,
  0x6e, 0x0e, 0xec, 0xcc, 0xdd, 0xdc, 0x99, 0x9f, 0xbb, 0xb9, 0x33, 0x3e,
];

/// Builds the bytes of an ISX file, record by record.
pub struct IsxBuilder {
  bytes: Vec<u8>,
  symbols: Vec<u8>,
  symbol_count: u16,
}

impl IsxBuilder {
  pub fn new() -> Self {
    let mut bytes = b"ISX test image".to_vec();
    bytes.resize(HEADER_LEN, b' ');
    Self {
      bytes,
      symbols: Vec::new(),
      symbol_count: 0,
    }
  }

  pub fn code(mut self, bank: u8, offset: u16, payload: &[u8]) -> Self {
    self.bytes.push(TAG_CODE);
    self.bytes.push(bank);
    self.bytes.extend_from_slice(&offset.to_le_bytes());
    self.bytes.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    self.bytes.extend_from_slice(payload);
    self
  }

  /// Adds a code record holding the Nintendo logo at `$0104`.
  pub fn logo(self) -> Self {
    self.code(0, 0x0104, &NINTENDO_LOGO)
  }

  pub fn range(mut self, count: u16) -> Self {
    self.bytes.push(TAG_RANGE);
    self.bytes.extend_from_slice(&count.to_le_bytes());
    for i in 0..count as usize * 9 {
      self.bytes.push(i as u8);
    }
    self
  }

  /// Queues up a symbol entry; `flush_symbols()` emits them as one record.
  pub fn symbol(mut self, bank: u8, offset: u16, name: &str, flag: u16) -> Self {
    self.symbols.push(name.len() as u8);
    self.symbols.extend_from_slice(name.as_bytes());
    self.symbols.extend_from_slice(&flag.to_le_bytes());
    self.symbols.extend_from_slice(&offset.to_le_bytes());
    self.symbols.push(bank);
    self.symbols.push(0);
    self.symbol_count += 1;
    self
  }

  pub fn flush_symbols(mut self) -> Self {
    self.bytes.push(TAG_SYMBOLS);
    self.bytes.extend_from_slice(&self.symbol_count.to_le_bytes());
    self.bytes.append(&mut self.symbols);
    self.symbol_count = 0;
    self
  }

  pub fn debug(mut self, tag: u8, body: &[u8]) -> Self {
    self.bytes.push(tag);
    self.bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    self.bytes.extend_from_slice(body);
    self
  }

  pub fn raw(mut self, bytes: &[u8]) -> Self {
    self.bytes.extend_from_slice(bytes);
    self
  }

  pub fn build(self) -> Vec<u8> {
    self.bytes
  }
}
