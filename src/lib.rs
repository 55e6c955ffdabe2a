//! isx2gb, a converter from Intelligent Systems eXecutables to Game Boy ROMs.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod int;
pub mod isx;
pub mod layout;
pub mod link;
pub mod rom;
pub mod sym;

#[cfg(test)]
pub(crate) mod testing;
