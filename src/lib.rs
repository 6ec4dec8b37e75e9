//! BNX2FW, a tool for pulling NetXtreme II NIC firmware out of Option ROM
//! images and turning it into tables a driver can embed.

#![deny(missing_docs)]
#![deny(unused)]
#![deny(warnings)]
#![deny(unsafe_code)]

pub mod config;
pub mod direct;
pub mod error;
pub mod extract;
pub mod firmware;
pub mod header;
pub mod mips;
pub mod pattern;
pub mod rom;
pub mod rv2p;
pub mod table;

#[cfg(test)]
mod testing;

pub use extract::extract;
pub use extract::Tables;
