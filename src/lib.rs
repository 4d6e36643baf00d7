#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

mod error;

pub mod config;
pub mod device;
pub mod interface;
pub mod params;
pub mod registers;

#[cfg(test)]
mod sim;

pub use crate::device::{Adns5020, SessionState};
pub use crate::error::{Error, Result};
