//! 802.11 Frame Parsing
//!
//! This module provides parsing for IEEE 802.11 management and data frames.

mod data;
mod elements;
mod frame;
mod management;
mod rsn;
mod suites;

pub use data::*;
pub use elements::*;
pub use frame::*;
pub use management::*;
pub use rsn::*;
pub use suites::*;
