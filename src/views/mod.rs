//! Derived views over the board state.
//!
//! Everything here is a pure function of its inputs and is recomputed on every
//! read; nothing is cached between calls.

mod filter;
mod layout;
mod quarters;

pub use filter::*;
pub use layout::*;
pub use quarters::*;
