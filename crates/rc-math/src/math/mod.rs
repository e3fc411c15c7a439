//! Core math modules.

pub mod grid;
pub mod linalg;
pub mod stable;
pub mod stats;
