//! Riskcut math utilities.

pub mod math;

pub use math::grid::*;
pub use math::linalg::*;
pub use math::stable::*;
pub use math::stats::*;
