//! Robustness auditor math utilities.

pub mod math;

pub use math::gamma::*;
pub use math::ks::*;
pub use math::normal::*;
pub use math::stable::*;
pub use math::summary::*;
pub use math::wasserstein::*;
