//! Core math modules.

pub mod gamma;
pub mod ks;
pub mod normal;
pub mod stable;
pub mod summary;
pub mod wasserstein;
