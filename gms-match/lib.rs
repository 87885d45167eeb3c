//! Descriptor matching for the GMS demo.
//!
//! [`BruteForceMatcher`] proposes one candidate per query descriptor and
//! [`match_gms`] keeps the candidates supported by their grid neighbourhood.

pub mod bf;
pub mod error;
pub mod gms;

pub use bf::BruteForceMatcher;
pub use error::{GmsError, GmsResult};
pub use gms::{match_gms, GmsMatcher, THRESHOLD_FACTOR};
