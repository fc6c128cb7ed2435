//! Data models for the CropLink directory.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod distributor;
mod farmer;
mod record;

pub use distributor::*;
pub use farmer::*;
pub use record::*;
