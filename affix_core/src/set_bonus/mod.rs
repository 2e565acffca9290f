//! Set bonuses: definitions, catalog and the equipment-driven tracker

mod definition;
mod tracker;

pub use definition::{SetBonusThreshold, SetCatalog, SetDefinition, SET_SOURCE_TYPE};
pub use tracker::{SetBonusChanged, SetBonusTracker};
