//! Data models for CharacterSync.
//!
//! - [`GearsetInfo`]: Immutable summary of one gearset (slot id, job, name)
//! - [`GearsetName`]: Raw gearset name bytes, compared for equality only
//! - [`GearsetSlot`]: One position of a live gearset table, possibly empty
//! - [`SyncConfig`]: Main character and per-file sync switches from `CharacterSync.yaml`
//! - [`GearsetLayout`]: Binary layout constants of `GEARSET.DAT`, overridable from config

pub mod config;
pub mod gearset;

pub use config::{GearsetLayout, SyncConfig, SyncFlags};
pub use gearset::{GearsetInfo, GearsetName, GearsetSlot};
