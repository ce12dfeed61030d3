//! Services module - the decision and reconciliation engine.
//!
//! # Components
//!
//! - [`path_classifier`]: Recognizes `<root>FFXIV_CHR<cid>/<file>` save paths and
//!   filters out files that must never be shared
//! - [`redirect`]: Decides which save files follow the main character and rewrites
//!   intercepted paths ([`FileRedirector`]), with a boot-time [`SafeMode`]
//! - [`gearset_file`]: Decodes the obfuscated, fixed-record `GEARSET.DAT` format
//! - [`reconcile`]: Renumbers the live gearset table to match the main character
//!   through the [`GearsetStore`] abstraction
//! - [`backup`]: Rotating copies of every character's DAT files
//! - [`plugin`]: [`CharacterSync`], the entry points the host calls
//!
//! # Flow
//!
//! Every file the game opens goes through the classifier and the redirect
//! policy, and is rewritten when a shared file belongs to another character.
//! Independently, once per login, the main character's `GEARSET.DAT` is
//! decoded and the live gearset table is reconciled against it.
//!
//! Nothing here writes game files: redirection only changes which file the game
//! opens, and reconciliation only mutates the in-memory table.

pub mod backup;
pub mod gearset_file;
pub mod path_classifier;
pub mod plugin;
pub mod reconcile;
pub mod redirect;

pub use backup::{BackupService, BackupSummary};
pub use gearset_file::{GearsetError, read_gearsets, read_gearsets_from};
pub use path_classifier::{CharacterSaveIdentity, classify};
pub use plugin::{BootContext, CharacterSync, CommandOutcome};
pub use reconcile::{
    GearsetMatch, GearsetStore, GearsetTable, MatchKind, ReconcileError, ReconcileReport,
    StoreError, compatible_job, reconcile,
};
pub use redirect::{
    FileRedirector, LoadReason, RedirectDecision, SafeMode, SyncedFile, redirect_target,
    should_redirect,
};
