//! Gearset slot reconciliation.
//!
//! Renumbers the logged-in character's gearsets so that each one sits in the
//! same slot as its counterpart on the main character. Counterparts are found
//! by name, then by job, then by the base/advanced version of the job.
//! Matching is first-come first-served in the main character's file order,
//! and a live gearset is matched at most once per run.

use crate::models::{GearsetInfo, GearsetLayout, GearsetSlot};
use crate::services::gearset_file::{self, GearsetError};
use camino::Utf8Path;
use std::fmt;
use thiserror::Error;

/// Errors raised by a [`GearsetStore`]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Gearset slot {id} is out of range (table holds {capacity})")]
    SlotOutOfRange { id: u8, capacity: usize },

    #[error("A gearset table of {capacity} slots does not fit 8-bit slot ids")]
    CapacityTooLarge { capacity: usize },

    #[error("Gearset table unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a reconciliation run
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Unable to load the main character's gearsets")]
    MainGearsets(#[from] GearsetError),

    #[error("Unable to update the gearset table")]
    Store(#[from] StoreError),
}

/// The live gearset table of the logged-in character.
///
/// Owned by the game: implementations only expose enumeration and a swap that
/// is applied as a whole or not at all.
#[cfg_attr(test, mockall::automock)]
pub trait GearsetStore {
    /// Every slot whose exists flag is set, in slot order.
    fn existing_gearsets(&self) -> Result<Vec<GearsetInfo>, StoreError>;

    /// Exchange the contents of two slots, then set each slot's id to its
    /// position.
    fn swap_gearsets(&mut self, id_a: u8, id_b: u8) -> Result<(), StoreError>;
}

/// Fixed-size gearset table held in memory.
///
/// Stands in for the game's table when planning from files on disk, and in
/// tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearsetTable {
    slots: Vec<GearsetSlot>,
}

impl GearsetTable {
    /// Largest table addressable with 8-bit slot ids
    pub const MAX_CAPACITY: usize = u8::MAX as usize + 1;

    /// Table of `capacity` empty slots.
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        if capacity > Self::MAX_CAPACITY {
            return Err(StoreError::CapacityTooLarge { capacity });
        }
        Ok(Self {
            slots: (0..=u8::MAX).take(capacity).map(GearsetSlot::empty).collect(),
        })
    }

    /// Table with the given gearsets placed at their slot ids.
    pub fn from_gearsets(
        capacity: usize,
        gearsets: impl IntoIterator<Item = GearsetInfo>,
    ) -> Result<Self, StoreError> {
        let mut table = Self::new(capacity)?;
        for gearset in gearsets {
            table.insert(gearset)?;
        }
        Ok(table)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Store a gearset at the slot matching its id, replacing what was there.
    pub fn insert(&mut self, gearset: GearsetInfo) -> Result<(), StoreError> {
        let index = self.index_of(gearset.id)?;
        self.slots[index] = GearsetSlot::from(gearset);
        Ok(())
    }

    pub fn slot(&self, id: u8) -> Option<&GearsetSlot> {
        self.slots.get(usize::from(id))
    }

    fn index_of(&self, id: u8) -> Result<usize, StoreError> {
        let index = usize::from(id);
        if index < self.slots.len() {
            Ok(index)
        } else {
            Err(StoreError::SlotOutOfRange {
                id,
                capacity: self.slots.len(),
            })
        }
    }
}

impl GearsetStore for GearsetTable {
    fn existing_gearsets(&self) -> Result<Vec<GearsetInfo>, StoreError> {
        Ok(self.slots.iter().filter_map(GearsetSlot::info).collect())
    }

    fn swap_gearsets(&mut self, id_a: u8, id_b: u8) -> Result<(), StoreError> {
        // Validate both ends before touching anything
        let a = self.index_of(id_a)?;
        let b = self.index_of(id_b)?;
        if a == b {
            return Ok(());
        }

        self.slots.swap(a, b);
        self.slots[a].id = id_a;
        self.slots[b].id = id_b;
        Ok(())
    }
}

/// The other tier of a base class or job.
///
/// Classes 1-7 (GLA, PGL, MRD, LNC, ARC, CNJ, THM) pair with jobs 19-25 (PLD,
/// MNK, WAR, DRG, BRD, WHM, BLM).
pub fn compatible_job(job_id: u8) -> Option<u8> {
    match job_id {
        1..=7 => Some(job_id + 18),
        19..=25 => Some(job_id - 18),
        _ => None,
    }
}

/// How a live gearset was paired with a main gearset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Name,
    Job,
    CompatibleJob,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Name => write!(f, "name"),
            MatchKind::Job => write!(f, "job"),
            MatchKind::CompatibleJob => write!(f, "compatible job"),
        }
    }
}

/// One main gearset and the live gearset it was paired with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GearsetMatch {
    /// Slot of the main character's gearset, where the live one ends up
    pub main_id: u8,
    /// Slot the live gearset occupied when it was matched
    pub alt_id: u8,
    pub kind: MatchKind,
}

impl GearsetMatch {
    pub fn needs_swap(&self) -> bool {
        self.main_id != self.alt_id
    }
}

/// Summary of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub matches: Vec<GearsetMatch>,
    /// Main gearsets with no counterpart
    pub unmatched: Vec<u8>,
}

impl ReconcileReport {
    pub fn swap_count(&self) -> usize {
        self.matches.iter().filter(|m| m.needs_swap()).count()
    }
}

/// Align the store's slot numbering with `main_gearsets`.
///
/// Swaps are applied one by one; if one fails, the run stops and the swaps
/// already applied stay in place.
pub fn reconcile<S>(main_gearsets: &[GearsetInfo], store: &mut S) -> Result<ReconcileReport, StoreError>
where
    S: GearsetStore + ?Sized,
{
    // Indexed by enumeration order. An entry becomes None once matched, and
    // its id follows the gearset when another swap moves it.
    let mut candidates: Vec<Option<GearsetInfo>> =
        store.existing_gearsets()?.into_iter().map(Some).collect();
    tracing::info!("Pre gearsets: {:?}", candidates);

    let mut report = ReconcileReport::default();

    for main in main_gearsets {
        tracing::info!("Looking for a match for {}", main);

        let Some((index, kind)) = find_candidate(&candidates, main) else {
            tracing::info!("No match found, ignoring it");
            report.unmatched.push(main.id);
            continue;
        };

        let Some(alt) = candidates[index].take() else {
            continue;
        };
        tracing::info!("Found match by {}: {}", kind, alt);

        let matched = GearsetMatch {
            main_id: main.id,
            alt_id: alt.id,
            kind,
        };

        if matched.needs_swap() {
            tracing::info!("Swapping gearsets {} and {}", alt.id, main.id);
            store.swap_gearsets(main.id, alt.id)?;

            // Whatever sat at main.id now lives where the matched gearset was
            if let Some(moved) = candidates
                .iter_mut()
                .flatten()
                .find(|candidate| candidate.id == main.id)
            {
                moved.id = alt.id;
            }
        }

        report.matches.push(matched);
    }

    tracing::info!("Post gearsets: {:?}", candidates);
    Ok(report)
}

/// Read the main character's gearset file, then [`reconcile`] the store against it.
///
/// Nothing is swapped when the file cannot be read.
pub fn reconcile_from_file<S>(
    main_file: &Utf8Path,
    layout: &GearsetLayout,
    store: &mut S,
) -> Result<ReconcileReport, ReconcileError>
where
    S: GearsetStore + ?Sized,
{
    let main_gearsets = gearset_file::read_gearsets(main_file, layout)?;
    tracing::info!("Main gearsets: {:?}", main_gearsets);

    Ok(reconcile(&main_gearsets, store)?)
}

/// First remaining candidate by name, then job, then compatible job.
fn find_candidate(candidates: &[Option<GearsetInfo>], main: &GearsetInfo) -> Option<(usize, MatchKind)> {
    if let Some(index) = select(candidates, main.id, |alt| alt.name == main.name) {
        return Some((index, MatchKind::Name));
    }
    if let Some(index) = select(candidates, main.id, |alt| alt.job_id == main.job_id) {
        return Some((index, MatchKind::Job));
    }

    let compatible = compatible_job(main.job_id)?;
    select(candidates, main.id, |alt| alt.job_id == compatible)
        .map(|index| (index, MatchKind::CompatibleJob))
}

/// Index of a remaining candidate satisfying `predicate`.
///
/// A candidate already sitting in slot `main_id` wins, otherwise the first in
/// enumeration order. Preferring the aligned one keeps a second run from
/// trading it for an identical gearset in a lower slot.
fn select(
    candidates: &[Option<GearsetInfo>],
    main_id: u8,
    predicate: impl Fn(&GearsetInfo) -> bool,
) -> Option<usize> {
    let mut first = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let Some(alt) = candidate else {
            continue;
        };
        if !predicate(alt) {
            continue;
        }
        if alt.id == main_id {
            return Some(index);
        }
        first.get_or_insert(index);
    }
    first
}
