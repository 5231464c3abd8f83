//! Persistence seam
//!
//! The core applies every change to its [`RegionIndex`] first and queues the
//! matching storage operation in an [`Outbox`]. The owner flushes the outbox
//! into any [`RegionStore`] when it is idle; failures mark the region as
//! failed without undoing the change.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::model::{ExerciseId, Region, RegionId};
use crate::region_index::RegionIndex;

/// Storage backend for regions.
///
/// Implementations include the JSON file store of the terminal front-end and
/// [`MemoryStore`] for tests.
pub trait RegionStore {
    fn create_region(&mut self, region: &Region) -> Result<(), StoreError>;

    fn update_region(&mut self, region: &Region) -> Result<(), StoreError>;

    /// Delete a region; `StoreError::NotFound` when it was never stored
    fn delete_region(&mut self, id: RegionId) -> Result<(), StoreError>;

    /// Every stored region of one exercise, in insertion order
    fn list_regions(&self, owner_id: ExerciseId) -> Result<Vec<Region>, StoreError>;
}

/// In-memory store, with a switch to make every write fail
#[derive(Debug, Default)]
pub struct MemoryStore {
    regions: Vec<Region>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions(regions: Vec<Region>) -> Self {
        Self {
            regions,
            ..Self::default()
        }
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Other("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl RegionStore for MemoryStore {
    fn create_region(&mut self, region: &Region) -> Result<(), StoreError> {
        self.check_writable()?;
        self.regions.retain(|r| r.id != region.id);
        self.regions.push(region.clone());
        self.writes += 1;
        Ok(())
    }

    fn update_region(&mut self, region: &Region) -> Result<(), StoreError> {
        self.check_writable()?;
        let slot = self
            .regions
            .iter_mut()
            .find(|r| r.id == region.id)
            .ok_or(StoreError::NotFound(region.id))?;
        *slot = region.clone();
        self.writes += 1;
        Ok(())
    }

    fn delete_region(&mut self, id: RegionId) -> Result<(), StoreError> {
        self.check_writable()?;
        let before = self.regions.len();
        self.regions.retain(|r| r.id != id);
        if self.regions.len() == before {
            return Err(StoreError::NotFound(id));
        }
        self.writes += 1;
        Ok(())
    }

    fn list_regions(&self, owner_id: ExerciseId) -> Result<Vec<Region>, StoreError> {
        Ok(self
            .regions
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistOp {
    Create(RegionId),
    Update(RegionId),
    Delete(RegionId),
}

impl PersistOp {
    pub fn region(&self) -> RegionId {
        match self {
            PersistOp::Create(id) | PersistOp::Update(id) | PersistOp::Delete(id) => *id,
        }
    }
}

/// Result of one flush
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub saved: usize,
    pub failed: Vec<RegionId>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Queue of storage operations waiting to be written.
///
/// Operations only carry ids. The region itself is read from the index at
/// flush time, so a region edited twice is written in its latest state and a
/// region deleted before the flush is never created.
///
/// A delete that fails is kept aside, since its region is already gone from
/// the index and cannot be marked there.
#[derive(Debug, Default, Clone)]
pub struct Outbox {
    ops: Vec<PersistOp>,
    failed_deletes: Vec<RegionId>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: PersistOp) {
        if !self.ops.contains(&op) {
            self.ops.push(op);
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn pending(&self) -> &[PersistOp] {
        &self.ops
    }

    /// Drop queued operations. Failed deletes are kept for a retry.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Deletes whose last attempt did not reach storage
    pub fn failed_deletes(&self) -> &[RegionId] {
        &self.failed_deletes
    }

    /// Queue every failed delete again; returns how many were queued
    pub fn requeue_failed_deletes(&mut self) -> usize {
        let failed = std::mem::take(&mut self.failed_deletes);
        for id in &failed {
            self.push(PersistOp::Delete(*id));
        }
        failed.len()
    }

    pub fn flush(&mut self, index: &mut RegionIndex, store: &mut dyn RegionStore) -> FlushReport {
        let mut report = FlushReport::default();
        let mut outcome: HashMap<RegionId, bool> = HashMap::new();

        for op in self.ops.drain(..) {
            let result = match op {
                PersistOp::Create(id) => match index.get(id) {
                    Some(region) => store.create_region(region),
                    None => continue,
                },
                PersistOp::Update(id) => match index.get(id) {
                    Some(region) => store.update_region(region),
                    None => continue,
                },
                PersistOp::Delete(id) => match store.delete_region(id) {
                    Err(StoreError::NotFound(_)) => Ok(()),
                    other => other,
                },
            };

            let id = op.region();
            match result {
                Ok(()) => {
                    report.saved += 1;
                    outcome.entry(id).or_insert(true);
                }
                Err(e) => {
                    tracing::warn!("failed to persist {:?}: {}", op, e);
                    if matches!(op, PersistOp::Delete(_)) && !self.failed_deletes.contains(&id) {
                        self.failed_deletes.push(id);
                    }
                    outcome.insert(id, false);
                }
            }
        }

        for (id, ok) in outcome {
            if ok {
                index.mark_saved(id);
            } else {
                index.mark_save_failed(id);
                report.failed.push(id);
            }
        }

        report
    }
}
