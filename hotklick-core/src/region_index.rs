//! The set of regions of the open exercise

use uuid::Uuid;

use crate::error::RegionError;
use crate::model::{ExerciseId, Point, Region, RegionId, RegionPatch, SaveState};
use crate::settings::RadiusSettings;

const FIRST_LABEL: &str = "A1";

/// Owns every region of exactly one exercise, in insertion order
#[derive(Debug, Clone)]
pub struct RegionIndex {
    owner_id: ExerciseId,
    radius: RadiusSettings,
    regions: Vec<Region>,
}

impl RegionIndex {
    pub fn new(owner_id: ExerciseId, radius: RadiusSettings) -> Self {
        Self {
            owner_id,
            radius,
            regions: Vec::new(),
        }
    }

    /// Index with no exercise attached
    pub fn detached(radius: RadiusSettings) -> Self {
        Self::new(Uuid::nil(), radius)
    }

    pub fn owner_id(&self) -> ExerciseId {
        self.owner_id
    }

    /// Replace the whole set with stored regions of another exercise.
    /// Regions owned by a different exercise are dropped; the rest count as
    /// saved.
    pub fn load(&mut self, owner_id: ExerciseId, regions: Vec<Region>) {
        let total = regions.len();
        self.owner_id = owner_id;
        self.regions = regions
            .into_iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|mut r| {
                r.set_radius(self.radius.clamp(r.radius()));
                r.set_save_state(SaveState::Saved);
                r
            })
            .collect();

        if self.regions.len() != total {
            tracing::warn!(
                "dropped {} regions not owned by exercise {}",
                total - self.regions.len(),
                owner_id
            );
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// First region, in insertion order, whose circle contains `point`.
    /// Overlaps go to the older region, not the nearest center.
    pub fn hit_test(&self, point: Point) -> Option<&Region> {
        self.regions.iter().find(|r| r.contains(point))
    }

    /// Add a region. The radius is clamped into the configured bounds and a
    /// label is generated when none is given.
    pub fn create(
        &mut self,
        center: Point,
        radius: u32,
        label: Option<String>,
    ) -> Result<&Region, RegionError> {
        let label = match label.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()) {
            Some(label) => label,
            None => self.generate_next_label()?,
        };

        let region = Region::new(self.owner_id, center, self.radius.clamp(radius), label);
        tracing::info!(
            "created region {} at ({}, {}) r={}",
            region.label(),
            region.center.x,
            region.center.y,
            region.radius()
        );
        self.regions.push(region);
        Ok(&self.regions[self.regions.len() - 1])
    }

    /// Remove a region; absent ids are a no-op
    pub fn remove(&mut self, id: RegionId) -> Option<Region> {
        let pos = self.regions.iter().position(|r| r.id == id)?;
        let region = self.regions.remove(pos);
        tracing::info!("removed region {}", region.label());
        Some(region)
    }

    pub fn update(&mut self, id: RegionId, patch: RegionPatch) -> Result<&Region, RegionError> {
        let region = self.get_mut(id)?;
        region.apply(patch);
        region.set_save_state(SaveState::Pending);
        Ok(&*region)
    }

    /// Next free label in the `A1..A9, B1..B9, ..` sequence.
    ///
    /// Based on the lexicographically greatest label, which only orders
    /// correctly while every label has a single digit. Falls back to `A1`
    /// when the index is empty or that label does not parse.
    pub fn generate_next_label(&self) -> Result<String, RegionError> {
        let Some(last) = self.regions.iter().map(|r| r.label()).max() else {
            return Ok(FIRST_LABEL.to_string());
        };

        let Some((letter, number)) = parse_label(last) else {
            return Ok(FIRST_LABEL.to_string());
        };

        let number = number + 1;
        if number <= 9 {
            return Ok(format!("{letter}{number}"));
        }

        if letter == 'Z' {
            return Err(RegionError::LabelSpaceExhausted {
                last: last.to_string(),
            });
        }
        let next = char::from(letter as u8 + 1);
        Ok(format!("{next}1"))
    }

    pub fn mark_save_failed(&mut self, id: RegionId) -> bool {
        self.set_save_state(id, SaveState::Failed)
    }

    pub fn mark_saved(&mut self, id: RegionId) -> bool {
        self.set_save_state(id, SaveState::Saved)
    }

    /// Regions whose last save did not reach storage
    pub fn failed_saves(&self) -> impl Iterator<Item = &Region> {
        self.regions
            .iter()
            .filter(|r| r.save_state() == SaveState::Failed)
    }

    fn set_save_state(&mut self, id: RegionId, state: SaveState) -> bool {
        match self.get_mut(id) {
            Ok(region) => {
                region.set_save_state(state);
                true
            }
            Err(_) => false,
        }
    }

    fn get_mut(&mut self, id: RegionId) -> Result<&mut Region, RegionError> {
        self.regions
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RegionError::NotFound(id))
    }
}

/// Split `B7` into `('B', 7)`
fn parse_label(label: &str) -> Option<(char, u32)> {
    let mut chars = label.chars();
    let letter = chars.next().filter(|c| c.is_ascii_uppercase())?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let number = digits.parse().ok()?;
    Some((letter, number))
}
