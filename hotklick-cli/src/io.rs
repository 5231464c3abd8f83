//! File I/O for native CLI
//!
//! Everything lives under `~/.hotklick`:
//! - `settings.json`: optional overrides of the default settings
//! - `exercises.json`: every exercise ever opened
//! - `regions/<exercise-id>.json`: the regions of one exercise

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use hotklick_core::{Exercise, ExerciseId, Region, RegionId, RegionStore, Settings, StoreError};

use crate::ui::Preview;

const SETTINGS_FILE: &str = "settings.json";
const EXERCISES_FILE: &str = "exercises.json";
const REGIONS_DIR: &str = "regions";

/// Get the ~/.hotklick directory path, creating it if needed
pub fn hotklick_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    let dir = home.join(".hotklick");

    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    Ok(dir)
}

/// Load settings, falling back to defaults when the file is absent
pub fn load_settings(dir: &Path) -> Result<Settings> {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(Settings::default());
    }

    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn load_exercises(dir: &Path) -> Result<Vec<Exercise>> {
    let path = dir.join(EXERCISES_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn save_exercises(dir: &Path, exercises: &[Exercise]) -> Result<()> {
    let path = dir.join(EXERCISES_FILE);
    let json = serde_json::to_string_pretty(exercises).context("Failed to serialize exercises")?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Find the exercise for an image, or register a new one.
///
/// The image is only decoded far enough to read its dimensions.
pub fn open_exercise(dir: &Path, image: &str, name: Option<&str>) -> Result<Exercise> {
    let path = Path::new(image);
    let canonical = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", path.display()))?;
    let image_path = canonical.to_string_lossy().to_string();

    let mut exercises = load_exercises(dir)?;
    if let Some(existing) = exercises.iter_mut().find(|e| e.image_path == image_path) {
        if let Some(name) = name {
            if existing.rename(name) {
                let exercise = existing.clone();
                save_exercises(dir, &exercises)?;
                return Ok(exercise);
            }
        }
        return Ok(existing.clone());
    }

    let (width, height) = image::image_dimensions(&canonical)
        .with_context(|| format!("Failed to read image: {}", canonical.display()))?;
    let name = name.map(str::to_string).unwrap_or_else(|| {
        canonical
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string())
    });

    let exercise = Exercise::new(name, image_path, width, height);
    tracing::info!("registered exercise '{}' ({}x{})", exercise.name, width, height);
    exercises.push(exercise.clone());
    save_exercises(dir, &exercises)?;
    Ok(exercise)
}

/// Decode the exercise image into a preview no larger than `max_width` by
/// `max_height`
pub fn load_preview(exercise: &Exercise, max_width: u32, max_height: u32) -> Result<Preview> {
    let image = image::open(&exercise.image_path)
        .with_context(|| format!("Failed to decode image: {}", exercise.image_path))?;
    let thumbnail = image.thumbnail(max_width, max_height).to_rgb8();

    Ok(Preview {
        image_width: exercise.width,
        image_height: exercise.height,
        width: thumbnail.width(),
        height: thumbnail.height(),
        pixels: thumbnail.pixels().map(|p| p.0).collect(),
    })
}

/// Region storage with one JSON file per exercise
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(base: &Path) -> Result<Self> {
        let dir = base.join(REGIONS_DIR);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, owner_id: ExerciseId) -> PathBuf {
        self.dir.join(format!("{owner_id}.json"))
    }

    fn read(&self, owner_id: ExerciseId) -> Result<Vec<Region>, StoreError> {
        let path = self.path_for(owner_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, owner_id: ExerciseId, regions: &[Region]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(regions)?;
        fs::write(self.path_for(owner_id), json)?;
        Ok(())
    }

    /// Exercise whose file holds `id`
    fn owner_of(&self, id: RegionId) -> Result<Option<ExerciseId>, StoreError> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(owner) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<ExerciseId>().ok())
            else {
                continue;
            };
            if self.read(owner)?.iter().any(|r| r.id == id) {
                return Ok(Some(owner));
            }
        }
        Ok(None)
    }
}

impl RegionStore for JsonStore {
    fn create_region(&mut self, region: &Region) -> Result<(), StoreError> {
        let mut regions = self.read(region.owner_id)?;
        match regions.iter_mut().find(|r| r.id == region.id) {
            Some(slot) => *slot = region.clone(),
            None => regions.push(region.clone()),
        }
        self.write(region.owner_id, &regions)
    }

    fn update_region(&mut self, region: &Region) -> Result<(), StoreError> {
        let mut regions = self.read(region.owner_id)?;
        let slot = regions
            .iter_mut()
            .find(|r| r.id == region.id)
            .ok_or(StoreError::NotFound(region.id))?;
        *slot = region.clone();
        self.write(region.owner_id, &regions)
    }

    fn delete_region(&mut self, id: RegionId) -> Result<(), StoreError> {
        let owner = self.owner_of(id)?.ok_or(StoreError::NotFound(id))?;
        let mut regions = self.read(owner)?;
        regions.retain(|r| r.id != id);
        self.write(owner, &regions)
    }

    fn list_regions(&self, owner_id: ExerciseId) -> Result<Vec<Region>, StoreError> {
        self.read(owner_id)
    }
}
