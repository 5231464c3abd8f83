use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ExerciseId;

/// An image the user marks regions on
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub image_path: String,
    /// Image size in pixels, known once the image header has been read
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exercise {
    pub fn new(name: String, image_path: String, width: u32, height: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            image_path,
            width,
            height,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rename the exercise; blank names are rejected
    pub fn rename(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.name = name.to_string();
        self.updated_at = Utc::now();
        true
    }
}
