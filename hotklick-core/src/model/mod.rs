pub mod exercise;
pub mod point;
pub mod region;

pub use exercise::Exercise;
pub use point::Point;
pub use region::{AudioRef, ContentKind, ExerciseId, Region, RegionId, RegionPatch, SaveState};
