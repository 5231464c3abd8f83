//! Hotklick Core - Platform-agnostic image hotspot library
//!
//! This crate provides the core data structures and logic for Hotklick:
//! circular regions annotated on an exercise image, gesture classification,
//! and the edit, practice and quiz modes built on top. Nothing here touches
//! the terminal or the filesystem; front-ends drive it with pointer events
//! and a clock.

pub mod app;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod feedback;
pub mod gesture;
pub mod model;
pub mod quiz;
pub mod region_index;
pub mod settings;
pub mod store;

pub use app::{App, HighlightFrame, RenderRequest};
pub use clock::{Clock, ManualClock, SystemClock, Timer};
pub use dispatch::{Effect, Mode, ModeDispatcher};
pub use error::{QuizError, RegionError, StoreError};
pub use feedback::{find_links, HighlightFeedback, Link, RevealBox, Revealed};
pub use gesture::{Gesture, GestureClassifier, PointerEvent};
pub use model::{
    AudioRef, ContentKind, Exercise, ExerciseId, Point, Region, RegionId, RegionPatch, SaveState,
};
pub use quiz::{AnswerOutcome, ContentMode, QuizSession, QuizSummary, TaskPrompt};
pub use region_index::RegionIndex;
pub use settings::Settings;
pub use store::{FlushReport, MemoryStore, Outbox, PersistOp, RegionStore};
