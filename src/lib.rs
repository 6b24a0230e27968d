pub mod cli;
pub mod error;
pub mod kv;
pub mod render;
pub mod store;
pub mod types;
pub mod utils;
pub mod view;

pub use error::{Result, WorkoutError};
pub use kv::{KeyValueSlot, MemorySlot, SqliteSlot};
pub use store::{SortDirection, SortKey, WorkoutStore};
pub use types::{Coords, KindInput, Workout, WorkoutForm, WorkoutKind, WorkoutRecord};
pub use view::Coordinator;
