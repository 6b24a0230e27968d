use thiserror::Error;

/// Fixed banner text for rejected form input.
pub const INVALID_INPUT_MSG: &str = "Inputs have to be positive numbers!";
/// Banner text when delete/clear is attempted during an edit.
pub const EDIT_IN_PROGRESS_MSG: &str = "Workout is currently edited";
/// Alert text when no position fix could be obtained.
pub const NO_POSITION_MSG: &str = "Could not get your position";

#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("{}", INVALID_INPUT_MSG)]
    InvalidInput,

    #[error("{}", EDIT_IN_PROGRESS_MSG)]
    EditInProgress,

    #[error("no workout with id {0}")]
    UnknownWorkout(String),

    #[error("a workout with id {0} already exists")]
    DuplicateId(String),

    #[error("no edit form is open")]
    NoEditSession,

    #[error("pick a location on the map first")]
    NoMapClick,

    #[error("map is not available until a position is known")]
    MapUnavailable,

    #[error("storage: {0}")]
    Storage(String),

    #[error("encoding workouts: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T, E = WorkoutError> = std::result::Result<T, E>;
