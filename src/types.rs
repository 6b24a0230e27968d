use chrono::{DateTime, Datelike, Local, Utc};
use crate::error::WorkoutError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// `(latitude, longitude)` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            other => Err(format!("unknown workout kind: {other:?}")),
        }
    }
}

/// What the user typed for the kind-specific field, before any derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KindInput {
    Running { cadence_spm: f64 },
    Cycling { elevation_gain_m: f64 },
}

impl KindInput {
    pub const fn kind(self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// Kind-specific payload with its derived metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metrics {
    Running { cadence_spm: f64, pace_min_per_km: f64 },
    Cycling { elevation_gain_m: f64, speed_kmh: f64 },
}

impl Metrics {
    fn derive(input: KindInput, distance_km: f64, duration_min: f64) -> Self {
        match input {
            KindInput::Running { cadence_spm } => Self::Running {
                cadence_spm,
                pace_min_per_km: duration_min / distance_km,
            },
            KindInput::Cycling { elevation_gain_m } => Self::Cycling {
                elevation_gain_m,
                speed_kmh: distance_km / (duration_min / 60.0),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: String,
    created_at: DateTime<Utc>,
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    description: String,
    clicks: u32,
    metrics: Metrics,
}

impl Workout {
    /// Builds a workout and derives pace/speed and the description.
    ///
    /// Inputs are trusted; validation belongs to the caller.
    pub fn create(
        input: KindInput,
        id: impl Into<String>,
        created_at: DateTime<Utc>,
        coords: Coords,
        distance_km: f64,
        duration_min: f64,
    ) -> Self {
        let kind = input.kind();
        Self {
            id: id.into(),
            created_at,
            coords,
            distance_km,
            duration_min,
            description: Self::description_for(kind, created_at),
            clicks: 0,
            metrics: Metrics::derive(input, distance_km, duration_min),
        }
    }

    /// `"Running on April 14"`, using the local calendar day.
    pub fn description_for(kind: WorkoutKind, created_at: DateTime<Utc>) -> String {
        let local = created_at.with_timezone(&Local);
        let month = MONTHS[local.month0() as usize];
        format!("{} on {month} {}", kind.label(), local.day())
    }

    pub fn register_interaction(&mut self) {
        self.clicks = self.clicks.saturating_add(1);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn clicks(&self) -> u32 {
        self.clicks
    }

    pub(crate) fn with_clicks(mut self, clicks: u32) -> Self {
        self.clicks = clicks;
        self
    }

    pub const fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self.metrics {
            Metrics::Running { .. } => WorkoutKind::Running,
            Metrics::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    /// The input that would rebuild this workout's payload.
    pub const fn kind_input(&self) -> KindInput {
        match self.metrics {
            Metrics::Running { cadence_spm, .. } => KindInput::Running { cadence_spm },
            Metrics::Cycling {
                elevation_gain_m, ..
            } => KindInput::Cycling { elevation_gain_m },
        }
    }

    pub const fn pace(&self) -> Option<f64> {
        match self.metrics {
            Metrics::Running {
                pace_min_per_km, ..
            } => Some(pace_min_per_km),
            Metrics::Cycling { .. } => None,
        }
    }

    pub const fn speed(&self) -> Option<f64> {
        match self.metrics {
            Metrics::Cycling { speed_kmh, .. } => Some(speed_kmh),
            Metrics::Running { .. } => None,
        }
    }

    pub const fn cadence(&self) -> Option<f64> {
        match self.metrics {
            Metrics::Running { cadence_spm, .. } => Some(cadence_spm),
            Metrics::Cycling { .. } => None,
        }
    }

    pub const fn elevation_gain(&self) -> Option<f64> {
        match self.metrics {
            Metrics::Cycling {
                elevation_gain_m, ..
            } => Some(elevation_gain_m),
            Metrics::Running { .. } => None,
        }
    }

    /// Pace for running, speed for cycling.
    pub const fn derived_metric(&self) -> f64 {
        match self.metrics {
            Metrics::Running {
                pace_min_per_km, ..
            } => pace_min_per_km,
            Metrics::Cycling { speed_kmh, .. } => speed_kmh,
        }
    }
}

/// Raw numbers from an add or edit form.
///
/// A missing kind-specific value is treated as not a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutForm {
    pub kind: WorkoutKind,
    pub distance: f64,
    pub duration: f64,
    pub cadence: Option<f64>,
    pub elevation: Option<f64>,
}

impl WorkoutForm {
    /// Prefilled values for editing `w`.
    pub const fn from_workout(w: &Workout) -> Self {
        Self {
            kind: w.kind(),
            distance: w.distance_km,
            duration: w.duration_min,
            cadence: w.cadence(),
            elevation: w.elevation_gain(),
        }
    }

    /// Applies the input rules shared by add, edit and reload.
    ///
    /// Distance and duration must be finite and positive. Cadence must be
    /// finite and positive. Elevation only has to be finite.
    pub fn validate(&self) -> Result<KindInput, WorkoutError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.distance) || !positive(self.duration) {
            return Err(WorkoutError::InvalidInput);
        }
        match self.kind {
            WorkoutKind::Running => match self.cadence {
                Some(cadence_spm) if positive(cadence_spm) => {
                    Ok(KindInput::Running { cadence_spm })
                }
                _ => Err(WorkoutError::InvalidInput),
            },
            WorkoutKind::Cycling => match self.elevation {
                Some(elevation_gain_m) if elevation_gain_m.is_finite() => {
                    Ok(KindInput::Cycling { elevation_gain_m })
                }
                _ => Err(WorkoutError::InvalidInput),
            },
        }
    }
}

/// Persisted shape of one workout.
///
/// Also reads the field names `type` and `date` written by older builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: String,
    #[serde(alias = "date")]
    pub created_at: DateTime<Utc>,
    pub coords: Coords,
    pub distance: f64,
    pub duration: f64,
    #[serde(alias = "type")]
    pub kind: WorkoutKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub clicks: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl From<&Workout> for WorkoutRecord {
    fn from(w: &Workout) -> Self {
        Self {
            id: w.id.clone(),
            created_at: w.created_at,
            coords: w.coords,
            distance: w.distance_km,
            duration: w.duration_min,
            kind: w.kind(),
            description: w.description.clone(),
            clicks: w.clicks,
            cadence: w.cadence(),
            pace: w.pace(),
            elevation_gain: w.elevation_gain(),
            speed: w.speed(),
        }
    }
}

impl WorkoutRecord {
    /// Rebuilds the workout through the same path as a fresh one.
    ///
    /// Stored `pace`, `speed` and `description` are ignored and derived again.
    pub fn into_workout(self) -> Result<Workout, WorkoutError> {
        let form = WorkoutForm {
            kind: self.kind,
            distance: self.distance,
            duration: self.duration,
            cadence: self.cadence,
            elevation: self.elevation_gain,
        };
        let input = form.validate()?;
        Ok(Workout::create(
            input,
            self.id,
            self.created_at,
            self.coords,
            self.distance,
            self.duration,
        )
        .with_clicks(self.clicks))
    }
}
