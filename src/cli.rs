use crate::store::{SortDirection, SortKey};
use crate::types::{Coords, WorkoutKind};
use crate::utils::parse_coords;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB: &str = "workouts.sqlite";
const DEFAULT_HOME: &str = "39,-12";

#[derive(Parser, Debug)]
#[command(
    name = "workout-log",
    about = "Keep a log of running and cycling workouts pinned to map locations"
)]
pub struct Cli {
    /// SQLite file holding the persisted workouts.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DB, global = true)]
    pub db: PathBuf,

    /// Current position used to center the map.
    #[arg(
        long,
        value_name = "LAT,LON",
        default_value = DEFAULT_HOME,
        value_parser = parse_coords,
        allow_hyphen_values = true,
        global = true
    )]
    pub home: Coords,

    /// Behave as if no position fix could be obtained.
    #[arg(long, global = true)]
    pub no_position: bool,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Log a new workout at a map location.
    Add {
        #[arg(value_parser = parse_kind)]
        kind: WorkoutKind,

        /// Where the workout took place.
        #[arg(long, value_name = "LAT,LON", value_parser = parse_coords, allow_hyphen_values = true)]
        at: Coords,

        #[command(flatten)]
        metrics: MetricArgs,
    },

    /// Replace the metrics of a logged workout. Location and id are kept.
    Edit {
        id: String,

        /// Switch the workout to another kind.
        #[arg(long, value_parser = parse_kind)]
        kind: Option<WorkoutKind>,

        #[command(flatten)]
        metrics: MetricArgs,
    },

    /// Delete one workout.
    Delete { id: String },

    /// Delete every workout.
    Clear,

    /// Print the workouts (default command).
    List(ListArgs),

    /// Center the map on a workout and count the visit.
    Show { id: String },

    /// Print the bounds covering every workout.
    Bounds,

    /// Print the persisted JSON.
    Export,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct MetricArgs {
    /// Distance in km.
    #[arg(long, allow_hyphen_values = true)]
    pub distance: f64,

    /// Duration in minutes.
    #[arg(long, allow_hyphen_values = true)]
    pub duration: f64,

    /// Cadence in steps per minute (running).
    #[arg(long, allow_hyphen_values = true)]
    pub cadence: Option<f64>,

    /// Elevation gain in meters (cycling).
    #[arg(long, allow_hyphen_values = true)]
    pub elevation: Option<f64>,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct ListArgs {
    /// Order by date, distance or duration. Stored order when omitted.
    #[arg(long, value_parser = parse_sort_key)]
    pub sort: Option<SortKey>,

    /// asc or desc.
    #[arg(long, value_parser = parse_direction, default_value = "asc")]
    pub dir: SortDirection,

    /// Print one line per workout with all fields.
    #[arg(long)]
    pub details: bool,
}

fn parse_kind(s: &str) -> Result<WorkoutKind, String> {
    s.parse()
}

fn parse_sort_key(s: &str) -> Result<SortKey, String> {
    s.parse()
}

fn parse_direction(s: &str) -> Result<SortDirection, String> {
    s.parse()
}
