use crate::types::{Coords, Workout, WorkoutKind};
use crate::view::{Banner, EditSession, ListView, MapView};
use std::collections::BTreeMap;
use std::fmt;

/// Popup text for a workout's map marker.
pub fn marker_popup(w: &Workout) -> String {
    format!("{} {}", w.kind().emoji(), w.description())
}

/// Content of one workout row in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub id: String,
    pub kind: WorkoutKind,
    pub title: String,
    pub distance: String,
    pub duration: String,
    /// Pace or speed, one decimal.
    pub metric: String,
    pub metric_unit: &'static str,
    /// Cadence or elevation gain.
    pub extra: String,
    pub extra_unit: &'static str,
}

impl From<&Workout> for ListEntry {
    fn from(w: &Workout) -> Self {
        let (metric_unit, extra, extra_unit) = match w.kind() {
            WorkoutKind::Running => ("min/km", w.cadence().unwrap_or_default(), "spm"),
            WorkoutKind::Cycling => ("km/h", w.elevation_gain().unwrap_or_default(), "m"),
        };
        Self {
            id: w.id().to_string(),
            kind: w.kind(),
            title: w.description().to_string(),
            distance: w.distance_km().to_string(),
            duration: w.duration_min().to_string(),
            metric: format!("{:.1}", w.derived_metric()),
            metric_unit,
            extra: extra.to_string(),
            extra_unit,
        }
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{} {} km\t⏱ {} min\t⚡️ {} {}\t{} {}\t[edit] [delete]",
            self.id,
            self.title,
            self.kind.emoji(),
            self.distance,
            self.duration,
            self.metric,
            self.metric_unit,
            self.extra,
            self.extra_unit,
        )
    }
}

/// Prefilled edit form; only the row for the workout's kind is visible.
#[derive(Debug, Clone, PartialEq)]
pub struct EditForm {
    pub workout_id: String,
    pub kind: WorkoutKind,
    pub distance: f64,
    pub duration: f64,
    pub cadence: Option<f64>,
    pub elevation: Option<f64>,
}

impl From<&EditSession> for EditForm {
    fn from(s: &EditSession) -> Self {
        Self {
            workout_id: s.workout_id.clone(),
            kind: s.values.kind,
            distance: s.values.distance,
            duration: s.values.duration,
            cadence: s.values.cadence,
            elevation: s.values.elevation,
        }
    }
}

/// Map stand-in that keeps markers in memory and logs requests.
#[derive(Debug, Default)]
pub struct TerminalMap {
    pub center: Option<(Coords, u8)>,
    pub markers: BTreeMap<String, (Coords, String)>,
    pub bounds: Option<Vec<Coords>>,
    pub add_form_open: bool,
}

impl MapView for TerminalMap {
    fn set_view(&mut self, center: Coords, zoom: u8) {
        tracing::debug!(%center, zoom, "map view");
        self.center = Some((center, zoom));
    }

    fn fit_bounds(&mut self, points: &[Coords]) {
        tracing::debug!(points = points.len(), "map fit bounds");
        self.bounds = Some(points.to_vec());
    }

    fn place_marker(&mut self, id: &str, at: Coords, popup: &str) {
        tracing::trace!(id, %at, popup, "marker placed");
        self.markers.insert(id.to_string(), (at, popup.to_string()));
    }

    fn remove_marker(&mut self, id: &str) {
        self.markers.remove(id);
    }

    fn show_add_form(&mut self) {
        self.add_form_open = true;
    }

    fn hide_add_form(&mut self) {
        self.add_form_open = false;
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// List stand-in; rows are printed by the caller once a command finishes.
#[derive(Debug, Default)]
pub struct TerminalList {
    pub entries: Vec<ListEntry>,
    pub edit_form: Option<EditForm>,
    pub visible_fields: Option<WorkoutKind>,
}

impl ListView for TerminalList {
    fn insert_entry(&mut self, entry: &ListEntry) {
        self.entries.retain(|e| e.id != entry.id);
        self.entries.push(entry.clone());
    }

    fn remove_entry(&mut self, id: &str) {
        self.entries.retain(|e| e.id != id);
    }

    fn clear_entries(&mut self) {
        self.entries.clear();
    }

    fn show_edit_form(&mut self, form: &EditForm) {
        self.edit_form = Some(form.clone());
    }

    fn hide_edit_form(&mut self) {
        self.edit_form = None;
    }

    fn show_kind_fields(&mut self, kind: WorkoutKind) {
        self.visible_fields = Some(kind);
    }
}

/// Error banner; the binary reports the message when the command fails.
#[derive(Debug, Default)]
pub struct TerminalBanner {
    pub message: Option<String>,
}

impl Banner for TerminalBanner {
    fn show(&mut self, message: &str) {
        tracing::debug!(message, "banner shown");
        self.message = Some(message.to_string());
    }

    fn hide(&mut self) {
        self.message = None;
    }

    fn is_shown(&self) -> bool {
        self.message.is_some()
    }
}
