//! Turns user intents into store operations and rendering requests.
//!
//! The map, list and banner are collaborators behind traits so the same
//! rules drive a browser page, a terminal or a test recorder.

use crate::dlog;
use crate::error::{
    EDIT_IN_PROGRESS_MSG, INVALID_INPUT_MSG, NO_POSITION_MSG, Result, WorkoutError,
};
use crate::kv::KeyValueSlot;
use crate::render::{EditForm, ListEntry, marker_popup};
use crate::store::{SortDirection, SortKey, WorkoutStore};
use crate::types::{Coords, KindInput, Workout, WorkoutForm, WorkoutKind};
use chrono::{DateTime, Utc};

pub const MAP_ZOOM: u8 = 13;

pub trait MapView {
    fn set_view(&mut self, center: Coords, zoom: u8);
    fn fit_bounds(&mut self, points: &[Coords]);
    fn place_marker(&mut self, id: &str, at: Coords, popup: &str);
    fn remove_marker(&mut self, id: &str);
    fn show_add_form(&mut self);
    fn hide_add_form(&mut self);
    /// Blocking, user-visible notice.
    fn alert(&mut self, message: &str);
}

pub trait ListView {
    fn insert_entry(&mut self, entry: &ListEntry);
    fn remove_entry(&mut self, id: &str);
    fn clear_entries(&mut self);
    fn show_edit_form(&mut self, form: &EditForm);
    fn hide_edit_form(&mut self);
    /// Shows the cadence row for running, the elevation row for cycling.
    fn show_kind_fields(&mut self, kind: WorkoutKind);
}

pub trait Banner {
    fn show(&mut self, message: &str);
    fn hide(&mut self);
    fn is_shown(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapState {
    Locating,
    Ready(Coords),
    Unavailable,
}

/// The single open edit form, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub workout_id: String,
    pub values: WorkoutForm,
}

pub struct Coordinator<S, M, L, B> {
    store: WorkoutStore<S>,
    map: M,
    list: L,
    banner: B,
    map_state: MapState,
    pending_click: Option<Coords>,
    edit: Option<EditSession>,
}

impl<S, M, L, B> Coordinator<S, M, L, B>
where
    S: KeyValueSlot,
    M: MapView,
    L: ListView,
    B: Banner,
{
    pub const fn new(store: WorkoutStore<S>, map: M, list: L, banner: B) -> Self {
        Self {
            store,
            map,
            list,
            banner,
            map_state: MapState::Locating,
            pending_click: None,
            edit: None,
        }
    }

    pub const fn store(&self) -> &WorkoutStore<S> {
        &self.store
    }

    pub const fn map(&self) -> &M {
        &self.map
    }

    pub const fn list(&self) -> &L {
        &self.list
    }

    pub const fn banner(&self) -> &B {
        &self.banner
    }

    pub const fn map_state(&self) -> MapState {
        self.map_state
    }

    pub const fn edit_session(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub const fn pending_click(&self) -> Option<Coords> {
        self.pending_click
    }

    /// Loads persisted workouts and lists them.
    pub fn start(&mut self) -> Result<usize> {
        let n = self.store.load()?;
        for w in self.store.iter() {
            self.list.insert_entry(&ListEntry::from(w));
        }
        Ok(n)
    }

    /// First position fix: centers the map and pins every stored workout.
    pub fn position_acquired(&mut self, home: Coords) {
        if let MapState::Ready(_) = self.map_state {
            dlog!("ignoring extra position fix {home}");
            return;
        }
        tracing::info!(%home, "position acquired");
        self.map.set_view(home, MAP_ZOOM);
        self.map_state = MapState::Ready(home);
        for w in self.store.iter() {
            self.map.place_marker(w.id(), w.coords(), &marker_popup(w));
        }
    }

    pub fn position_failed(&mut self, reason: &str) {
        tracing::warn!(reason, "position unavailable");
        self.map_state = MapState::Unavailable;
        self.map.alert(NO_POSITION_MSG);
    }

    pub fn map_clicked(&mut self, at: Coords) -> Result<()> {
        self.require_map()?;
        dlog!("map_click at={at}");
        self.pending_click = Some(at);
        self.map.show_add_form();
        Ok(())
    }

    pub fn toggle_kind_fields(&mut self, kind: WorkoutKind) {
        self.list.show_kind_fields(kind);
    }

    pub fn submit_add(&mut self, form: WorkoutForm) -> Result<&Workout> {
        self.submit_add_at(form, Utc::now())
    }

    /// Same as [`submit_add`](Self::submit_add) with an explicit creation time.
    pub fn submit_add_at(
        &mut self,
        form: WorkoutForm,
        created_at: DateTime<Utc>,
    ) -> Result<&Workout> {
        let Some(at) = self.pending_click else {
            return Err(WorkoutError::NoMapClick);
        };
        let input = self.validated(&form)?;

        let id = self.store.fresh_id(created_at);
        let workout = Workout::create(
            input,
            id.clone(),
            created_at,
            at,
            form.distance,
            form.duration,
        );
        self.store.add(workout.clone())?;
        self.render(&workout);

        self.pending_click = None;
        self.map.hide_add_form();
        self.store.get(&id).ok_or(WorkoutError::UnknownWorkout(id))
    }

    /// Opens the edit form for `id`, or closes whatever form is open.
    ///
    /// Returns whether a form is open afterwards.
    pub fn toggle_edit(&mut self, id: &str) -> Result<bool> {
        self.require_map()?;
        if let Some(open) = self.edit.take() {
            dlog!("edit_close id={} requested={id}", open.workout_id);
            self.list.hide_edit_form();
            return Ok(false);
        }

        let Some(w) = self.store.get(id) else {
            return Err(WorkoutError::UnknownWorkout(id.to_string()));
        };
        let session = EditSession {
            workout_id: id.to_string(),
            values: WorkoutForm::from_workout(w),
        };
        self.list.show_edit_form(&EditForm::from(&session));
        self.edit = Some(session);
        dlog!("edit_open id={id}");
        Ok(true)
    }

    /// Applies the open edit form. Kind may change; id, location, creation
    /// time and click count are kept. A rejected form leaves the session
    /// and its prefilled values as they were.
    pub fn submit_edit(&mut self, form: WorkoutForm) -> Result<&Workout> {
        let Some(session) = self.edit.as_ref() else {
            return Err(WorkoutError::NoEditSession);
        };
        let id = session.workout_id.clone();
        let input = self.validated(&form)?;

        let Some(old) = self.store.get(&id) else {
            return Err(WorkoutError::UnknownWorkout(id));
        };
        let replacement = Workout::create(
            input,
            id.clone(),
            old.created_at(),
            old.coords(),
            form.distance,
            form.duration,
        )
        .with_clicks(old.clicks());

        self.store.replace(&id, replacement)?;
        self.list.remove_entry(&id);
        self.map.remove_marker(&id);
        self.list.hide_edit_form();
        self.edit = None;

        let updated = self
            .store
            .get(&id)
            .ok_or_else(|| WorkoutError::UnknownWorkout(id.clone()))?;
        self.list.insert_entry(&ListEntry::from(updated));
        if let MapState::Ready(_) = self.map_state {
            self.map
                .place_marker(updated.id(), updated.coords(), &marker_popup(updated));
        }
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<Workout> {
        self.require_map()?;
        self.require_no_edit()?;
        let removed = self.store.remove(id)?;
        self.list.remove_entry(id);
        self.map.remove_marker(id);
        Ok(removed)
    }

    pub fn clear_all(&mut self) -> Result<()> {
        self.require_map()?;
        self.require_no_edit()?;
        let ids: Vec<String> = self.store.iter().map(|w| w.id().to_string()).collect();
        self.store.clear()?;
        for id in &ids {
            self.map.remove_marker(id);
        }
        self.list.clear_entries();
        Ok(())
    }

    /// Re-lists every workout in the requested order.
    pub fn sort(&mut self, key: SortKey, direction: SortDirection) -> Vec<Workout> {
        let ordered = self.store.sorted(key, direction);
        self.list.clear_entries();
        for w in &ordered {
            self.list.insert_entry(&ListEntry::from(w));
        }
        ordered
    }

    /// Centers the map on one workout and counts the interaction.
    pub fn focus(&mut self, id: &str) -> Result<&Workout> {
        self.require_map()?;
        let Some(w) = self.store.get_mut(id) else {
            return Err(WorkoutError::UnknownWorkout(id.to_string()));
        };
        w.register_interaction();
        let at = w.coords();
        self.map.set_view(at, MAP_ZOOM);
        self.store.persist()?;
        self.store
            .get(id)
            .ok_or_else(|| WorkoutError::UnknownWorkout(id.to_string()))
    }

    pub fn show_all(&mut self) -> Result<()> {
        self.require_map()?;
        let points = self.store.coords();
        if points.is_empty() {
            dlog!("show_all with no workouts");
            return Ok(());
        }
        self.map.fit_bounds(&points);
        Ok(())
    }

    pub fn dismiss_banner(&mut self) {
        self.banner.hide();
    }

    fn render(&mut self, w: &Workout) {
        if let MapState::Ready(_) = self.map_state {
            self.map.place_marker(w.id(), w.coords(), &marker_popup(w));
        }
        self.list.insert_entry(&ListEntry::from(w));
    }

    fn validated(&mut self, form: &WorkoutForm) -> Result<KindInput> {
        form.validate().inspect_err(|_| {
            tracing::warn!(?form, "rejected workout input");
            self.flash(INVALID_INPUT_MSG);
        })
    }

    fn require_map(&self) -> Result<()> {
        match self.map_state {
            MapState::Ready(_) => Ok(()),
            MapState::Locating | MapState::Unavailable => Err(WorkoutError::MapUnavailable),
        }
    }

    fn require_no_edit(&mut self) -> Result<()> {
        if self.edit.is_some() {
            self.flash(EDIT_IN_PROGRESS_MSG);
            return Err(WorkoutError::EditInProgress);
        }
        Ok(())
    }

    fn flash(&mut self, message: &str) {
        self.banner.show(message);
    }
}
