use crate::dlog;
use crate::error::{Result, WorkoutError};
use crate::kv::KeyValueSlot;
use crate::types::{Coords, Workout, WorkoutRecord};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;

/// Slot key holding the serialized collection.
pub const STORAGE_KEY: &str = "workouts";

const ID_MODULUS: i64 = 10_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Distance,
    Duration,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(Self::Date),
            "distance" => Ok(Self::Distance),
            "duration" => Ok(Self::Duration),
            other => Err(format!("unknown sort key: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Ascending),
            "desc" | "dsc" => Ok(Self::Descending),
            other => Err(format!("unknown sort direction: {other:?}")),
        }
    }
}

/// In-memory ordered workouts, written through to a key-value slot.
pub struct WorkoutStore<S> {
    slot: S,
    workouts: Vec<Workout>,
}

impl<S: KeyValueSlot> WorkoutStore<S> {
    /// Empty store; call [`load`](Self::load) to adopt persisted workouts.
    pub const fn new(slot: S) -> Self {
        Self {
            slot,
            workouts: Vec::new(),
        }
    }

    pub const fn slot(&self) -> &S {
        &self.slot
    }

    pub fn into_slot(self) -> S {
        self.slot
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Workout> {
        self.workouts.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id() == id)
    }

    pub fn coords(&self) -> Vec<Coords> {
        self.workouts.iter().map(Workout::coords).collect()
    }

    /// Next unused identifier for a workout created at `created_at`.
    ///
    /// Starts from the last ten digits of the Unix millisecond timestamp
    /// and counts up past ids already taken.
    pub fn fresh_id(&self, created_at: DateTime<Utc>) -> String {
        let mut n = created_at.timestamp_millis().rem_euclid(ID_MODULUS);
        loop {
            let id = format!("{n:010}");
            if self.get(&id).is_none() {
                return id;
            }
            n = (n + 1) % ID_MODULUS;
        }
    }

    pub fn add(&mut self, workout: Workout) -> Result<()> {
        if self.get(workout.id()).is_some() {
            return Err(WorkoutError::DuplicateId(workout.id().to_string()));
        }
        let (id, kind) = (workout.id().to_string(), workout.kind());
        self.workouts.push(workout);
        if let Err(e) = self.persist() {
            self.workouts.pop();
            return Err(e);
        }
        tracing::info!(id = %id, %kind, "workout added");
        Ok(())
    }

    /// Swaps the workout stored under `id` in place.
    pub fn replace(&mut self, id: &str, workout: Workout) -> Result<()> {
        let Some(pos) = self.position(id) else {
            return Err(WorkoutError::UnknownWorkout(id.to_string()));
        };
        if workout.id() != id {
            return Err(WorkoutError::Storage(format!(
                "replacement for {id} carries id {}",
                workout.id()
            )));
        }
        let previous = std::mem::replace(&mut self.workouts[pos], workout);
        if let Err(e) = self.persist() {
            self.workouts[pos] = previous;
            return Err(e);
        }
        tracing::info!(id, "workout replaced");
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Workout> {
        let Some(pos) = self.position(id) else {
            return Err(WorkoutError::UnknownWorkout(id.to_string()));
        };
        let removed = self.workouts.remove(pos);
        if let Err(e) = self.persist() {
            self.workouts.insert(pos, removed);
            return Err(e);
        }
        tracing::info!(id, "workout removed");
        Ok(removed)
    }

    /// Drops every workout and the persisted key.
    pub fn clear(&mut self) -> Result<()> {
        self.slot.remove(STORAGE_KEY)?;
        let n = self.workouts.len();
        self.workouts.clear();
        tracing::info!(removed = n, "all workouts cleared");
        Ok(())
    }

    /// Replaces the collection with what the slot holds.
    ///
    /// A missing or unreadable entry yields an empty collection. Each record
    /// is rebuilt and checked; bad ones and repeated ids are skipped.
    pub fn load(&mut self) -> Result<usize> {
        self.workouts.clear();

        let Some(raw) = self.slot.get(STORAGE_KEY)? else {
            dlog!("no persisted workouts");
            return Ok(0);
        };

        let records: Vec<WorkoutRecord> = match serde_json::from_str(&raw) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(err = %e, "persisted workouts are unreadable; starting empty");
                return Ok(0);
            }
        };

        let total = records.len();
        let mut seen = HashSet::with_capacity(total);
        for rec in records {
            let id = rec.id.clone();
            if seen.contains(&id) {
                tracing::warn!(id = %id, "skipping persisted workout with repeated id");
                continue;
            }
            match rec.into_workout() {
                Ok(w) => {
                    seen.insert(id);
                    self.workouts.push(w);
                }
                Err(e) => tracing::warn!(id = %id, err = %e, "skipping invalid persisted workout"),
            }
        }

        tracing::info!(loaded = self.workouts.len(), total, "workouts loaded");
        Ok(self.workouts.len())
    }

    /// A reordered copy; the stored order is left alone.
    ///
    /// Sorting is stable. Date order compares creation time, then id.
    pub fn sorted(&self, key: SortKey, direction: SortDirection) -> Vec<Workout> {
        let mut out = self.workouts.clone();
        let cmp = |a: &Workout, b: &Workout| -> Ordering {
            match key {
                SortKey::Date => a
                    .created_at()
                    .cmp(&b.created_at())
                    .then_with(|| a.id().cmp(b.id())),
                SortKey::Distance => a.distance_km().total_cmp(&b.distance_km()),
                SortKey::Duration => a.duration_min().total_cmp(&b.duration_min()),
            }
        };
        match direction {
            SortDirection::Ascending => out.sort_by(cmp),
            SortDirection::Descending => out.sort_by(|a, b| cmp(b, a)),
        }
        out
    }

    /// The serialized collection as written to the slot.
    pub fn to_json(&self) -> Result<String> {
        let records: Vec<WorkoutRecord> = self.workouts.iter().map(WorkoutRecord::from).collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Writes the whole collection under [`STORAGE_KEY`].
    ///
    /// Mutating methods undo their in-memory change when this fails.
    pub fn persist(&mut self) -> Result<()> {
        let json = self.to_json()?;
        self.slot.set(STORAGE_KEY, &json)?;
        dlog!("persisted workouts={} bytes={}", self.workouts.len(), json.len());
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.workouts.iter().position(|w| w.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemorySlot;
    use crate::types::KindInput;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 14, 10, 0, 0).single().unwrap()
    }

    fn run(store: &WorkoutStore<MemorySlot>, mins_later: i64, distance: f64) -> Workout {
        let created = t0() + Duration::minutes(mins_later);
        Workout::create(
            KindInput::Running { cadence_spm: 170.0 },
            store.fresh_id(created),
            created,
            Coords::new(39.0, -12.0),
            distance,
            30.0,
        )
    }

    fn ids(ws: &[Workout]) -> Vec<String> {
        ws.iter().map(|w| w.id().to_string()).collect()
    }

    #[test]
    fn fresh_id_is_ten_digits_and_unique() {
        let mut store = WorkoutStore::new(MemorySlot::new());
        let a = run(&store, 0, 5.0);
        let a_id = a.id().to_string();
        assert_eq!(a_id.len(), 10);
        assert_eq!(a_id, format!("{:010}", t0().timestamp_millis() % ID_MODULUS));
        store.add(a).unwrap();

        let b = run(&store, 0, 6.0);
        assert_ne!(b.id(), a_id);
        store.add(b).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn add_rejects_duplicate_id() {
        let mut store = WorkoutStore::new(MemorySlot::new());
        let a = run(&store, 0, 5.0);
        store.add(a.clone()).unwrap();
        assert!(matches!(store.add(a), Err(WorkoutError::DuplicateId(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_keeps_position() {
        let mut store = WorkoutStore::new(MemorySlot::new());
        for i in 0..3 {
            let w = run(&store, i, 5.0);
            store.add(w).unwrap();
        }
        let mid = store.iter().nth(1).unwrap().clone();
        let new = Workout::create(
            KindInput::Cycling {
                elevation_gain_m: 100.0,
            },
            mid.id(),
            mid.created_at(),
            mid.coords(),
            40.0,
            90.0,
        );
        store.replace(mid.id(), new).unwrap();
        let now: Vec<_> = store.iter().collect();
        assert_eq!(now[1].id(), mid.id());
        assert_eq!(now[1].distance_km(), 40.0);
        assert!(store.replace("nope", mid).is_err());
    }

    #[test]
    fn sorted_leaves_store_order() {
        let mut store = WorkoutStore::new(MemorySlot::new());
        for (i, d) in [5.0, 2.0, 9.0, 2.0].into_iter().enumerate() {
            let w = run(&store, i as i64, d);
            store.add(w).unwrap();
        }
        let before = ids(&store.iter().cloned().collect::<Vec<_>>());

        let asc = store.sorted(SortKey::Distance, SortDirection::Ascending);
        assert!(asc.windows(2).all(|p| p[0].distance_km() <= p[1].distance_km()));
        let desc = store.sorted(SortKey::Distance, SortDirection::Descending);
        assert!(desc.windows(2).all(|p| p[0].distance_km() >= p[1].distance_km()));

        let newest_first = store.sorted(SortKey::Date, SortDirection::Descending);
        let mut expected = before.clone();
        expected.reverse();
        assert_eq!(ids(&newest_first), expected);

        assert_eq!(ids(&store.iter().cloned().collect::<Vec<_>>()), before);
    }

    #[test]
    fn removed_workout_never_sorted() {
        let mut store = WorkoutStore::new(MemorySlot::new());
        for i in 0..3 {
            let w = run(&store, i, 5.0 + i as f64);
            store.add(w).unwrap();
        }
        let gone = store.iter().next().unwrap().id().to_string();
        store.remove(&gone).unwrap();
        for key in [SortKey::Date, SortKey::Distance, SortKey::Duration] {
            for dir in [SortDirection::Ascending, SortDirection::Descending] {
                assert!(store.sorted(key, dir).iter().all(|w| w.id() != gone));
            }
        }
        assert!(matches!(
            store.remove(&gone),
            Err(WorkoutError::UnknownWorkout(_))
        ));
    }

    #[test]
    fn load_round_trips_through_slot() {
        let mut store = WorkoutStore::new(MemorySlot::new());
        for i in 0..3 {
            let w = run(&store, i, 4.0);
            store.add(w).unwrap();
        }
        let before = ids(&store.iter().cloned().collect::<Vec<_>>());

        let mut reloaded = WorkoutStore::new(store.into_slot());
        assert_eq!(reloaded.load().unwrap(), 3);
        assert_eq!(ids(&reloaded.iter().cloned().collect::<Vec<_>>()), before);
    }

    #[test]
    fn load_tolerates_garbage() {
        let mut slot = MemorySlot::new();
        slot.set(STORAGE_KEY, "{not json").unwrap();
        let mut store = WorkoutStore::new(slot);
        assert_eq!(store.load().unwrap(), 0);
        assert!(store.is_empty());

        let mut empty = WorkoutStore::new(MemorySlot::new());
        assert_eq!(empty.load().unwrap(), 0);
    }

    /// Slot whose writes can be switched to fail.
    #[derive(Default)]
    struct FlakySlot {
        inner: MemorySlot,
        failing: bool,
    }

    impl KeyValueSlot for FlakySlot {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            if self.failing {
                return Err(WorkoutError::Storage("disk full".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            if self.failing {
                return Err(WorkoutError::Storage("disk full".into()));
            }
            self.inner.remove(key)
        }
    }

    fn flaky_run(store: &WorkoutStore<FlakySlot>, distance: f64) -> Workout {
        let created = t0();
        Workout::create(
            KindInput::Running { cadence_spm: 170.0 },
            store.fresh_id(created),
            created,
            Coords::new(39.0, -12.0),
            distance,
            30.0,
        )
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let mut store = WorkoutStore::new(FlakySlot {
            failing: true,
            ..FlakySlot::default()
        });
        let w = flaky_run(&store, 5.0);
        assert!(matches!(store.add(w), Err(WorkoutError::Storage(_))));
        assert!(store.is_empty());

        store.slot.failing = false;
        let w = flaky_run(&store, 5.0);
        let id = w.id().to_string();
        store.add(w).unwrap();
        let persisted = store.slot().get(STORAGE_KEY).unwrap();

        store.slot.failing = true;
        let edited = Workout::create(
            KindInput::Running { cadence_spm: 180.0 },
            id.as_str(),
            t0(),
            Coords::new(39.0, -12.0),
            42.0,
            200.0,
        );
        assert!(store.replace(&id, edited).is_err());
        assert_eq!(store.get(&id).unwrap().distance_km(), 5.0);

        assert!(store.remove(&id).is_err());
        assert!(store.get(&id).is_some());

        assert!(store.clear().is_err());
        assert_eq!(store.len(), 1);
        assert_eq!(store.slot().get(STORAGE_KEY).unwrap(), persisted);
    }

    #[test]
    fn load_skips_invalid_and_repeated_records() {
        let json = r#"[
            {"id":"1","createdAt":"2024-04-14T10:00:00Z","coords":[39,-12],
             "distance":5,"duration":25,"kind":"running","cadence":170},
            {"id":"1","createdAt":"2024-04-14T11:00:00Z","coords":[39,-12],
             "distance":6,"duration":25,"kind":"running","cadence":170},
            {"id":"2","createdAt":"2024-04-14T12:00:00Z","coords":[39,-12],
             "distance":-1,"duration":25,"kind":"cycling","elevationGain":3},
            {"id":"3","createdAt":"2024-04-14T13:00:00Z","coords":[39,-12],
             "distance":20,"duration":60,"kind":"cycling","elevationGain":3,"speed":1}
        ]"#;
        let mut slot = MemorySlot::new();
        slot.set(STORAGE_KEY, json).unwrap();
        let mut store = WorkoutStore::new(slot);
        assert_eq!(store.load().unwrap(), 2);
        assert_eq!(store.get("1").unwrap().distance_km(), 5.0);
        assert_eq!(store.get("3").unwrap().speed(), Some(20.0));
        assert!(store.get("2").is_none());
    }

    #[test]
    fn invalid_record_does_not_claim_its_id() {
        let json = r#"[
            {"id":"1","createdAt":"2024-04-14T10:00:00Z","coords":[39,-12],
             "distance":-1,"duration":25,"kind":"running","cadence":170},
            {"id":"1","createdAt":"2024-04-14T11:00:00Z","coords":[39,-12],
             "distance":6,"duration":25,"kind":"running","cadence":170}
        ]"#;
        let mut slot = MemorySlot::new();
        slot.set(STORAGE_KEY, json).unwrap();
        let mut store = WorkoutStore::new(slot);
        assert_eq!(store.load().unwrap(), 1);
        assert_eq!(store.get("1").unwrap().distance_km(), 6.0);
    }

    #[test]
    fn clear_removes_key() {
        let mut store = WorkoutStore::new(MemorySlot::new());
        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.slot().get(STORAGE_KEY).unwrap(), None);

        let w = run(&store, 0, 3.0);
        store.add(w).unwrap();
        assert!(store.slot().get(STORAGE_KEY).unwrap().is_some());
        store.clear().unwrap();
        assert_eq!(store.slot().get(STORAGE_KEY).unwrap(), None);
    }
}
