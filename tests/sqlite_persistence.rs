use chrono::Utc;
use workout_log::kv::{KeyValueSlot, SqliteSlot};
use workout_log::store::{STORAGE_KEY, SortDirection, SortKey};
use workout_log::{Coords, KindInput, Workout, WorkoutStore};

fn workout(store: &WorkoutStore<SqliteSlot>, input: KindInput, distance: f64) -> Workout {
    let now = Utc::now();
    Workout::create(
        input,
        store.fresh_id(now),
        now,
        Coords::new(39.0, -12.0),
        distance,
        45.0,
    )
}

#[test]
fn workouts_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.sqlite");

    let ids: Vec<String> = {
        let mut store = WorkoutStore::new(SqliteSlot::open(&path).unwrap());
        store.load().unwrap();
        let run = workout(&store, KindInput::Running { cadence_spm: 172.0 }, 9.5);
        store.add(run).unwrap();
        let ride = workout(
            &store,
            KindInput::Cycling {
                elevation_gain_m: 310.0,
            },
            32.0,
        );
        store.add(ride).unwrap();
        store.iter().map(|w| w.id().to_string()).collect()
    };

    let mut store = WorkoutStore::new(SqliteSlot::open(&path).unwrap());
    assert_eq!(store.load().unwrap(), 2);
    let reloaded: Vec<String> = store.iter().map(|w| w.id().to_string()).collect();
    assert_eq!(reloaded, ids);

    let ride = store.get(&ids[1]).unwrap();
    assert_eq!(ride.speed(), Some(32.0 / (45.0 / 60.0)));
    assert_eq!(ride.elevation_gain(), Some(310.0));

    store.remove(&ids[0]).unwrap();
    let sorted = store.sorted(SortKey::Duration, SortDirection::Ascending);
    assert!(sorted.iter().all(|w| w.id() != ids[0]));
}

#[test]
fn clear_removes_persisted_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.sqlite");

    let mut store = WorkoutStore::new(SqliteSlot::open(&path).unwrap());
    let run = workout(&store, KindInput::Running { cadence_spm: 165.0 }, 4.0);
    store.add(run).unwrap();
    store.clear().unwrap();
    drop(store);

    let slot = SqliteSlot::open(&path).unwrap();
    assert_eq!(slot.get(STORAGE_KEY).unwrap(), None);
}

#[test]
fn unreadable_payload_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.sqlite");

    let mut slot = SqliteSlot::open(&path).unwrap();
    slot.set(STORAGE_KEY, "[{\"id\": 1").unwrap();

    let mut store = WorkoutStore::new(slot);
    assert_eq!(store.load().unwrap(), 0);
    assert!(store.is_empty());
}
