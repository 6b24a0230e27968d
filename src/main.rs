#![deny(warnings, clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::{Context, Result};
use clap::Parser;
use workout_log::cli::{self, Cmd, ListArgs, MetricArgs};
use workout_log::render::{TerminalBanner, TerminalList, TerminalMap};
use workout_log::store::SortDirection;
use workout_log::{Coordinator, SqliteSlot, WorkoutForm, WorkoutKind, WorkoutStore, utils};

type App = Coordinator<SqliteSlot, TerminalMap, TerminalList, TerminalBanner>;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let slot = SqliteSlot::open(&cli.db)
        .with_context(|| format!("opening workout db: {}", cli.db.display()))?;
    let mut app = Coordinator::new(
        WorkoutStore::new(slot),
        TerminalMap::default(),
        TerminalList::default(),
        TerminalBanner::default(),
    );
    let loaded = app.start().context("loading workouts")?;
    tracing::debug!(db = %cli.db.display(), loaded, "workouts ready");

    if cli.no_position {
        app.position_failed("disabled with --no-position");
    } else {
        app.position_acquired(cli.home);
    }

    match cli.cmd {
        Some(Cmd::Add { kind, at, metrics }) => {
            app.map_clicked(at).context("picking workout location")?;
            app.toggle_kind_fields(kind);
            let w = app
                .submit_add(form(kind, metrics))
                .context("adding workout")?;
            println!("{}\t{}", w.id(), w.description());
        }
        Some(Cmd::Edit { id, kind, metrics }) => {
            app.toggle_edit(&id)
                .with_context(|| format!("opening workout {id}"))?;
            let prefill = app
                .edit_session()
                .map(|s| s.values)
                .with_context(|| format!("no edit form for {id}"))?;
            let kind = kind.unwrap_or(prefill.kind);
            let mut values = form(kind, metrics);
            if kind == prefill.kind {
                values.cadence = values.cadence.or(prefill.cadence);
                values.elevation = values.elevation.or(prefill.elevation);
            }
            let w = app
                .submit_edit(values)
                .with_context(|| format!("editing workout {id}"))?;
            println!("{}\t{}", w.id(), w.description());
        }
        Some(Cmd::Delete { id }) => {
            let w = app
                .delete(&id)
                .with_context(|| format!("deleting workout {id}"))?;
            tracing::info!(id = w.id(), "deleted");
        }
        Some(Cmd::Clear) => {
            app.clear_all().context("clearing workouts")?;
        }
        Some(Cmd::Show { id }) => {
            let w = app.focus(&id).with_context(|| format!("showing {id}"))?;
            println!(
                "{}\t{}\t{}\tclicks={}",
                w.id(),
                w.description(),
                w.coords(),
                w.clicks()
            );
        }
        Some(Cmd::Bounds) => {
            app.show_all().context("fitting map to workouts")?;
            if let Some(points) = &app.map().bounds {
                print_bounds(points);
            }
        }
        Some(Cmd::Export) => {
            println!("{}", app.store().to_json()?);
        }
        Some(Cmd::List(args)) => print_list(&mut app, args),
        None => print_list(
            &mut app,
            ListArgs {
                sort: None,
                dir: SortDirection::Ascending,
                details: false,
            },
        ),
    }

    Ok(())
}

const fn form(kind: WorkoutKind, m: MetricArgs) -> WorkoutForm {
    WorkoutForm {
        kind,
        distance: m.distance,
        duration: m.duration,
        cadence: m.cadence,
        elevation: m.elevation,
    }
}

fn print_list(app: &mut App, args: ListArgs) {
    if let Some(key) = args.sort {
        app.sort(key, args.dir);
    }
    let entries = &app.list().entries;
    if entries.is_empty() {
        tracing::info!("no workouts logged yet");
        return;
    }
    for e in entries {
        if args.details {
            println!("{e}");
        } else {
            println!("{}\t{}", e.id, e.title);
        }
    }
}

fn print_bounds(points: &[workout_log::Coords]) {
    let lats = points.iter().map(|c| c.lat);
    let lngs = points.iter().map(|c| c.lng);
    let min_lat = lats.clone().fold(f64::INFINITY, f64::min);
    let max_lat = lats.fold(f64::NEG_INFINITY, f64::max);
    let min_lng = lngs.clone().fold(f64::INFINITY, f64::min);
    let max_lng = lngs.fold(f64::NEG_INFINITY, f64::max);
    println!("{min_lat},{min_lng}\t{max_lat},{max_lng}");
}
