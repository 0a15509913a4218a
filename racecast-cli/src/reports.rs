use anyhow::Result;
use colored::Colorize;
use racecast_engine::{
    BatchSummary, ConfidenceLevel, DriverRegistry, PredictionResult, QualifyingGrid, RaceEvent,
    Track, TrackRegistry, format_gap, format_lap_time,
};
use serde::Serialize;
use std::io::Write;

use crate::seeds::SeedInfo;

#[derive(Serialize)]
struct QualifyingReport<'a> {
    share_code: &'a str,
    seed: u64,
    track: &'a Track,
    grid: &'a QualifyingGrid,
}

#[derive(Serialize)]
struct PredictionReport<'a> {
    share_code: &'a str,
    seed: u64,
    track: &'a Track,
    grid: &'a QualifyingGrid,
    result: &'a PredictionResult,
}

pub fn generate_json_report<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

pub fn track_listing<W: Write>(writer: &mut W, tracks: &TrackRegistry) -> Result<()> {
    writeln!(writer, "{}", "🗺️  Circuits".bright_cyan().bold())?;
    writeln!(writer, "{}", "===========".cyan())?;
    for track in tracks.iter() {
        let street = if track.street_circuit { "street" } else { "" };
        writeln!(
            writer,
            "  {:12} {:28} {:>3} laps  {:6} {}",
            track.key.bold(),
            track.name,
            track.laps,
            track.weather.to_string(),
            street.yellow()
        )?;
    }
    Ok(())
}

pub fn driver_listing<W: Write>(writer: &mut W, drivers: &DriverRegistry) -> Result<()> {
    writeln!(writer, "{}", "🏎️  Drivers".bright_cyan().bold())?;
    writeln!(writer, "{}", "==========".cyan())?;
    for driver in drivers.iter() {
        writeln!(
            writer,
            "  {} {:22} {:18} pace {:>8}  quali {:.2}  cons {:.2}  conf {:>3.0}%",
            driver.code.as_str().bold(),
            driver.name,
            driver.team,
            format_lap_time(driver.base_pace),
            driver.quali_skill,
            driver.consistency,
            driver.base_confidence
        )?;
    }
    Ok(())
}

pub fn qualifying_console<W: Write>(
    writer: &mut W,
    track: &Track,
    seed: &SeedInfo,
    grid: &QualifyingGrid,
) -> Result<()> {
    writeln!(
        writer,
        "{} {} ({})",
        "⏱️  Qualifying:".bright_cyan().bold(),
        track.name.bold(),
        track.weather
    )?;
    writeln!(writer, "Share code: {}", seed.code.bright_yellow())?;
    writeln!(writer, "{}", "-".repeat(30).cyan())?;
    let pole_time = grid.pole().map_or(0.0, |p| p.lap_time);
    for entry in grid.entries() {
        let delta = entry.lap_time - pole_time;
        let delta = if entry.position == 1 {
            "Pole".green().to_string()
        } else {
            format!("+{delta:.3}")
        };
        writeln!(
            writer,
            "  P{:<2} {} {:>9}  {}",
            entry.position,
            entry.driver.as_str().bold(),
            format_lap_time(entry.lap_time),
            delta
        )?;
    }
    Ok(())
}

pub fn qualifying_json<W: Write>(
    writer: &mut W,
    track: &Track,
    seed: &SeedInfo,
    grid: &QualifyingGrid,
) -> Result<()> {
    generate_json_report(
        writer,
        &QualifyingReport {
            share_code: &seed.code,
            seed: seed.seed,
            track,
            grid,
        },
    )
}

pub fn prediction_console<W: Write>(
    writer: &mut W,
    track: &Track,
    seed: &SeedInfo,
    result: &PredictionResult,
) -> Result<()> {
    let mode = if result.chaos {
        "chaos".red().bold()
    } else {
        "calm".green()
    };
    writeln!(
        writer,
        "{} {} ({}, {} laps, {mode})",
        "🏁 Race Prediction:".bright_cyan().bold(),
        track.name.bold(),
        track.weather,
        track.laps
    )?;
    writeln!(writer, "Share code: {}", seed.code.bright_yellow())?;
    writeln!(writer, "{}", "=".repeat(30).cyan())?;

    for entry in &result.entries {
        let change = match entry.position_change {
            0 => "  =".normal(),
            n if n > 0 => format!("▲{n:>2}").green(),
            n => format!("▼{:>2}", n.unsigned_abs()).red(),
        };
        let confidence = match entry.confidence_level {
            ConfidenceLevel::High => format!("{:>3}%", entry.confidence).green(),
            ConfidenceLevel::Medium => format!("{:>3}%", entry.confidence).yellow(),
            ConfidenceLevel::Low => format!("{:>3}%", entry.confidence).red(),
        };
        let flag = if entry.incident { " 💥" } else { "" };
        writeln!(
            writer,
            "  P{:<2} {} {:22} {:18} grid {:>2} {}  {:>10}  {}{}",
            entry.position,
            entry.driver.as_str().bold(),
            entry.name,
            entry.team,
            entry.grid_position,
            change,
            format_gap(entry.gap, entry.laps_down),
            confidence,
            flag
        )?;
    }

    if !result.events.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", "📣 Race Story".bright_yellow().bold())?;
        for event in &result.events {
            writeln!(writer, "  • {}", describe_event(event))?;
        }
    }
    Ok(())
}

pub fn prediction_json<W: Write>(
    writer: &mut W,
    track: &Track,
    seed: &SeedInfo,
    grid: &QualifyingGrid,
    result: &PredictionResult,
) -> Result<()> {
    generate_json_report(
        writer,
        &PredictionReport {
            share_code: &seed.code,
            seed: seed.seed,
            track,
            grid,
            result,
        },
    )
}

pub fn batch_console<W: Write>(
    writer: &mut W,
    track: &Track,
    summary: &BatchSummary,
) -> Result<()> {
    writeln!(
        writer,
        "{} {} over {} runs{}",
        "📊 Batch Summary:".bright_cyan().bold(),
        track.name.bold(),
        summary.runs,
        if summary.chaos { " (chaos)" } else { "" }
    )?;
    writeln!(writer, "{}", "=".repeat(30).cyan())?;
    writeln!(
        writer,
        "  {:4} {:>5} {:>7} {:>5} {:>9} {:>5} {:>8}",
        "", "wins", "podiums", "poles", "incidents", "best", "avg"
    )?;
    for tally in &summary.standings {
        writeln!(
            writer,
            "  {} {:>5} {:>7} {:>5} {:>9} {:>5} {:>8.2}",
            tally.driver.as_str().bold(),
            tally.wins,
            tally.podiums,
            tally.poles,
            tally.incidents,
            format!("P{}", tally.best_finish),
            tally.average_finish
        )?;
    }
    Ok(())
}

fn describe_event(event: &RaceEvent) -> String {
    match event {
        RaceEvent::PoleToWin { driver } => format!("{driver} converts pole into victory"),
        RaceEvent::BiggestClimber { driver, places } => {
            format!("{driver} climbs {places} place{}", plural(*places))
        }
        RaceEvent::BiggestFaller { driver, places } => {
            format!("{driver} drops {places} place{}", plural(*places))
        }
        RaceEvent::Overtakes { count } => format!("{count} places gained across the field"),
        RaceEvent::Incident {
            driver,
            grid_position,
            finish_position,
        } => format!(
            "{driver} hit trouble: P{grid_position} on the grid, P{finish_position} at the flag"
        ),
        RaceEvent::Lapped { driver, laps } => {
            format!("{driver} finishes {laps} lap{} down", plural(*laps))
        }
    }
}

const fn plural(count: u32) -> &'static str {
    if count == 1 { "" } else { "s" }
}
