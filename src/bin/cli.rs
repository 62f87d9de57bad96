//! midiframe CLI: decode a MIDI file and summarize its frame timeline.
//!
//! Usage:
//!   cargo run --bin mf-cli -- path/to/song.mid
//!   cargo run --bin mf-cli -- path/to/song.mid --fps 30 --tracks 1-3
//!   cargo run --bin mf-cli -- path/to/song.mid --config midiframe.toml

use mf_master::{Config, Converter, Timeline};
use std::{env, fs};

const USAGE: &str = "Usage: mf-cli <file.mid> [--fps N] [--tracks RANGES] [--config path.toml]";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let path = args.get(1).filter(|a| !a.starts_with("--")).unwrap_or_else(|| {
        eprintln!("{USAGE}");
        std::process::exit(1);
    });

    let option = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .map(|i| {
                args.get(i + 1).cloned().unwrap_or_else(|| {
                    eprintln!("Missing value for {name}\n{USAGE}");
                    std::process::exit(1);
                })
            })
    };

    let mut config = match option("--config") {
        Some(config_path) => Config::read(&config_path).unwrap_or_else(|e| {
            eprintln!("Failed to load {}: {}", config_path, e);
            std::process::exit(1);
        }),
        None => Config::default(),
    };
    if let Some(fps) = option("--fps") {
        config.frame_rate = fps.parse().unwrap_or_else(|_| {
            eprintln!("Invalid frame rate: {fps}");
            std::process::exit(1);
        });
    }
    if let Some(tracks) = option("--tracks") {
        config.tracks = tracks;
    }

    let converter = Converter::new(&config).unwrap_or_else(|e| {
        eprintln!("{e}");
        std::process::exit(1);
    });

    let data = fs::read(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {}", path, e);
        std::process::exit(1);
    });

    let file = converter.decode(&data).unwrap_or_else(|e| {
        eprintln!("Failed to parse MIDI: {}", e);
        std::process::exit(1);
    });
    log::debug!("decoded {} ({} bytes)", path, data.len());

    println!("Format:   {}", file.format.as_u16());
    println!("Division: {} ticks/quarter", file.division);
    println!("Tracks:   {} chunk(s), {} note events", file.tracks.len(), file.note_event_count());

    let timeline = converter.timeline(&file).unwrap_or_else(|e| {
        eprintln!("Failed to build timeline: {}", e);
        std::process::exit(1);
    });

    print_tempo(&timeline);
    println!();
    print_tracks(&timeline);

    if !timeline.diagnostics().is_empty() {
        println!();
        println!("Diagnostics:");
        for diagnostic in timeline.diagnostics() {
            println!("  {diagnostic}");
        }
    }
}

fn print_tempo(timeline: &Timeline) {
    let tempo = timeline.tempo_map();
    if tempo.is_constant() {
        println!("Tempo:    {:.2} BPM", tempo.initial_bpm());
    } else {
        println!("Tempo:    {} changes", tempo.entries().len());
        for entry in tempo.entries() {
            println!("  tick {:>8}  {:>8.3}s  {:.2} BPM", entry.tick, entry.seconds, entry.bpm());
        }
    }
    for (tick, sig) in tempo.time_signatures() {
        println!("  tick {:>8}  {}/{}", tick, sig.numerator, sig.denominator);
    }

    let span = timeline.frame_span().map_or(0, |s| s.end);
    println!(
        "Timeline: {} notes, {} frames at {} fps ({:.2}s)",
        timeline.len(),
        span,
        timeline.frame_rate(),
        timeline.end_seconds()
    );
}

fn print_tracks(timeline: &Timeline) {
    println!("{:>3}  {:<24} {:>6}  {:>9}  {:>7}", "#", "Name", "Notes", "Range", "Octaves");
    for view in timeline.tracks() {
        let info = view.info();
        let range = match (info.min_note, info.max_note) {
            (Some(lo), Some(hi)) => format!("{lo}-{hi}"),
            _ => String::from("-"),
        };
        println!(
            "{:>3}  {:<24} {:>6}  {:>9}  {:>7}",
            info.index,
            info.name,
            view.len(),
            range,
            info.octave_count()
        );
    }
    if let Some(range) = timeline.note_range() {
        println!(
            "     {:<24} {:>6}  {:>9}  {:>7}",
            format!("{} track(s) with notes", range.track_count),
            "",
            format!("{}-{}", range.min_note, range.max_note),
            range.octave_count
        );
    }
}
