mod index;
mod parser;
mod settings;
mod source;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use index::ScheduleIndex;
use parser::classify::classify;
use parser::lines::reconstruct_lines;
use settings::ParseSettings;

#[derive(Parser)]
#[command(name = "season_index", about = "Season schedule parser and track index builder")]
struct Cli {
    /// Settings file (default: ./season_index.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a fragment dump (.json) or text export (.txt) into an index
    Build {
        input: PathBuf,
        /// Output file (default: <input stem>.index.json next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Print reconstructed lines, optionally with their classification
    Lines {
        input: PathBuf,
        /// Only this page (0-based)
        #[arg(short, long)]
        page: Option<usize>,
        #[arg(long)]
        classify: bool,
    },
    /// List the sorted track names of an index
    Tracks { index: PathBuf },
    /// Show the weeks raced at a track (case and accent insensitive)
    Find {
        index: PathBuf,
        track: String,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Build indexes for several documents in parallel
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Directory for the <stem>.index.json files (default: next to each input)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings =
        ParseSettings::load(cli.config.as_deref()).context("Failed to load settings")?;

    let result = match cli.command {
        Commands::Build {
            input,
            output,
            pretty,
        } => {
            let output = output.unwrap_or_else(|| index_path(&input, None));
            let index = build_index(&input, &settings, true)?;
            index.write(&output, pretty)?;
            println!(
                "OK: {} records, {} tracks -> {}",
                index.records.len(),
                index.tracks.len(),
                output.display()
            );
            Ok(())
        }
        Commands::Lines {
            input,
            page,
            classify: show_kind,
        } => {
            let mut src = source::open_source(&input)?;
            let pages: Vec<usize> = match page {
                Some(p) => vec![p],
                None => (0..src.page_count()).collect(),
            };
            for p in pages {
                let fragments = src.page(p)?;
                println!("--- page {} ---", p);
                for line in reconstruct_lines(p, fragments, settings.line_tolerance) {
                    if show_kind {
                        println!("{:<8} | {}", classify(&line.text).label(), line.text);
                    } else {
                        println!("{}", line.text);
                    }
                }
            }
            Ok(())
        }
        Commands::Tracks { index } => {
            let index = ScheduleIndex::read(&index)?;
            for track in &index.tracks {
                println!("{}", track);
            }
            println!("\n{} tracks", index.tracks.len());
            Ok(())
        }
        Commands::Find {
            index,
            track,
            limit,
        } => {
            let index = ScheduleIndex::read(&index)?;
            let hits = index.find_by_track(&track);
            if hits.is_empty() {
                println!("No weeks found for '{}'.", track);
                return Ok(());
            }

            println!(
                "{:>3} | {:<12} | {:<2} | {:<28} | {:>4} | {:<10} | {:<28} | {:<24}",
                "#", "Category", "Cl", "Series", "Week", "Start", "Track", "Cars"
            );
            println!("{}", "-".repeat(130));

            for (i, r) in hits.iter().take(limit).enumerate() {
                println!(
                    "{:>3} | {:<12} | {:<2} | {:<28} | {:>4} | {:<10} | {:<28} | {:<24}",
                    i + 1,
                    truncate(&r.category, 12),
                    r.class_letter,
                    truncate(&r.series, 28),
                    r.week,
                    r.week_start,
                    truncate(&r.track, 28),
                    truncate(&r.cars, 24)
                );
            }

            if hits.len() > limit {
                println!("\n{} of {} weeks shown", limit, hits.len());
            } else {
                println!("\n{} weeks", hits.len());
            }
            Ok(())
        }
        Commands::Batch {
            inputs,
            out_dir,
            pretty,
        } => {
            println!("Parsing {} documents...", inputs.len());
            let pb = ProgressBar::new(inputs.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                    .unwrap()
                    .progress_chars("#>-"),
            );

            // Every document gets its own parser state.
            let results: Vec<(PathBuf, anyhow::Result<(usize, usize)>)> = inputs
                .par_iter()
                .map(|input| {
                    let output = index_path(input, out_dir.as_deref());
                    let outcome = build_index(input, &settings, false).and_then(|index| {
                        index.write(&output, pretty)?;
                        Ok((index.records.len(), index.tracks.len()))
                    });
                    pb.inc(1);
                    (input.clone(), outcome)
                })
                .collect();
            pb.finish_and_clear();

            let mut failed = 0;
            for (input, outcome) in &results {
                match outcome {
                    Ok((records, tracks)) => {
                        println!("OK    {} ({} records, {} tracks)", input.display(), records, tracks)
                    }
                    Err(e) => {
                        failed += 1;
                        warn!(input = %input.display(), "batch item failed");
                        println!("ERROR {}: {:#}", input.display(), e);
                    }
                }
            }
            println!("Done: {} ok, {} errors.", results.len() - failed, failed);
            if failed > 0 {
                anyhow::bail!("{} of {} documents failed", failed, results.len());
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Parse one document and stamp it with its provenance.
fn build_index(
    input: &Path,
    settings: &ParseSettings,
    progress: bool,
) -> anyhow::Result<ScheduleIndex> {
    let mut src = source::open_source(input)?;
    let pb = if progress {
        let pb = ProgressBar::new(src.page_count() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] page {pos}/{len}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut index = parser::parse_document(src.as_mut(), settings, |_| pb.inc(1))
        .with_context(|| format!("Failed to parse {}", input.display()))?;
    pb.finish_and_clear();

    index.source_file = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    index.source_digest = Some(index::source_digest(input)?);
    info!(
        input = %input.display(),
        records = index.records.len(),
        tracks = index.tracks.len(),
        "index built"
    );
    Ok(index)
}

/// `<dir>/<stem>.index.json`, where `dir` defaults to the input's directory.
fn index_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "schedule".into());
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{}.index.json", stem))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_path_defaults_next_to_input() {
        assert_eq!(
            index_path(Path::new("data/season.json"), None),
            PathBuf::from("data/season.index.json")
        );
        assert_eq!(
            index_path(Path::new("season.txt"), Some(Path::new("out"))),
            PathBuf::from("out/season.index.json")
        );
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("Okayama", 10), "Okayama");
        assert_eq!(truncate("Autódromo José", 4), "Autó...");
    }

    #[test]
    fn duration_formats() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn build_fixture_index() {
        let index = build_index(
            Path::new("tests/fixtures/season_schedule.txt"),
            &ParseSettings::default(),
            false,
        )
        .unwrap();
        assert_eq!(index.source_file.as_deref(), Some("season_schedule.txt"));
        assert_eq!(index.source_digest.as_ref().map(String::len), Some(64));
        assert_eq!(index.records.len(), 9);
    }
}
