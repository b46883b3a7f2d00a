/*
    spotify-backup-rs | Rust CLI tool to back up and restore Spotify playlists.
    Copyright (C) 2025  spotify-backup-rs contributors

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use anyhow::Context;
use backup_core::{
    discover_backups, get_spotify_client, parse_selection, BackupTable, Exporter, Importer,
    RateGovernor, SessionScope,
};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "spotify-backup")]
#[command(about = "Back up your Spotify playlists to CSV and restore them later", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Exports every playlist of the current user to a CSV backup file
    Export {
        /// Output file path (default: spotify_backup_<user_id>_<YYYYMMDD>.csv)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },
    /// Recreates playlists from a CSV backup file
    Import {
        /// Backup file to read (default: pick one from the working directory)
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Export { output }) => handle_export(output).await,
        Some(Commands::Import { file }) => handle_import(file).await,
        None => run_menu().await,
    }
}

async fn run_menu() -> anyhow::Result<()> {
    println!("Select an option:");
    println!("1. Export Spotify playlists");
    println!("2. Import Spotify playlists");
    println!();

    let choice = prompt("Enter your choice (1 or 2): ")?;

    match choice.as_str() {
        "1" => handle_export(None).await,
        "2" => handle_import(None).await,
        _ => {
            println!("Invalid choice. Please enter 1 or 2.");
            Ok(())
        }
    }
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{message}");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

async fn make_exporter() -> Exporter {
    let spotify = match get_spotify_client(SessionScope::Export).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error initializing Spotify client: {}", e);
            process::exit(1);
        }
    };
    Exporter::new(spotify, RateGovernor::new())
}

async fn make_importer() -> Importer {
    let spotify = match get_spotify_client(SessionScope::Import).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error initializing Spotify client: {}", e);
            process::exit(1);
        }
    };
    Importer::new(spotify, RateGovernor::new())
}

async fn handle_export(output: Option<PathBuf>) -> anyhow::Result<()> {
    let mut exporter = make_exporter().await;
    println!("Exporting your playlists. This may take a while.");

    match exporter.export(output).await {
        Ok(report) => {
            println!();
            println!(
                "Playlists exported successfully to {}.",
                report.output_path.display()
            );
            println!("Playlists exported: {}", report.playlists_exported);
            println!("Tracks written:     {}", report.rows_written);
            if report.rows_skipped > 0 {
                println!(
                    "Tracks skipped:     {} (missing metadata, see warnings)",
                    report.rows_skipped
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("Export failed: {}", e);
            process::exit(1);
        }
    }
}

async fn handle_import(file: Option<PathBuf>) -> anyhow::Result<()> {
    let path = match file {
        Some(path) => path,
        None => match pick_backup_file()? {
            Some(path) => path,
            None => return Ok(()),
        },
    };

    let table = match BackupTable::load(&path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", path.display(), e);
            process::exit(1);
        }
    };

    let names = table.playlist_names();
    if names.is_empty() {
        println!("No playlists found in the selected CSV file.");
        return Ok(());
    }

    println!("Available playlists:");
    for (i, name) in names.iter().enumerate() {
        println!("{}. {}", i + 1, name);
    }
    println!();

    let expression = prompt("Enter playlist numbers, ranges, or 'all' (e.g., 1,3,5-7 or all): ")?;

    let indices: Vec<usize> = if expression.eq_ignore_ascii_case("all") {
        (1..=names.len()).collect()
    } else {
        let selection = parse_selection(&expression, names.len());
        if !selection.dropped.is_empty() {
            println!(
                "Ignored selection tokens: {}",
                selection.dropped.join(", ")
            );
        }
        selection.indices
    };

    if indices.is_empty() {
        println!("No valid playlists selected.");
        return Ok(());
    }

    let selected: Vec<String> = indices.iter().map(|&i| names[i - 1].clone()).collect();

    let mut importer = make_importer().await;

    match importer.import(&table, &selected).await {
        Ok(report) => {
            println!();
            println!("Import complete.");
            println!("Playlists created: {}", report.playlists_created);
            if report.playlists_skipped > 0 {
                println!(
                    "Playlists skipped: {} (no tracks in backup)",
                    report.playlists_skipped
                );
            }
            println!("Tracks added:      {}", report.tracks_added);
            Ok(())
        }
        Err(e) => {
            eprintln!();
            eprintln!("Import failed: {}", e);
            process::exit(1);
        }
    }
}

fn pick_backup_file() -> anyhow::Result<Option<PathBuf>> {
    let files = discover_backups(Path::new("."))?;

    if files.is_empty() {
        println!("No CSV files found starting with 'spotify_backup'.");
        return Ok(None);
    }

    println!("Available CSV files:");
    for (i, file) in files.iter().enumerate() {
        println!("{}. {}", i + 1, file.display());
    }
    println!();

    let answer = prompt(&format!("Select a CSV file by number (1-{}): ", files.len()))?;

    match answer.parse::<usize>() {
        Ok(index) if index >= 1 && index <= files.len() => Ok(Some(files[index - 1].clone())),
        _ => {
            println!("Invalid selection.");
            Ok(None)
        }
    }
}
