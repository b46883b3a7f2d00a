use crate::models::TrackRow;
use crate::rate::RateGovernor;
use crate::retry::with_retry;
use chrono::{Local, NaiveDate};
use log::{info, warn};
use rspotify::{
    model::{Id, Market, SimplifiedPlaylist},
    prelude::*,
    AuthCodeSpotify,
};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Page size for the user's playlist collection. Track pages use the API
/// default.
const PLAYLIST_PAGE_SIZE: u32 = 50;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("Failed to write backup file: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a completed export.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub output_path: PathBuf,
    pub playlists_exported: u32,
    pub rows_written: u64,
    /// Tracks dropped for missing identifiers (removed or local tracks).
    pub rows_skipped: u64,
}

/// Backs up every playlist of the current user to one CSV table,
/// one row per (playlist, track) pair, written incrementally.
pub struct Exporter {
    spotify: AuthCodeSpotify,
    governor: RateGovernor,
}

impl Exporter {
    pub fn new(spotify: AuthCodeSpotify, governor: RateGovernor) -> Self {
        Self { spotify, governor }
    }

    /// Runs the export. Without an explicit path the file lands in the
    /// working directory as `spotify_backup_<user_id>_<YYYYMMDD>.csv`.
    pub async fn export(&mut self, output: Option<PathBuf>) -> Result<ExportReport, ExportError> {
        self.governor.record_call().await;
        let user = with_retry("current user lookup", || self.spotify.current_user()).await?;

        let path = match output {
            Some(path) => path,
            None => PathBuf::from(default_backup_filename(user.id.id())),
        };

        let mut writer = open_backup_writer(&path)?;
        let mut report = ExportReport {
            output_path: path,
            ..Default::default()
        };

        let mut playlist_index = 0usize;
        let mut total = 0u32;
        let mut offset = 0u32;

        loop {
            self.governor.record_call().await;
            let page = with_retry("playlist page fetch", || {
                self.spotify
                    .current_user_playlists_manual(Some(PLAYLIST_PAGE_SIZE), Some(offset))
            })
            .await?;

            if offset == 0 {
                total = page.total;
                info!("Total playlists to export: {total}");
            }

            let fetched = page.items.len() as u32;
            for playlist in &page.items {
                playlist_index += 1;
                self.export_playlist(&mut writer, playlist, playlist_index, &mut report)
                    .await?;
                info!("Export progress: {playlist_index}/{total}");
            }

            offset += fetched;
            if page.next.is_none() || fetched == 0 {
                break;
            }
        }

        writer.flush()?;
        report.playlists_exported = playlist_index as u32;
        Ok(report)
    }

    /// Pages through one playlist's items and appends a row per usable track.
    async fn export_playlist(
        &mut self,
        writer: &mut csv::Writer<File>,
        playlist: &SimplifiedPlaylist,
        playlist_index: usize,
        report: &mut ExportReport,
    ) -> Result<(), ExportError> {
        let mut offset = 0u32;

        loop {
            self.governor.record_call().await;
            let page = with_retry("track page fetch", || {
                self.spotify.playlist_items_manual(
                    playlist.id.clone(),
                    None,
                    Some(Market::FromToken),
                    None,
                    Some(offset),
                )
            })
            .await?;

            let fetched = page.items.len() as u32;
            for item in &page.items {
                match TrackRow::from_playlist_item(
                    item,
                    playlist.id.id(),
                    &playlist.name,
                    playlist_index,
                ) {
                    Some(row) => {
                        writer.serialize(&row)?;
                        report.rows_written += 1;
                    }
                    None => {
                        warn!(
                            "Skipping track with missing metadata in playlist '{}'",
                            playlist.name
                        );
                        report.rows_skipped += 1;
                    }
                }
            }

            offset += fetched;
            if page.next.is_none() || fetched == 0 {
                break;
            }
        }

        Ok(())
    }
}

/// Opens the backup table for writing and emits the header row immediately,
/// so an export that yields no rows still leaves a well-formed file.
fn open_backup_writer(path: &Path) -> Result<csv::Writer<File>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(TrackRow::COLUMNS)?;
    Ok(writer)
}

/// `spotify_backup_<user_id>_<YYYYMMDD>.csv` with the local date.
pub fn default_backup_filename(user_id: &str) -> String {
    backup_filename(user_id, Local::now().date_naive())
}

fn backup_filename(user_id: &str, date: NaiveDate) -> String {
    format!("spotify_backup_{}_{}.csv", user_id, date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_row() -> TrackRow {
        TrackRow {
            artist_id: "a1".into(),
            track_id: "t1".into(),
            album_id: "al1".into(),
            artist_name: "Artist".into(),
            track_name: "Song".into(),
            album_name: "Album".into(),
            track_popularity: 40,
            release_date: "2020-01-01".into(),
            playlist_id: "p1".into(),
            playlist_name: "Road Trip".into(),
            playlist_index: 1,
        }
    }

    #[test]
    fn export_with_no_rows_still_writes_the_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spotify_backup_none.csv");

        let mut writer = open_backup_writer(&path).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), TrackRow::COLUMNS.join(","));
    }

    #[test]
    fn header_is_not_duplicated_once_rows_are_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spotify_backup_one.csv");

        let mut writer = open_backup_writer(&path).unwrap();
        writer.serialize(sample_row()).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], TrackRow::COLUMNS.join(","));
        assert!(lines[1].starts_with("a1,t1,al1,"));
    }

    #[test]
    fn filename_embeds_user_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            backup_filename("alice", date),
            "spotify_backup_alice_20240307.csv"
        );
    }

    #[test]
    fn filename_pads_month_and_day() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(
            backup_filename("bob_42", date),
            "spotify_backup_bob_42_20251231.csv"
        );
    }

    #[test]
    fn default_filename_matches_discovery_pattern() {
        let name = default_backup_filename("carol");
        assert!(name.starts_with("spotify_backup"));
        assert!(name.ends_with(".csv"));
    }
}
