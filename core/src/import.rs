use crate::models::TrackRow;
use crate::rate::RateGovernor;
use crate::retry::with_retry;
use log::{info, warn};
use rspotify::{
    model::{PlayableId, TrackId},
    prelude::*,
    AuthCodeSpotify,
};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Backup files are discovered by name, not by content.
pub const BACKUP_PREFIX: &str = "spotify_backup";
pub const BACKUP_EXTENSION: &str = ".csv";

/// The API accepts at most 100 track ids per add-items call.
pub const ADD_BATCH_CEILING: usize = 100;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Spotify API error: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("Failed to read backup file: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summary of a completed import run.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub playlists_created: u32,
    /// Selected names with no matching rows in the table.
    pub playlists_skipped: u32,
    pub tracks_added: u64,
}

/// Lists plain files in `dir` named `spotify_backup*.csv`, sorted by name so
/// repeated runs present the same numbering.
pub fn discover_backups(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_EXTENSION) {
            found.push(entry.path());
        }
    }

    found.sort();
    Ok(found)
}

/// A backup table loaded into memory in one pass. Playlist track lists are
/// small; holding the rows avoids re-reading the file once per playlist.
pub struct BackupTable {
    rows: Vec<TrackRow>,
}

impl BackupTable {
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(Self { rows })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Distinct playlist names, in order of first appearance.
    pub fn playlist_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for row in &self.rows {
            if seen.insert(row.playlist_name.as_str()) {
                names.push(row.playlist_name.clone());
            }
        }
        names
    }

    /// The track ids of every row tagged with `name`, in row order.
    pub fn track_ids_for(&self, name: &str) -> Vec<String> {
        self.rows
            .iter()
            .filter(|row| row.playlist_name == name)
            .map(|row| row.track_id.clone())
            .collect()
    }
}

/// Recreates selected playlists from a loaded backup table. Each selected
/// name becomes a new private playlist under the current user; the tracks
/// are added in batches of at most [`ADD_BATCH_CEILING`].
pub struct Importer {
    spotify: AuthCodeSpotify,
    governor: RateGovernor,
}

impl Importer {
    pub fn new(spotify: AuthCodeSpotify, governor: RateGovernor) -> Self {
        Self { spotify, governor }
    }

    pub async fn import(
        &mut self,
        table: &BackupTable,
        names: &[String],
    ) -> Result<ImportReport, ImportError> {
        self.governor.record_call().await;
        let user = with_retry("current user lookup", || self.spotify.current_user()).await?;

        let mut report = ImportReport::default();
        let total = names.len();
        info!("Total playlists to import: {total}");

        for (ordinal, name) in names.iter().enumerate() {
            let track_ids = table.track_ids_for(name);
            if track_ids.is_empty() {
                info!("No tracks found for playlist '{name}', skipping");
                report.playlists_skipped += 1;
                continue;
            }

            self.governor.record_call().await;
            let created = with_retry("playlist create", || {
                self.spotify
                    .user_playlist_create(user.id.clone(), name, Some(false), Some(false), None)
            })
            .await?;

            let mut added = 0u64;
            for chunk in track_ids.chunks(ADD_BATCH_CEILING) {
                let batch = to_playable_ids(chunk);
                if batch.is_empty() {
                    continue;
                }

                self.governor.record_call().await;
                with_retry("batch add", || {
                    self.spotify
                        .playlist_add_items(created.id.clone(), batch.clone(), None)
                })
                .await?;
                added += batch.len() as u64;
            }

            info!("Playlist '{name}' created with {added} tracks");
            report.playlists_created += 1;
            report.tracks_added += added;
            info!("Import progress: {}/{}", ordinal + 1, total);
        }

        Ok(report)
    }
}

/// Parses raw track ids into playable ids, dropping malformed entries with a
/// warning instead of failing the batch.
fn to_playable_ids(raw_ids: &[String]) -> Vec<PlayableId<'static>> {
    let mut playable = Vec::with_capacity(raw_ids.len());
    for raw in raw_ids {
        match TrackId::from_id(raw.clone()) {
            Ok(id) => playable.push(PlayableId::Track(id)),
            Err(err) => warn!("Skipping malformed track id '{raw}': {err}"),
        }
    }
    playable
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const HEADER: &str = "artist_id,track_id,album_id,artist_name,track_name,album_name,\
                          track_popularity,release_date,playlist_id,playlist_name,playlist_index";

    fn write_backup(dir: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        path
    }

    fn sample_rows() -> Vec<&'static str> {
        vec![
            "a1,t1,al1,Artist One,Song One,Album One,50,2019-01-01,p1,Road Trip,1",
            "a2,t2,al2,Artist Two,Song Two,Album Two,60,2020-02-02,p1,Road Trip,1",
            "a3,t3,al3,Artist Three,Song Three,Album Three,70,2021-03-03,p2,Chill,2",
            "a1,t1,al1,Artist One,Song One,Album One,50,2019-01-01,p2,Chill,2",
        ]
    }

    #[test]
    fn loads_rows_and_reports_names_in_first_appearance_order() {
        let dir = TempDir::new().unwrap();
        let path = write_backup(&dir, "spotify_backup_test.csv", &sample_rows());

        let table = BackupTable::load(&path).unwrap();

        assert_eq!(table.row_count(), 4);
        assert_eq!(table.playlist_names(), vec!["Road Trip", "Chill"]);
    }

    #[test]
    fn collects_track_ids_per_name_in_row_order() {
        let dir = TempDir::new().unwrap();
        let path = write_backup(&dir, "spotify_backup_test.csv", &sample_rows());

        let table = BackupTable::load(&path).unwrap();

        assert_eq!(table.track_ids_for("Road Trip"), vec!["t1", "t2"]);
        assert_eq!(table.track_ids_for("Chill"), vec!["t3", "t1"]);
        assert!(table.track_ids_for("Workout").is_empty());
    }

    #[test]
    fn empty_table_has_no_names() {
        let dir = TempDir::new().unwrap();
        let path = write_backup(&dir, "spotify_backup_empty.csv", &[]);

        let table = BackupTable::load(&path).unwrap();

        assert!(table.is_empty());
        assert!(table.playlist_names().is_empty());
    }

    #[test]
    fn discovery_matches_prefix_and_extension_only() {
        let dir = TempDir::new().unwrap();
        write_backup(&dir, "spotify_backup_alice_20240307.csv", &[]);
        write_backup(&dir, "spotify_backup_bob_20240101.csv", &[]);
        File::create(dir.path().join("notes.txt")).unwrap();
        File::create(dir.path().join("other_backup.csv")).unwrap();
        File::create(dir.path().join("spotify_backup_draft.csv.bak")).unwrap();

        let found = discover_backups(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "spotify_backup_alice_20240307.csv",
                "spotify_backup_bob_20240101.csv"
            ]
        );
    }

    #[test]
    fn discovery_of_empty_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover_backups(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn batching_splits_at_the_ceiling() {
        let ids: Vec<String> = (0..250).map(|i| format!("t{i}")).collect();
        let chunks: Vec<_> = ids.chunks(ADD_BATCH_CEILING).collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn malformed_track_ids_are_dropped_not_fatal() {
        let raw = vec![
            "11dFghVXANMlKmJXsNCbNl".to_string(),
            "not a track id!".to_string(),
            "2takcwOaAZWiXQijPHIx7B".to_string(),
        ];

        let playable = to_playable_ids(&raw);
        assert_eq!(playable.len(), 2);
    }
}
