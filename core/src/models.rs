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

use rspotify::model::{FullTrack, Id, PlayableItem, PlaylistItem};
use serde::{Deserialize, Serialize};

/// One backup row: one track inside one playlist. A track that appears in
/// several playlists produces one row per playlist. The serde field order is
/// the CSV column order, so changing it changes the file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRow {
    pub artist_id: String,
    pub track_id: String,
    pub album_id: String,
    pub artist_name: String,
    pub track_name: String,
    pub album_name: String,
    pub track_popularity: u32,
    pub release_date: String,
    pub playlist_id: String,
    pub playlist_name: String,
    /// 1-based position of the playlist within the export run's fetch order.
    /// Not stable across runs.
    pub playlist_index: usize,
}

impl TrackRow {
    /// CSV column names, in serde field order. The exporter writes this
    /// header up front so even a table with no rows is well-formed.
    pub const COLUMNS: [&'static str; 11] = [
        "artist_id",
        "track_id",
        "album_id",
        "artist_name",
        "track_name",
        "album_name",
        "track_popularity",
        "release_date",
        "playlist_id",
        "playlist_name",
        "playlist_index",
    ];

    /// Flattens a playlist item into a row, tagged with the playlist it came
    /// from. Returns `None` for podcast episodes and for tracks missing the
    /// identifiers the backup needs (removed or local tracks have no track
    /// id, and some have no artist or album id either). A missing release
    /// date alone is not disqualifying; it serializes as an empty field.
    pub fn from_playlist_item(
        item: &PlaylistItem,
        playlist_id: &str,
        playlist_name: &str,
        playlist_index: usize,
    ) -> Option<Self> {
        match item.track.as_ref() {
            Some(PlayableItem::Track(track)) => {
                Self::from_full_track(track, playlist_id, playlist_name, playlist_index)
            }
            _ => None,
        }
    }

    fn from_full_track(
        track: &FullTrack,
        playlist_id: &str,
        playlist_name: &str,
        playlist_index: usize,
    ) -> Option<Self> {
        let track_id = track.id.as_ref()?.id().to_string();
        let artist = track.artists.first()?;
        let artist_id = artist.id.as_ref()?.id().to_string();
        let album_id = track.album.id.as_ref()?.id().to_string();

        Some(Self {
            artist_id,
            track_id,
            album_id,
            artist_name: artist.name.clone(),
            track_name: track.name.clone(),
            album_name: track.album.name.clone(),
            track_popularity: track.popularity,
            release_date: track.album.release_date.clone().unwrap_or_default(),
            playlist_id: playlist_id.to_string(),
            playlist_name: playlist_name.to_string(),
            playlist_index,
        })
    }
}
