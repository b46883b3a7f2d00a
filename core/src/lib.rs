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

pub mod auth;
pub mod export;
pub mod import;
pub mod models;
pub mod rate;
mod retry;
pub mod select;

// Re-export key items for convenience
pub use auth::{get_spotify_client, SessionScope};
pub use export::{ExportReport, Exporter};
pub use import::{discover_backups, BackupTable, ImportReport, Importer};
pub use models::TrackRow;
pub use rate::RateGovernor;
pub use select::{parse_selection, Selection};
