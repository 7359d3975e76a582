use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct SongId(pub i32);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored song row. `song_id` is assigned by the store and never changes.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct Song {
    pub song_id: SongId,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    /// seconds
    pub duration: Option<i32>,
    pub release_year: Option<i32>,
    pub image_url: Option<String>,
    pub created_date: NaiveDateTime,
}

/// Validated song fields, as written by create and edit.
///
/// `created_date` is optional: inserts default it to the current time and
/// updates keep whatever the row already has.
#[derive(PartialEq, Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<i32>,
    pub release_year: Option<i32>,
    pub image_url: Option<String>,
    pub created_date: Option<NaiveDateTime>,
}

impl NewSong {
    /// Row for `song_id`; `created_date` is used when none was submitted.
    pub fn into_song(self, song_id: SongId, created_date: NaiveDateTime) -> Song {
        Song {
            song_id: song_id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            genre: self.genre,
            duration: self.duration,
            release_year: self.release_year,
            image_url: self.image_url,
            created_date: self.created_date.unwrap_or(created_date),
        }
    }
}

#[cfg(test)]
impl NewSong {
    pub fn titled(title: &str, artist: &str) -> NewSong {
        NewSong {
            title: title.into(),
            artist: artist.into(),
            album: None,
            genre: None,
            duration: None,
            release_year: None,
            image_url: None,
            created_date: None,
        }
    }
}
