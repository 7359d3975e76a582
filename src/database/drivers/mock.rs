use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;
use serde::Deserialize;
use url::Url;

use super::DbConnector;
use crate::database::DbError;
use crate::model::{
    Credential,
    NewSong,
    Song,
    SongId,
};

pub const DRIVER_NAME: &str = "mock";

/// In-memory tables shared by every connector made from the same target.
pub type MockStore = Arc<Mutex<MockTables>>;

/// `mock://memory` starts empty; `mock:///some/dir` loads
/// `./some/dir/database.json`.
pub fn open_store(url: &Url) -> Result<MockStore, DbError> {
    let tables = match url.path() {
        "" | "/" => MockTables::default(),
        path => {
            let data_dir = PathBuf::from(format!(".{}", path));
            MockTables::load(data_dir.join("database.json"))?
        }
    };
    Ok(tables.into_store())
}

#[derive(Debug, Deserialize)]
struct Fixtures {
    #[serde(default)]
    songs: Vec<Song>,
    #[serde(default)]
    credentials: Vec<Credential>,
}

#[derive(Debug, Default)]
pub struct MockTables {
    songs: BTreeMap<SongId, Song>,
    credentials: Vec<Credential>,
    last_song_id: i32,
}

impl MockTables {
    pub fn new(songs: Vec<Song>, credentials: Vec<Credential>) -> MockTables {
        let last_song_id = songs.iter().map(|s| s.song_id.0).max().unwrap_or(0);
        MockTables {
            songs: songs.into_iter().map(|s| (s.song_id, s)).collect(),
            credentials: credentials,
            last_song_id: last_song_id,
        }
    }

    fn load(path: PathBuf) -> Result<MockTables, DbError> {
        let mut db_json = match File::open(&path) {
            Ok(file) => file,
            Err(e) => return Err(DbError::FixturesIo { path: path, source: e }),
        };
        let fixtures: Fixtures = match serde_json::from_reader(&mut db_json) {
            Ok(fixtures) => fixtures,
            Err(e) => return Err(DbError::FixturesJson { path: path, source: e }),
        };
        Ok(MockTables::new(fixtures.songs, fixtures.credentials))
    }

    pub fn into_store(self) -> MockStore {
        Arc::new(Mutex::new(self))
    }
}

pub struct MockConnector {
    store: MockStore,
}

impl MockConnector {
    pub fn new(store: MockStore) -> MockConnector {
        MockConnector { store: store }
    }

    fn tables(&self) -> Result<MutexGuard<MockTables>, DbError> {
        self.store.lock().map_err(|_| DbError::Poisoned)
    }
}

impl DbConnector for MockConnector {
    fn list_songs(&mut self) -> Result<Vec<Song>, DbError> {
        Ok(self.tables()?.songs.values().cloned().collect())
    }

    fn song_page(&mut self, offset: usize, limit: usize) -> Result<Vec<Song>, DbError> {
        let tables = self.tables()?;
        Ok(tables.songs.values().skip(offset).take(limit).cloned().collect())
    }

    fn find_song(&mut self, id: SongId) -> Result<Option<Song>, DbError> {
        Ok(self.tables()?.songs.get(&id).cloned())
    }

    fn insert_song(&mut self, song: &NewSong) -> Result<Song, DbError> {
        let mut tables = self.tables()?;
        tables.last_song_id += 1;
        let id = SongId(tables.last_song_id);
        let row = song.clone().into_song(id, Local::now().naive_local());
        tables.songs.insert(id, row.clone());
        Ok(row)
    }

    fn update_song(&mut self, id: SongId, song: &NewSong) -> Result<Song, DbError> {
        let mut tables = self.tables()?;
        let slot = tables.songs.get_mut(&id).ok_or(DbError::Concurrency(id))?;
        *slot = song.clone().into_song(id, slot.created_date);
        Ok(slot.clone())
    }

    fn delete_song(&mut self, id: SongId) -> Result<bool, DbError> {
        Ok(self.tables()?.songs.remove(&id).is_some())
    }

    fn distinct_titles(&mut self) -> Result<Vec<String>, DbError> {
        let tables = self.tables()?;
        let mut seen = HashSet::new();
        Ok(tables.songs.values()
            .filter(|s| seen.insert(s.title.as_str()))
            .map(|s| s.title.clone())
            .collect())
    }

    fn find_songs_by_title(&mut self, title: &str) -> Result<Vec<Song>, DbError> {
        let tables = self.tables()?;
        Ok(tables.songs.values()
            .filter(|s| s.title == title)
            .cloned()
            .collect())
    }

    fn find_credentials(&mut self, username: &str, password: &str) -> Result<Vec<Credential>, DbError> {
        let tables = self.tables()?;
        let mut out: Vec<Credential> = tables.credentials.iter()
            .filter(|c| c.matches(username, password))
            .cloned()
            .collect();
        out.sort_by_key(|c| c.user_id);
        Ok(out)
    }
}
