use log::info;
use url::Url;

pub mod postgres;
pub mod mock;

use super::DbError;
use crate::model::{
    Credential,
    NewSong,
    Song,
    SongId,
};

/// Typed queries over the song and credential tables. Songs always come back
/// ordered by `song_id` ascending.
pub trait DbConnector {
    fn list_songs(&mut self) -> Result<Vec<Song>, DbError>;

    /// `offset`/`limit` slice of `list_songs`, computed by the store.
    fn song_page(&mut self, offset: usize, limit: usize) -> Result<Vec<Song>, DbError>;

    fn find_song(&mut self, id: SongId) -> Result<Option<Song>, DbError>;

    fn song_exists(&mut self, id: SongId) -> Result<bool, DbError> {
        Ok(self.find_song(id)?.is_some())
    }

    fn insert_song(&mut self, song: &NewSong) -> Result<Song, DbError>;

    /// Fails with `DbError::Concurrency` when no row with `id` is left to update.
    fn update_song(&mut self, id: SongId, song: &NewSong) -> Result<Song, DbError>;

    /// Returns whether a row was removed.
    fn delete_song(&mut self, id: SongId) -> Result<bool, DbError>;

    /// Distinct titles, in order of the first song carrying each one.
    fn distinct_titles(&mut self) -> Result<Vec<String>, DbError>;

    /// Exact title matches, one entry per song.
    fn find_songs_by_title(&mut self, title: &str) -> Result<Vec<Song>, DbError>;

    /// Every credential row matching both fields exactly, ordered by user id.
    fn find_credentials(&mut self, username: &str, password: &str) -> Result<Vec<Credential>, DbError>;
}

/// Where connectors come from, picked by the scheme of a database url.
#[derive(Clone)]
pub enum DriverTarget {
    Postgres(String),
    Mock(mock::MockStore),
}

impl DriverTarget {
    pub fn from_url(url_raw: &str) -> Result<DriverTarget, DbError> {
        let url = Url::parse(url_raw)?;

        info!("getting driver {}", url.scheme());
        match url.scheme() {
            postgres::DRIVER_NAME | postgres::DRIVER_NAME_SHORT => Ok(DriverTarget::Postgres(url_raw.to_owned())),
            mock::DRIVER_NAME => Ok(DriverTarget::Mock(mock::open_store(&url)?)),
            other => Err(DbError::UnknownScheme(other.to_owned())),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match *self {
            DriverTarget::Postgres(_) => postgres::DRIVER_NAME,
            DriverTarget::Mock(_) => mock::DRIVER_NAME,
        }
    }

    pub fn connect(&self) -> Result<Box<dyn DbConnector>, DbError> {
        match *self {
            DriverTarget::Postgres(ref url) => Ok(Box::new(postgres::PostgresConnector::connect(url)?)),
            DriverTarget::Mock(ref store) => Ok(Box::new(mock::MockConnector::new(store.clone()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DriverTarget;
    use crate::database::DbError;

    #[test]
    fn test_unknown_scheme() {
        match DriverTarget::from_url("sqlite:///tmp/songs.db") {
            Err(DbError::UnknownScheme(scheme)) => assert_eq!(scheme, "sqlite"),
            _ => panic!("expected unknown scheme"),
        }
    }

    #[test]
    fn test_bad_url() {
        assert!(matches!(DriverTarget::from_url("not a url"), Err(DbError::Url(_))));
    }

    #[test]
    fn test_dispatch_by_scheme() {
        let pg = DriverTarget::from_url("postgresql://catalog@localhost/catalog").unwrap();
        assert_eq!(pg.scheme(), "postgresql");
        let mock = DriverTarget::from_url("mock://memory").unwrap();
        assert_eq!(mock.scheme(), "mock");
    }
}
