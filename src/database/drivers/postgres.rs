use ::postgres::{Client, NoTls, Row};

use super::DbConnector;
use crate::database::DbError;
use crate::model::{
    Credential,
    NewSong,
    Song,
    SongId,
    UserId,
};

pub const DRIVER_NAME: &str = "postgresql";
pub const DRIVER_NAME_SHORT: &str = "postgres";

const SONG_COLUMNS: &str = "
    song_id, title, artist, album, genre, duration,
    release_year, image_url, created_date
";

pub struct PostgresConnector {
    pgconn: Client,
}

impl PostgresConnector {
    pub fn connect(dburl: &str) -> Result<PostgresConnector, DbError> {
        let pgconn = Client::connect(dburl, NoTls)?;

        Ok(PostgresConnector {
            pgconn: pgconn,
        })
    }

    fn query_songs(&mut self, sql: &str, params: &[&(dyn ::postgres::types::ToSql + Sync)])
        -> Result<Vec<Song>, DbError>
    {
        let rows = self.pgconn.query(sql, params)?;
        Ok(rows.iter().map(song_from_row).collect())
    }
}

fn song_from_row(row: &Row) -> Song {
    Song {
        song_id: SongId(row.get("song_id")),
        title: row.get("title"),
        artist: row.get("artist"),
        album: row.get("album"),
        genre: row.get("genre"),
        duration: row.get("duration"),
        release_year: row.get("release_year"),
        image_url: row.get("image_url"),
        created_date: row.get("created_date"),
    }
}

impl DbConnector for PostgresConnector {
    fn list_songs(&mut self) -> Result<Vec<Song>, DbError> {
        let sql = format!("SELECT {} FROM song ORDER BY song_id", SONG_COLUMNS);
        self.query_songs(&sql, &[])
    }

    fn song_page(&mut self, offset: usize, limit: usize) -> Result<Vec<Song>, DbError> {
        let sql = format!("SELECT {} FROM song ORDER BY song_id OFFSET $1 LIMIT $2", SONG_COLUMNS);
        self.query_songs(&sql, &[&(offset as i64), &(limit as i64)])
    }

    fn find_song(&mut self, id: SongId) -> Result<Option<Song>, DbError> {
        let sql = format!("SELECT {} FROM song WHERE song_id = $1", SONG_COLUMNS);
        let row = self.pgconn.query_opt(sql.as_str(), &[&id.0])?;
        Ok(row.as_ref().map(song_from_row))
    }

    fn song_exists(&mut self, id: SongId) -> Result<bool, DbError> {
        let row = self.pgconn.query_one(
            "SELECT EXISTS (SELECT 1 FROM song WHERE song_id = $1)",
            &[&id.0],
        )?;
        Ok(row.get(0))
    }

    fn insert_song(&mut self, song: &NewSong) -> Result<Song, DbError> {
        let sql = format!("
            INSERT INTO song (title, artist, album, genre, duration, release_year, image_url, created_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, LOCALTIMESTAMP))
            RETURNING {}
        ", SONG_COLUMNS);
        let row = self.pgconn.query_one(sql.as_str(), &[
            &song.title, &song.artist, &song.album, &song.genre,
            &song.duration, &song.release_year, &song.image_url, &song.created_date,
        ])?;
        Ok(song_from_row(&row))
    }

    fn update_song(&mut self, id: SongId, song: &NewSong) -> Result<Song, DbError> {
        let sql = format!("
            UPDATE song SET
                title = $2, artist = $3, album = $4, genre = $5, duration = $6,
                release_year = $7, image_url = $8,
                created_date = COALESCE($9, created_date)
            WHERE song_id = $1
            RETURNING {}
        ", SONG_COLUMNS);
        let row = self.pgconn.query_opt(sql.as_str(), &[
            &id.0, &song.title, &song.artist, &song.album, &song.genre,
            &song.duration, &song.release_year, &song.image_url, &song.created_date,
        ])?;
        row.as_ref().map(song_from_row).ok_or(DbError::Concurrency(id))
    }

    fn delete_song(&mut self, id: SongId) -> Result<bool, DbError> {
        let deleted = self.pgconn.execute("DELETE FROM song WHERE song_id = $1", &[&id.0])?;
        Ok(deleted > 0)
    }

    fn distinct_titles(&mut self) -> Result<Vec<String>, DbError> {
        let rows = self.pgconn.query("
            SELECT title FROM song
            GROUP BY title
            ORDER BY MIN(song_id)
        ", &[])?;
        Ok(rows.iter().map(|r| r.get(0)).collect())
    }

    fn find_songs_by_title(&mut self, title: &str) -> Result<Vec<Song>, DbError> {
        let sql = format!("SELECT DISTINCT {} FROM song WHERE title = $1 ORDER BY song_id", SONG_COLUMNS);
        self.query_songs(&sql, &[&title])
    }

    fn find_credentials(&mut self, username: &str, password: &str) -> Result<Vec<Credential>, DbError> {
        let rows = self.pgconn.query("
            SELECT user_id, username, password FROM credential
                WHERE
                    username = $1 AND
                    password = $2
                ORDER BY user_id
        ", &[&username, &password])?;
        Ok(rows.iter().map(|row| Credential {
            user_id: UserId(row.get(0)),
            username: row.get(1),
            password: row.get(2),
        }).collect())
    }
}
