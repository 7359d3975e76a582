use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::model::{NewSong, Song, SongId};
use crate::paging::Page;

const TITLE_MAX: usize = 100;
const ARTIST_MAX: usize = 100;
const ALBUM_MAX: usize = 100;
const GENRE_MAX: usize = 50;
const IMAGE_URL_MAX: usize = 255;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Song fields as submitted by the create and edit forms. Everything is
/// kept as text so a bad entry can be shown back exactly as typed.
#[derive(FromForm, Serialize, PartialEq, Default, Debug, Clone)]
pub struct SongForm {
    #[field(name = uncased("SongID"))]
    pub song_id: Option<String>,
    #[field(name = uncased("Title"))]
    pub title: Option<String>,
    #[field(name = uncased("Artist"))]
    pub artist: Option<String>,
    #[field(name = uncased("Album"))]
    pub album: Option<String>,
    #[field(name = uncased("Genre"))]
    pub genre: Option<String>,
    #[field(name = uncased("Duration"))]
    pub duration: Option<String>,
    #[field(name = uncased("ReleaseYear"))]
    pub release_year: Option<String>,
    #[field(name = uncased("ImageUrl"))]
    pub image_url: Option<String>,
    #[field(name = uncased("CreatedDate"))]
    pub created_date: Option<String>,
}

#[derive(Serialize, PartialEq, Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: String) -> FieldError {
        FieldError { field: field, message: message }
    }
}

impl SongForm {
    /// The id carried in the body, if it is one.
    pub fn song_id(&self) -> Option<SongId> {
        present(&self.song_id)
            .and_then(|v| v.trim().parse().ok())
            .map(SongId)
    }

    pub fn validate(&self) -> Result<NewSong, Vec<FieldError>> {
        let mut errors = Vec::new();

        let song = NewSong {
            title: required("Title", &self.title, TITLE_MAX, &mut errors),
            artist: required("Artist", &self.artist, ARTIST_MAX, &mut errors),
            album: optional("Album", &self.album, ALBUM_MAX, &mut errors),
            genre: optional("Genre", &self.genre, GENRE_MAX, &mut errors),
            duration: optional_int("Duration", &self.duration, &mut errors),
            release_year: optional_int("ReleaseYear", &self.release_year, &mut errors),
            image_url: optional("ImageUrl", &self.image_url, IMAGE_URL_MAX, &mut errors),
            created_date: optional_datetime("CreatedDate", &self.created_date, &mut errors),
        };

        if errors.is_empty() {
            Ok(song)
        } else {
            Err(errors)
        }
    }

    pub fn into_view(self, errors: Vec<FieldError>) -> SongEntryView {
        SongEntryView {
            entry: self,
            errors: errors,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn check_length(field: &'static str, value: &str, max: usize, errors: &mut Vec<FieldError>) {
    if value.chars().count() > max {
        errors.push(FieldError::new(field, format!(
            "The field {} must be a string with a maximum length of {}.", field, max)));
    }
}

fn required(field: &'static str, value: &Option<String>, max: usize, errors: &mut Vec<FieldError>) -> String {
    match present(value) {
        Some(v) if !v.trim().is_empty() => {
            check_length(field, v, max, errors);
            v.to_owned()
        }
        _ => {
            errors.push(FieldError::new(field, format!("The {} field is required.", field)));
            String::new()
        }
    }
}

fn optional(field: &'static str, value: &Option<String>, max: usize, errors: &mut Vec<FieldError>) -> Option<String> {
    let v = present(value)?;
    check_length(field, v, max, errors);
    Some(v.to_owned())
}

fn optional_int(field: &'static str, value: &Option<String>, errors: &mut Vec<FieldError>) -> Option<i32> {
    let v = present(value)?;
    match v.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(FieldError::new(field, format!("The value '{}' is not valid for {}.", v, field)));
            None
        }
    }
}

fn parse_datetime(v: &str) -> Option<NaiveDateTime> {
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(v, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn optional_datetime(field: &'static str, value: &Option<String>, errors: &mut Vec<FieldError>) -> Option<NaiveDateTime> {
    let v = present(value)?;
    match parse_datetime(v.trim()) {
        Some(dt) => Some(dt),
        None => {
            errors.push(FieldError::new(field, format!("The value '{}' is not valid for {}.", v, field)));
            None
        }
    }
}

/// An entry form, blank or carrying a rejected submission.
#[derive(Serialize, PartialEq, Debug)]
pub struct SongEntryView {
    pub entry: SongForm,
    pub errors: Vec<FieldError>,
}

impl SongEntryView {
    pub fn blank() -> SongEntryView {
        SongForm::default().into_view(Vec::new())
    }
}

#[derive(Serialize, Debug)]
pub struct SongListView {
    pub page_number: i64,
    pub page_count: i64,
    pub page_size: usize,
    pub total_item_count: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub items: Vec<Song>,
}

impl SongListView {
    /// Page metadata from `page`, rendered rows from `rows`.
    pub fn new(page: &Page<Song>, rows: Vec<Song>) -> SongListView {
        SongListView {
            page_number: page.page_number,
            page_count: page.page_count,
            page_size: page.page_size,
            total_item_count: page.total_item_count,
            has_previous_page: page.has_previous_page(),
            has_next_page: page.has_next_page(),
            items: rows,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct TitleListView {
    pub titles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{SongForm, FieldError};
    use crate::model::SongId;

    fn form(title: &str, artist: &str) -> SongForm {
        SongForm {
            title: Some(title.into()),
            artist: Some(artist.into()),
            ..SongForm::default()
        }
    }

    fn fields(errors: Vec<FieldError>) -> Vec<&'static str> {
        errors.into_iter().map(|e| e.field).collect()
    }

    #[test]
    fn test_minimal_entry() {
        let song = form("A", "B").validate().unwrap();
        assert_eq!(song.title, "A");
        assert_eq!(song.artist, "B");
        assert_eq!(song.album, None);
        assert_eq!(song.duration, None);
        assert_eq!(song.created_date, None);
    }

    #[test]
    fn test_required_fields() {
        let errors = SongForm::default().validate().unwrap_err();
        assert_eq!(fields(errors), vec!["Title", "Artist"]);

        let errors = form("   ", "B").validate().unwrap_err();
        assert_eq!(errors[0].message, "The Title field is required.");
    }

    #[test]
    fn test_length_limits_count_chars() {
        let mut entry = form(&"é".repeat(100), "B");
        entry.genre = Some("g".repeat(50));
        assert!(entry.validate().is_ok());

        entry.title = Some("é".repeat(101));
        entry.genre = Some("g".repeat(51));
        entry.image_url = Some("u".repeat(256));
        let errors = entry.validate().unwrap_err();
        assert_eq!(fields(errors), vec!["Title", "Genre", "ImageUrl"]);
    }

    #[test]
    fn test_numbers_and_dates() {
        let mut entry = form("A", "B");
        entry.duration = Some("215".into());
        entry.release_year = Some("".into());
        entry.created_date = Some("2024-03-01T12:30".into());
        let song = entry.validate().unwrap();
        assert_eq!(song.duration, Some(215));
        assert_eq!(song.release_year, None);
        assert_eq!(
            song.created_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(12, 30, 0)
        );

        entry.duration = Some("three minutes".into());
        entry.created_date = Some("yesterday".into());
        let errors = entry.validate().unwrap_err();
        assert_eq!(errors[0].message, "The value 'three minutes' is not valid for Duration.");
        assert_eq!(fields(errors), vec!["Duration", "CreatedDate"]);
    }

    #[test]
    fn test_body_song_id() {
        let mut entry = form("A", "B");
        assert_eq!(entry.song_id(), None);
        entry.song_id = Some("12".into());
        assert_eq!(entry.song_id(), Some(SongId(12)));
        entry.song_id = Some("twelve".into());
        assert_eq!(entry.song_id(), None);
    }
}
