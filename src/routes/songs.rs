use log::{info, warn};
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::{Route, State};

use super::INDEX_PATH;
use crate::config::AppConfig;
use crate::database::drivers::DbConnector;
use crate::database::{Database, DbError};
use crate::model::{NewSong, Song, SongId};
use crate::paging;
use crate::rpc::{
    ActionError,
    SongEntryView,
    SongForm,
    SongListView,
    TitleFilterForm,
    TitleListView,
    View,
};
use crate::session::Session;

type ActionResult<T> = Result<T, ActionError>;

const DETAILS_EXAMPLE_URL: &str = "The url example : /DBSongs/Details/5";

pub fn routes() -> Vec<Route> {
    routes![
        index_root,
        index_get,
        index_post,
        create_get,
        create_post,
        details,
        details_missing,
        edit_get,
        edit_get_missing,
        edit_post,
        delete_get,
        delete_get_missing,
        delete_post,
        select_query,
        select_name,
    ]
}

#[get("/?<page>")]
async fn index_root(session: Session<'_>, db: &State<Database>, config: &State<AppConfig>,
    flash: Option<FlashMessage<'_>>, page: Option<i64>) -> ActionResult<Json<View<SongListView>>>
{
    list(session, db, config, flash, page).await
}

#[get("/Index?<page>")]
async fn index_get(session: Session<'_>, db: &State<Database>, config: &State<AppConfig>,
    flash: Option<FlashMessage<'_>>, page: Option<i64>) -> ActionResult<Json<View<SongListView>>>
{
    list(session, db, config, flash, page).await
}

#[post("/Index?<page>")]
async fn index_post(session: Session<'_>, db: &State<Database>, config: &State<AppConfig>,
    flash: Option<FlashMessage<'_>>, page: Option<i64>) -> ActionResult<Json<View<SongListView>>>
{
    list(session, db, config, flash, page).await
}

/// Page metadata comes from the paginator over the whole table; the rows
/// shown are sliced by the store itself. Both use the same number and size.
async fn list(session: Session<'_>, db: &Database, config: &AppConfig,
    flash: Option<FlashMessage<'_>>, page: Option<i64>) -> ActionResult<Json<View<SongListView>>>
{
    session.require_login()?;

    let page_size = config.paging.page_size;
    let songs = db.read(|conn| conn.list_songs()).await?;
    let page = paging::paginate(songs, page, page_size)
        .map_err(|invalid| {
            warn!("rejected song list request: {}", invalid);
            invalid
        })?;

    let offset = page.offset();
    let rows = db.read(move |conn| conn.song_page(offset, page_size)).await?;
    if rows != page.items {
        warn!("song list page {} changed between queries", page.page_number);
    }

    Ok(Json(View::new(flash, SongListView::new(&page, rows))))
}

#[get("/Create")]
fn create_get(session: Session<'_>, flash: Option<FlashMessage<'_>>) -> ActionResult<Json<View<SongEntryView>>> {
    session.require_login()?;
    Ok(Json(View::new(flash, SongEntryView::blank())))
}

#[post("/Create", data = "<form>")]
async fn create_post(session: Session<'_>, db: &State<Database>, form: Option<Form<SongForm>>) -> ActionResult<Redirect> {
    session.require_login()?;

    let form = form.map(Form::into_inner).unwrap_or_default();
    let song = match form.validate() {
        Ok(song) => song,
        Err(errors) => return Err(ActionError::Invalid(form.into_view(errors))),
    };

    let created = db.write(move |conn| conn.insert_song(&song)).await?;
    info!("created song {} ({})", created.song_id, created.title);
    Ok(Redirect::to(INDEX_PATH))
}

#[get("/Details/<id>")]
async fn details(session: Session<'_>, db: &State<Database>, flash: Option<FlashMessage<'_>>,
    id: Option<i32>) -> ActionResult<Json<View<Song>>>
{
    session.require_login()?;

    let id = id.map(SongId).ok_or(ActionError::MissingId { example_url: DETAILS_EXAMPLE_URL })?;
    let song = find_song(db, id).await?;
    Ok(Json(View::new(flash, song)))
}

#[get("/Details")]
fn details_missing(session: Session<'_>) -> ActionResult<Json<View<Song>>> {
    session.require_login()?;
    Err(ActionError::MissingId { example_url: DETAILS_EXAMPLE_URL })
}

#[get("/Edit/<id>")]
async fn edit_get(session: Session<'_>, db: &State<Database>, flash: Option<FlashMessage<'_>>,
    id: Option<i32>) -> ActionResult<Json<View<Song>>>
{
    session.require_login()?;

    let id = id.map(SongId).ok_or(ActionError::NotFound)?;
    let song = find_song(db, id).await?;
    Ok(Json(View::new(flash, song)))
}

#[get("/Edit")]
fn edit_get_missing(session: Session<'_>) -> ActionResult<Json<View<Song>>> {
    session.require_login()?;
    Err(ActionError::NotFound)
}

#[post("/Edit/<id>", data = "<form>")]
async fn edit_post(session: Session<'_>, db: &State<Database>, id: Option<i32>,
    form: Option<Form<SongForm>>) -> ActionResult<Redirect>
{
    session.require_login()?;

    let id = id.map(SongId).ok_or(ActionError::NotFound)?;
    let form = form.map(Form::into_inner).unwrap_or_default();
    if form.song_id() != Some(id) {
        return Err(ActionError::NotFound);
    }

    let song = match form.validate() {
        Ok(song) => song,
        Err(errors) => return Err(ActionError::Invalid(form.into_view(errors))),
    };

    match db.write(move |conn| update_or_recheck(conn, id, &song)).await? {
        Some(updated) => {
            info!("updated song {}", updated.song_id);
            Ok(Redirect::to(INDEX_PATH))
        }
        None => Err(ActionError::NotFound),
    }
}

/// A row that disappears under the update is `None` once a second look
/// confirms it is gone; if it is still there the fault is returned as is.
fn update_or_recheck(conn: &mut dyn DbConnector, id: SongId, song: &NewSong) -> Result<Option<Song>, DbError> {
    match conn.update_song(id, song) {
        Ok(updated) => Ok(Some(updated)),
        Err(DbError::Concurrency(id)) => {
            if conn.song_exists(id)? {
                Err(DbError::Concurrency(id))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(e),
    }
}

#[get("/Delete/<id>")]
async fn delete_get(session: Session<'_>, db: &State<Database>, flash: Option<FlashMessage<'_>>,
    id: Option<i32>) -> ActionResult<Json<View<Song>>>
{
    session.require_login()?;

    let id = id.map(SongId).ok_or(ActionError::NotFound)?;
    let song = find_song(db, id).await?;
    Ok(Json(View::new(flash, song)))
}

#[get("/Delete")]
fn delete_get_missing(session: Session<'_>) -> ActionResult<Json<View<Song>>> {
    session.require_login()?;
    Err(ActionError::NotFound)
}

/// Unknown or unreadable ids are a no-op; the caller lands on the list either way.
#[post("/Delete/<id>")]
async fn delete_post(session: Session<'_>, db: &State<Database>, id: Option<i32>) -> ActionResult<Redirect> {
    session.require_login()?;

    let id = match id {
        Some(id) => SongId(id),
        None => return Ok(Redirect::to(INDEX_PATH)),
    };
    if db.write(move |conn| conn.delete_song(id)).await? {
        info!("deleted song {}", id);
    }
    Ok(Redirect::to(INDEX_PATH))
}

#[get("/SelectQuery")]
async fn select_query(session: Session<'_>, db: &State<Database>, flash: Option<FlashMessage<'_>>)
    -> ActionResult<Json<View<TitleListView>>>
{
    session.require_login()?;

    let titles = db.read(|conn| conn.distinct_titles()).await?;
    Ok(Json(View::new(flash, TitleListView { titles: titles })))
}

#[post("/SelectName", data = "<form>")]
async fn select_name(session: Session<'_>, db: &State<Database>, flash: Option<FlashMessage<'_>>,
    form: Option<Form<TitleFilterForm>>) -> ActionResult<Json<View<Vec<Song>>>>
{
    session.require_login()?;

    let title = form.and_then(|f| f.into_inner().f_title).unwrap_or_default();
    let songs = db.read(move |conn| conn.find_songs_by_title(&title)).await?;
    Ok(Json(View::new(flash, songs)))
}

async fn find_song(db: &Database, id: SongId) -> ActionResult<Song> {
    db.read(move |conn| conn.find_song(id)).await?
        .ok_or(ActionError::NotFound)
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;
    use rocket::local::blocking::Client;
    use rocket::response::Responder;

    use super::update_or_recheck;
    use crate::database::DbError;
    use crate::database::drivers::DbConnector;
    use crate::database::drivers::mock::{MockConnector, MockTables};
    use crate::database::drivers::mock::tests::song;
    use crate::model::{Credential, NewSong, Song, SongId};
    use crate::rpc::ActionError;

    /// Loses every update race while leaving the row in place.
    struct RacingConnector(MockConnector);

    impl DbConnector for RacingConnector {
        fn list_songs(&mut self) -> Result<Vec<Song>, DbError> {
            self.0.list_songs()
        }

        fn song_page(&mut self, offset: usize, limit: usize) -> Result<Vec<Song>, DbError> {
            self.0.song_page(offset, limit)
        }

        fn find_song(&mut self, id: SongId) -> Result<Option<Song>, DbError> {
            self.0.find_song(id)
        }

        fn insert_song(&mut self, song: &NewSong) -> Result<Song, DbError> {
            self.0.insert_song(song)
        }

        fn update_song(&mut self, id: SongId, _song: &NewSong) -> Result<Song, DbError> {
            Err(DbError::Concurrency(id))
        }

        fn delete_song(&mut self, id: SongId) -> Result<bool, DbError> {
            self.0.delete_song(id)
        }

        fn distinct_titles(&mut self) -> Result<Vec<String>, DbError> {
            self.0.distinct_titles()
        }

        fn find_songs_by_title(&mut self, title: &str) -> Result<Vec<Song>, DbError> {
            self.0.find_songs_by_title(title)
        }

        fn find_credentials(&mut self, username: &str, password: &str) -> Result<Vec<Credential>, DbError> {
            self.0.find_credentials(username, password)
        }
    }

    fn mock(songs: Vec<Song>) -> MockConnector {
        MockConnector::new(MockTables::new(songs, vec![]).into_store())
    }

    #[test]
    fn test_update_or_recheck() {
        let mut conn = mock(vec![song(1, "Old")]);
        let updated = update_or_recheck(&mut conn, SongId(1), &NewSong::titled("New", "A")).unwrap();
        assert_eq!(updated.map(|s| s.title).as_deref(), Some("New"));

        let gone = update_or_recheck(&mut conn, SongId(2), &NewSong::titled("New", "A")).unwrap();
        assert!(gone.is_none());
    }

    #[test]
    fn test_lost_update_on_live_row_is_fatal() {
        let mut conn = RacingConnector(mock(vec![song(1, "Old")]));
        let err = match update_or_recheck(&mut conn, SongId(1), &NewSong::titled("New", "A")) {
            Err(e @ DbError::Concurrency(SongId(1))) => e,
            other => panic!("expected concurrency error, got {:?}", other),
        };
        assert_eq!(conn.find_song(SongId(1)).unwrap().unwrap().title, "Old");

        let client = Client::untracked(rocket::build()).unwrap();
        let req = client.post("/DBSongs/Edit/1");
        match ActionError::Database(err).respond_to(req.inner()) {
            Err(status) => assert_eq!(status, Status::InternalServerError),
            Ok(_) => panic!("expected an error status"),
        }
    }
}
