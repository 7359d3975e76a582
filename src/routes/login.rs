use log::info;
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket::serde::json::Json;
use rocket::{Route, State};

use super::{INDEX_PATH, LOGIN_PATH, LOGIN_SESSION_PATH};
use crate::database::Database;
use crate::rpc::{ActionError, LoginForm, LoginView, View, FLASH_KIND};
use crate::session::Session;

pub const MISSING_CREDENTIALS: &str = "Please enter account and password!";
pub const LOGGED_IN: &str = "Logged in!";
pub const LOGIN_FAILED: &str = "Login failed!";

pub fn routes() -> Vec<Route> {
    routes![
        login_get,
        login_post,
        login_session_get,
        login_session_post,
    ]
}

#[get("/Login")]
fn login_get(flash: Option<FlashMessage<'_>>) -> Json<View<LoginView>> {
    Json(View::new(flash, LoginView { action: LOGIN_PATH }))
}

#[post("/Login", data = "<form>")]
async fn login_post(mut session: Session<'_>, db: &State<Database>, form: Form<LoginForm>)
    -> Result<Flash<Redirect>, ActionError>
{
    attempt_login(LOGIN_PATH, &mut session, db, form.into_inner()).await
}

#[get("/Login_Session")]
fn login_session_get(flash: Option<FlashMessage<'_>>) -> Json<View<LoginView>> {
    Json(View::new(flash, LoginView { action: LOGIN_SESSION_PATH }))
}

#[post("/Login_Session", data = "<form>")]
async fn login_session_post(mut session: Session<'_>, db: &State<Database>, form: Form<LoginForm>)
    -> Result<Flash<Redirect>, ActionError>
{
    attempt_login(LOGIN_SESSION_PATH, &mut session, db, form.into_inner()).await
}

/// Any credential row equal on both username and password logs the caller
/// in. Every other outcome sends them back to the form at `form_path`.
async fn attempt_login(form_path: &'static str, session: &mut Session<'_>, db: &Database, form: LoginForm)
    -> Result<Flash<Redirect>, ActionError>
{
    let (username, password) = match form.credentials() {
        Some((username, password)) => (username.to_owned(), password.to_owned()),
        None => return Ok(Flash::new(Redirect::to(form_path), FLASH_KIND, MISSING_CREDENTIALS)),
    };

    let lookup = username.clone();
    let matches = db.read(move |conn| conn.find_credentials(&lookup, &password)).await?;
    if matches.is_empty() {
        info!("login failed for {}", username);
        return Ok(Flash::new(Redirect::to(form_path), FLASH_KIND, LOGIN_FAILED));
    }

    session.log_in(&username);
    info!("{} logged in", username);
    Ok(Flash::new(Redirect::to(INDEX_PATH), FLASH_KIND, LOGGED_IN))
}
