use rocket::Route;

mod songs;
mod login;

pub const BASE: &str = "/DBSongs";
pub const INDEX_PATH: &str = "/DBSongs/Index";
pub const LOGIN_PATH: &str = "/DBSongs/Login";
pub const LOGIN_SESSION_PATH: &str = "/DBSongs/Login_Session";

/// Every action, to be mounted at `BASE`.
pub fn db_songs() -> Vec<Route> {
    let mut routes = songs::routes();
    routes.extend(login::routes());
    routes
}
