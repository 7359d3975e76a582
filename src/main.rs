#[macro_use] extern crate rocket;

use std::path::PathBuf;

use anyhow::Context;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Build, Request, Rocket};
use serde::Serialize;

mod config;
mod database;
mod model;
mod paging;
mod rpc;
mod routes;
mod session;

use self::config::AppConfig;
use self::database::Database;
use self::session::SessionStore;

const DEFAULT_CONFIG: &str = "songbook.toml";

#[derive(Serialize)]
struct StatusBody {
    statuscode: u16,
    error: &'static str,
}

#[catch(default)]
fn status_catcher(status: Status, _request: &Request) -> (Status, Json<StatusBody>) {
    (status, Json(StatusBody {
        statuscode: status.code,
        error: status.reason().unwrap_or("Unknown"),
    }))
}

fn build(app: AppConfig, database: Database) -> Rocket<Build> {
    let sessions = SessionStore::new(&app.session);

    rocket::build()
        .mount(routes::BASE, routes::db_songs())
        .register("/", catchers![status_catcher])
        .manage(database)
        .manage(sessions)
        .manage(app)
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let config_file = std::env::args_os().nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let app = AppConfig::load(&config_file)
        .with_context(|| format!("error loading config {}", config_file.display()))?;
    let database = Database::from_config(&app.database)
        .context("error opening database")?;

    let _rocket = build(app, database).launch().await?;
    Ok(())
}
