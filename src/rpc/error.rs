use log::error;
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Flash, Redirect, Responder};
use rocket::serde::json::Json;
use serde::Serialize;

use super::song::SongEntryView;
use crate::database::DbError;
use crate::paging::InvalidPage;
use crate::routes::LOGIN_PATH;

pub const PLEASE_LOGIN: &str = "Please Login!";

#[derive(Serialize, Debug)]
pub struct BadRequestBody {
    pub statuscode: u16,
    pub error: String,
    pub url: &'static str,
}

/// Every way a song action can end other than its normal result. Each one
/// becomes a redirect, a status-coded response or a re-rendered form.
#[derive(Debug)]
pub enum ActionError {
    /// no username in the session
    Unauthenticated,
    /// request needs an id and has none
    MissingId {
        example_url: &'static str,
    },
    InvalidPage(InvalidPage),
    NotFound,
    /// submitted entry failed validation, shown again with field errors
    Invalid(SongEntryView),
    Database(DbError),
}

impl From<DbError> for ActionError {
    fn from(e: DbError) -> ActionError {
        ActionError::Database(e)
    }
}

impl From<InvalidPage> for ActionError {
    fn from(e: InvalidPage) -> ActionError {
        ActionError::InvalidPage(e)
    }
}

impl<'r> Responder<'r, 'static> for ActionError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        match self {
            ActionError::Unauthenticated => {
                Flash::new(Redirect::to(LOGIN_PATH), super::FLASH_KIND, PLEASE_LOGIN)
                    .respond_to(request)
            }
            ActionError::MissingId { example_url } => {
                let body = BadRequestBody {
                    statuscode: Status::BadRequest.code,
                    error: "Invalid request, an Id must be provided".into(),
                    url: example_url,
                };
                (Status::BadRequest, Json(body)).respond_to(request)
            }
            ActionError::InvalidPage(invalid) => {
                let body = BadRequestBody {
                    statuscode: Status::BadRequest.code,
                    error: invalid.to_string(),
                    url: "The url example : /DBSongs/Index?page=1",
                };
                (Status::BadRequest, Json(body)).respond_to(request)
            }
            ActionError::NotFound => Err(Status::NotFound),
            ActionError::Invalid(view) => {
                (Status::UnprocessableEntity, Json(view)).respond_to(request)
            }
            ActionError::Database(e) => {
                error!("{} {}: {}", request.method(), request.uri(), e);
                Err(Status::InternalServerError)
            }
        }
    }
}
