use rocket::request::FlashMessage;
use serde::Serialize;

mod error;
pub use self::error::{ActionError, PLEASE_LOGIN};

mod song;
pub use self::song::{
    FieldError,
    SongEntryView,
    SongForm,
    SongListView,
    TitleListView,
};

mod login;
pub use self::login::{
    LoginForm,
    LoginView,
    TitleFilterForm,
};

/// Flash cookie kind used for every one-shot message.
pub const FLASH_KIND: &str = "message";

/// What a handler hands to the render step: the model plus the flash
/// message left by the previous request, if any.
#[derive(Serialize, Debug)]
pub struct View<T> {
    pub message: Option<String>,
    pub model: T,
}

impl<T> View<T> {
    pub fn new(flash: Option<FlashMessage<'_>>, model: T) -> View<T> {
        View {
            message: flash.map(|f| f.message().to_owned()),
            model: model,
        }
    }
}
