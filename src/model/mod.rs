mod song;
mod credential;

pub use self::song::{
    SongId,
    Song,
    NewSong,
};
pub use self::credential::{
    UserId,
    Credential,
};
