use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct UserId(pub i32);

// Passwords are stored and compared as plain text.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Credential {
    pub user_id: UserId,
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}
