//! Server-side sessions keyed by a random token carried in an http-only
//! cookie. Each session holds string values and expires after sitting idle
//! for longer than the configured timeout; every read or write refreshes it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::debug;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::{outcome::try_outcome, State};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::rpc::ActionError;

pub const USERNAME_KEY: &str = "username";

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn generate() -> SessionToken {
        SessionToken(Uuid::new_v4())
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(val: &str) -> Result<SessionToken, uuid::Error> {
        Ok(SessionToken(Uuid::parse_str(val)?))
    }
}

struct SessionEntry {
    values: HashMap<String, String>,
    last_access: Instant,
}

pub struct SessionStore {
    idle_timeout: Duration,
    cookie_name: String,
    entries: Mutex<HashMap<SessionToken, SessionEntry>>,
}

impl SessionStore {
    pub fn new(config: &SessionConfig) -> SessionStore {
        SessionStore {
            idle_timeout: config.idle_timeout(),
            cookie_name: config.cookie_name.clone(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn get(&self, token: &SessionToken, key: &str) -> Option<String> {
        self.get_at(token, key, Instant::now())
    }

    pub fn set(&self, token: &SessionToken, key: &str, value: &str) {
        self.set_at(token, key, value, Instant::now())
    }

    /// Drops the session outright.
    pub fn remove(&self, token: &SessionToken) {
        self.entries().remove(token);
    }

    fn entries(&self) -> MutexGuard<HashMap<SessionToken, SessionEntry>> {
        // a panic while holding the lock leaves the map itself intact
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_access) > self.idle_timeout
    }

    fn get_at(&self, token: &SessionToken, key: &str, now: Instant) -> Option<String> {
        let mut entries = self.entries();
        let expired = match entries.get(token) {
            Some(entry) => self.is_expired(entry, now),
            None => return None,
        };
        if expired {
            debug!("session {} expired", token);
            entries.remove(token);
            return None;
        }
        let entry = entries.get_mut(token)?;
        entry.last_access = now;
        entry.values.get(key).cloned()
    }

    fn set_at(&self, token: &SessionToken, key: &str, value: &str, now: Instant) {
        let mut entries = self.entries();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        let entry = entries.entry(*token).or_insert_with(|| SessionEntry {
            values: HashMap::new(),
            last_access: now,
        });
        entry.last_access = now;
        entry.values.insert(key.to_owned(), value.to_owned());
    }
}

/// The caller's session. Hands out a fresh token cookie when the request
/// carries none (or an unreadable one).
pub struct Session<'r> {
    store: &'r SessionStore,
    cookies: &'r CookieJar<'r>,
    token: SessionToken,
}

impl<'r> Session<'r> {
    pub fn username(&self) -> Option<String> {
        self.store.get(&self.token, USERNAME_KEY)
    }

    /// Logs `username` in under a fresh token, so a token handed out before
    /// login never carries the logged-in session.
    pub fn log_in(&mut self, username: &str) {
        let fresh = SessionToken::generate();
        self.store.remove(&self.token);
        self.store.set(&fresh, USERNAME_KEY, username);
        self.cookies.add(token_cookie(self.store, &fresh));
        self.token = fresh;
    }

    /// Gate for every song action: the logged-in username, or a redirect
    /// to the login form.
    pub fn require_login(&self) -> Result<String, ActionError> {
        self.username().ok_or(ActionError::Unauthenticated)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session<'r> {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, ()> {
        let store: &'r SessionStore = try_outcome!(request.guard::<&State<SessionStore>>().await).inner();
        let cookies = request.cookies();

        let existing = cookies.get(store.cookie_name())
            .and_then(|c| c.value().parse::<SessionToken>().ok());
        let token = match existing {
            Some(token) => token,
            None => {
                let token = SessionToken::generate();
                cookies.add(token_cookie(store, &token));
                token
            }
        };

        Outcome::Success(Session {
            store: store,
            cookies: cookies,
            token: token,
        })
    }
}

fn token_cookie(store: &SessionStore, token: &SessionToken) -> Cookie<'static> {
    Cookie::build((store.cookie_name().to_owned(), token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{SessionStore, SessionToken, USERNAME_KEY};
    use crate::config::SessionConfig;

    fn store() -> SessionStore {
        SessionStore::new(&SessionConfig::default())
    }

    #[test]
    fn test_set_then_get() {
        let store = store();
        let token = SessionToken::generate();
        assert_eq!(store.get(&token, USERNAME_KEY), None);
        store.set(&token, USERNAME_KEY, "alice");
        assert_eq!(store.get(&token, USERNAME_KEY).as_deref(), Some("alice"));
        assert_eq!(store.get(&SessionToken::generate(), USERNAME_KEY), None);
    }

    #[test]
    fn test_idle_expiry() {
        let store = store();
        let token = SessionToken::generate();
        let start = Instant::now();
        store.set_at(&token, USERNAME_KEY, "alice", start);

        let late = start + Duration::from_secs(31 * 60);
        assert_eq!(store.get_at(&token, USERNAME_KEY, late), None);
        assert_eq!(store.entries().len(), 0);
    }

    #[test]
    fn test_sliding_expiry() {
        let store = store();
        let token = SessionToken::generate();
        let start = Instant::now();
        store.set_at(&token, USERNAME_KEY, "alice", start);

        // each read pushes expiry another 30 minutes out
        let mut now = start;
        for _ in 0..4 {
            now += Duration::from_secs(20 * 60);
            assert_eq!(store.get_at(&token, USERNAME_KEY, now).as_deref(), Some("alice"));
        }
        now += Duration::from_secs(30 * 60 + 1);
        assert_eq!(store.get_at(&token, USERNAME_KEY, now), None);
    }

    #[test]
    fn test_set_purges_expired_sessions() {
        let store = store();
        let start = Instant::now();
        store.set_at(&SessionToken::generate(), USERNAME_KEY, "old", start);
        store.set_at(&SessionToken::generate(), USERNAME_KEY, "new", start + Duration::from_secs(3600));
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn test_remove() {
        let store = store();
        let token = SessionToken::generate();
        store.set(&token, USERNAME_KEY, "alice");
        store.remove(&token);
        assert_eq!(store.get(&token, USERNAME_KEY), None);
        assert_eq!(store.entries().len(), 0);
    }

    #[test]
    fn test_token_round_trip() {
        let token = SessionToken::generate();
        let parsed: SessionToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
        assert!("not-a-token".parse::<SessionToken>().is_err());
    }
}
