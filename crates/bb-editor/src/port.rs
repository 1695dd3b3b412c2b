//! Where the page lives between sessions.
//!
//! Sessions never touch storage directly; they go through a
//! `PersistencePort` that stores the page's JSON text. `LocationPort`
//! models the browser address bar: the page rides in one query parameter
//! and every save replaces the location in place, the way
//! `history.replaceState` does.

use url::{ParseError, Position, Url};

pub trait PersistencePort {
    /// The last saved page JSON, if any.
    fn load(&self) -> Option<String>;
    fn save(&mut self, json: &str);
}

/// In-memory port. Counts saves so callers can assert on persistence.
#[derive(Debug, Clone, Default)]
pub struct MemoryPort {
    state: Option<String>,
    saves: usize,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// A port that already holds `json`.
    pub fn with_state(json: impl Into<String>) -> Self {
        Self {
            state: Some(json.into()),
            saves: 0,
        }
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl PersistencePort for MemoryPort {
    fn load(&self) -> Option<String> {
        self.state.clone()
    }

    fn save(&mut self, json: &str) {
        self.state = Some(json.to_string());
        self.saves += 1;
    }
}

/// Origin used to resolve path-only locations such as `/?data=...`.
const LOCAL_ORIGIN: &str = "http://localhost/";

/// A location whose query carries the page in one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationPort {
    url: Url,
    param: String,
}

impl LocationPort {
    /// Accepts an absolute URL or a path relative to the site root.
    pub fn new(location: &str, param: impl Into<String>) -> Result<Self, ParseError> {
        let url = Url::parse(LOCAL_ORIGIN)?.join(location)?;
        Ok(Self {
            url,
            param: param.into(),
        })
    }

    /// The current location as `path?query#fragment`.
    pub fn location(&self) -> &str {
        &self.url[Position::BeforePath..]
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl PersistencePort for LocationPort {
    fn load(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| *key == *self.param)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    fn save(&mut self, json: &str) {
        let others: Vec<(String, String)> = self
            .url
            .query_pairs()
            .into_owned()
            .filter(|(key, _)| *key != self.param)
            .collect();
        self.url
            .query_pairs_mut()
            .clear()
            .extend_pairs(others)
            .append_pair(&self.param, json);
        log::trace!("location replaced: {}", self.location());
    }
}
