use std::collections::HashMap;

use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::info;

use crate::Navigator;

pub const POKEMON_ID_PARAM: &str = "pokemonId";
pub const DEFAULT_DETAIL_ROUTE: &str = "/pokemon/{pokemonId}";
pub const DEFAULT_ERROR_ROUTE: &str = "/error-404";
pub const HOME_ROUTE: &str = "/";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("detail route '{template}' must contain a '{{pokemonId}}' segment")]
    MissingPokemonParam { template: String },
    #[error("route '{route}' must start with '/'")]
    NotAbsolute { route: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    detail_template: String,
    error_path: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            detail_template: DEFAULT_DETAIL_ROUTE.into(),
            error_path: DEFAULT_ERROR_ROUTE.into(),
        }
    }
}

impl RouteTable {
    pub fn new(
        detail_template: impl Into<String>,
        error_path: impl Into<String>,
    ) -> Result<Self, RouteError> {
        let detail_template = detail_template.into();
        let error_path = error_path.into();

        for route in [&detail_template, &error_path] {
            if !route.starts_with('/') {
                return Err(RouteError::NotAbsolute {
                    route: route.clone(),
                });
            }
        }

        let placeholder = format!("{{{POKEMON_ID_PARAM}}}");
        if !segments(&detail_template).any(|segment| segment == placeholder) {
            return Err(RouteError::MissingPokemonParam {
                template: detail_template,
            });
        }

        Ok(Self {
            detail_template,
            error_path,
        })
    }

    /// Canonical detail path for a pokemon name or identifier.
    pub fn detail_path(&self, name: &str) -> String {
        self.detail_template
            .replace(&format!("{{{POKEMON_ID_PARAM}}}"), name)
    }

    pub fn error_path(&self) -> &str {
        &self.error_path
    }

    /// Matches `path` against the detail template. Paths that are not a
    /// detail route yield empty parameters.
    pub fn match_path(&self, path: &str) -> RouteParams {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let template: Vec<&str> = segments(&self.detail_template).collect();
        let actual: Vec<&str> = segments(path).collect();
        if template.len() != actual.len() {
            return RouteParams::new();
        }

        let mut params = RouteParams::new();
        for (expected, value) in template.iter().zip(actual) {
            match expected
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                Some(key) => params = params.with(key, value),
                None if *expected == value => {}
                None => return RouteParams::new(),
            }
        }
        params
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}

// Navigations that land faster than a subscriber polls coalesce to the newest.
#[derive(Debug)]
pub struct Router {
    routes: RouteTable,
    location: watch::Sender<String>,
}

impl Router {
    pub fn new(routes: RouteTable, initial_path: impl Into<String>) -> Self {
        let (location, _) = watch::channel(initial_path.into());
        Self { routes, location }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn current_path(&self) -> String {
        self.location.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.location.subscribe()
    }

    pub fn params(&self) -> impl Stream<Item = RouteParams> + Send + 'static {
        let routes = self.routes.clone();
        WatchStream::new(self.location.subscribe()).map(move |path| routes.match_path(&path))
    }
}

impl Navigator for Router {
    fn navigate_to(&self, path: &str) {
        info!(path, "router: navigating");
        self.location.send_replace(path.to_string());
    }
}

#[cfg(test)]
#[path = "tests/routes_tests.rs"]
mod tests;
