//! Client-side routes

use std::fmt;

use core_types::ProjectId;

/// A page of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    ProjectList,
    Editor(ProjectId),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::ProjectList => "/projects".to_string(),
            Route::Editor(id) => format!("/editor/{}", id),
        }
    }

    pub fn parse(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        if path == "/projects" {
            return Some(Route::ProjectList);
        }
        let id = path.strip_prefix("/editor/")?;
        id.parse().ok().map(Route::Editor)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Router the view pushes routes to
pub trait Navigator {
    fn navigate(&mut self, route: Route);
}

/// Navigator that only remembers where it was sent
#[derive(Debug, Default, Clone)]
pub struct HistoryNavigator {
    history: Vec<Route>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.history.last().copied()
    }

    pub fn history(&self) -> &[Route] {
        &self.history
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&mut self, route: Route) {
        self.history.push(route);
    }
}
