//! # Projects Service
//!
//! Client side of the project backend: the project record, an HTTP client
//! for the CRUD endpoints and the project list view.
//!
//! ## Philosophy
//!
//! - **Backend owns the data**: projects are opaque records; the client only
//!   checks that a new project has a title and a description
//! - **Failures are logged, not fatal**: a failed call leaves the view as it
//!   was
//! - **Explicit collaborators**: the backend and the router are traits handed
//!   to the view, never globals
//!
//! ## Non-Goals
//!
//! - Server-side persistence
//! - Authentication
//! - Retries or backoff

pub mod api;
pub mod config;
pub mod model;
pub mod navigation;
pub mod view;

pub use api::{ApiError, ApiResult, HttpProjectApi, ProjectApi, CSRF_COOKIE, CSRF_HEADER};
pub use config::{ConfigError, ProjectsConfig};
pub use core_types::ProjectId;
pub use model::{NewProject, Project};
pub use navigation::{HistoryNavigator, Navigator, Route};
pub use view::ProjectListView;
