//! Project list view
//!
//! Holds the list shown to the user, the create dialog and the pending
//! delete confirmation. Every backend failure is logged and leaves the view
//! exactly as it was.

use core_types::ProjectId;
use services_logger::{LogEntry, SharedLogger};

use crate::api::ProjectApi;
use crate::model::{NewProject, Project};
use crate::navigation::{Navigator, Route};

const LOG_SOURCE: &str = "projects";

/// The project manager page
pub struct ProjectListView<A, N> {
    api: A,
    navigator: N,
    logger: SharedLogger,
    projects: Vec<Project>,
    create_dialog_open: bool,
    draft: NewProject,
    pending_delete: Option<ProjectId>,
}

impl<A: ProjectApi, N: Navigator> ProjectListView<A, N> {
    pub fn new(api: A, navigator: N, logger: SharedLogger) -> Self {
        Self {
            api,
            navigator,
            logger,
            projects: Vec::new(),
            create_dialog_open: false,
            draft: NewProject::default(),
            pending_delete: None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn is_create_dialog_open(&self) -> bool {
        self.create_dialog_open
    }

    pub fn draft(&self) -> &NewProject {
        &self.draft
    }

    pub fn pending_delete(&self) -> Option<ProjectId> {
        self.pending_delete
    }

    /// Fetches the list, then primes the CSRF token
    pub fn load(&mut self) {
        match self.api.list() {
            Ok(projects) => {
                self.logger.log(
                    LogEntry::debug("Projects fetched")
                        .with_source(LOG_SOURCE)
                        .with_field("count", projects.len()),
                );
                self.projects = projects;
            }
            Err(err) => self.log_error("Error fetching projects", err),
        }
        if let Err(err) = self.api.prime_csrf() {
            self.log_error("Error obtaining CSRF token", err);
        }
    }

    pub fn open_create_dialog(&mut self) {
        self.create_dialog_open = true;
    }

    /// Closes the dialog; the draft is kept for the next opening
    pub fn close_create_dialog(&mut self) {
        self.create_dialog_open = false;
    }

    pub fn set_new_title(&mut self, title: impl Into<String>) {
        self.draft.title = title.into();
    }

    pub fn set_new_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    /// Submits the draft
    ///
    /// Does nothing unless both fields are filled in. On success the project
    /// is appended, the form reset, the dialog closed and the editor route
    /// opened.
    pub fn create_project(&mut self) -> Option<ProjectId> {
        if !self.draft.is_complete() {
            return None;
        }
        match self.api.create(&self.draft) {
            Ok(project) => {
                let id = project.id;
                self.logger.log(
                    LogEntry::info("Project created")
                        .with_source(LOG_SOURCE)
                        .with_field("id", id),
                );
                self.projects.push(project);
                self.draft.clear();
                self.create_dialog_open = false;
                self.navigator.navigate(Route::Editor(id));
                Some(id)
            }
            Err(err) => {
                self.log_error("Error creating project", err);
                None
            }
        }
    }

    pub fn confirm_delete(&mut self, id: ProjectId) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes `id` on the backend, then drops it from the list
    pub fn delete_project(&mut self, id: ProjectId) -> bool {
        match self.api.delete(id) {
            Ok(()) => {
                self.projects.retain(|p| p.id != id);
                self.pending_delete = None;
                self.logger.log(
                    LogEntry::info("Project deleted")
                        .with_source(LOG_SOURCE)
                        .with_field("id", id),
                );
                true
            }
            Err(err) => {
                self.log_error("Error deleting project", err);
                false
            }
        }
    }

    /// Deletes the project awaiting confirmation, if any
    pub fn delete_pending(&mut self) -> bool {
        match self.pending_delete {
            Some(id) => self.delete_project(id),
            None => false,
        }
    }

    pub fn access_editor(&mut self, id: ProjectId) {
        self.navigator.navigate(Route::Editor(id));
    }

    /// Plain-text rendering of the list
    pub fn render(&self) -> String {
        let mut out = String::new();
        for project in &self.projects {
            out.push_str(&format!("#{} Project Title: {}\n", project.id, project.title));
            out.push_str("Project Description:\n");
            out.push_str(&project.description);
            out.push('\n');
        }
        if self.projects.is_empty() {
            out.push_str("(no projects)\n");
        }
        out
    }

    fn log_error(&self, message: &str, err: impl std::fmt::Display) {
        self.logger.log(
            LogEntry::error(message)
                .with_source(LOG_SOURCE)
                .with_field("error", err),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ApiResult};
    use crate::navigation::HistoryNavigator;
    use services_logger::{LogLevel, MemoryLogger};
    use std::cell::{Cell, RefCell};
    use std::sync::Arc;

    /// In-memory backend; `fail` makes every call error
    #[derive(Default)]
    struct FakeApi {
        projects: RefCell<Vec<Project>>,
        next_id: Cell<i64>,
        primed: Cell<bool>,
        fail: Cell<bool>,
    }

    impl FakeApi {
        fn with(projects: Vec<Project>) -> Self {
            let next = projects.iter().map(|p| p.id.as_i64()).max().unwrap_or(0);
            let api = Self::default();
            *api.projects.borrow_mut() = projects;
            api.next_id.set(next);
            api
        }

        fn check(&self) -> ApiResult<()> {
            if self.fail.get() {
                Err(ApiError::Status {
                    status: 500,
                    url: "http://backend.test".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    impl ProjectApi for FakeApi {
        fn prime_csrf(&self) -> ApiResult<()> {
            self.check()?;
            self.primed.set(true);
            Ok(())
        }

        fn list(&self) -> ApiResult<Vec<Project>> {
            self.check()?;
            Ok(self.projects.borrow().clone())
        }

        fn create(&self, project: &NewProject) -> ApiResult<Project> {
            self.check()?;
            self.next_id.set(self.next_id.get() + 1);
            let created = sample(self.next_id.get(), &project.title, &project.description);
            self.projects.borrow_mut().push(created.clone());
            Ok(created)
        }

        fn delete(&self, id: ProjectId) -> ApiResult<()> {
            self.check()?;
            self.projects.borrow_mut().retain(|p| p.id != id);
            Ok(())
        }
    }

    fn sample(id: i64, title: &str, description: &str) -> Project {
        Project {
            id: ProjectId::new(id),
            title: title.into(),
            description: description.into(),
            editor_content: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn view(api: FakeApi) -> (ProjectListView<FakeApi, HistoryNavigator>, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        (
            ProjectListView::new(api, HistoryNavigator::new(), logger.clone()),
            logger,
        )
    }

    #[test]
    fn test_load_fetches_and_primes() {
        let (mut view, _) = view(FakeApi::with(vec![sample(1, "One", "first")]));
        view.load();
        assert_eq!(view.projects().len(), 1);
        assert!(view.api().primed.get());
    }

    #[test]
    fn test_load_failure_keeps_state() {
        let api = FakeApi::with(vec![sample(1, "One", "first")]);
        api.fail.set(true);
        let (mut view, logger) = view(api);

        view.load();

        assert!(view.projects().is_empty());
        assert!(logger.contains("Error fetching projects"));
        assert!(logger.contains("Error obtaining CSRF token"));
    }

    #[test]
    fn test_create_appends_resets_and_navigates() {
        let (mut view, _) = view(FakeApi::default());
        view.open_create_dialog();
        view.set_new_title("Alpha");
        view.set_new_description("Beta");

        let id = view.create_project().unwrap();

        assert_eq!(view.projects().len(), 1);
        assert_eq!(view.projects()[0].title, "Alpha");
        assert_eq!(view.projects()[0].description, "Beta");
        assert_eq!(view.draft(), &NewProject::default());
        assert!(!view.is_create_dialog_open());
        assert_eq!(view.navigator().current(), Some(Route::Editor(id)));
    }

    #[test]
    fn test_create_requires_both_fields() {
        let (mut view, _) = view(FakeApi::default());
        view.open_create_dialog();
        view.set_new_title("Alpha");

        assert_eq!(view.create_project(), None);
        assert!(view.projects().is_empty());
        assert!(view.is_create_dialog_open());
        assert!(view.navigator().history().is_empty());
        assert_eq!(view.api().next_id.get(), 0);
    }

    #[test]
    fn test_create_failure_keeps_form() {
        let api = FakeApi::default();
        api.fail.set(true);
        let (mut view, logger) = view(api);
        view.open_create_dialog();
        view.set_new_title("Alpha");
        view.set_new_description("Beta");

        assert_eq!(view.create_project(), None);
        assert!(view.is_create_dialog_open());
        assert_eq!(view.draft().title, "Alpha");
        assert_eq!(logger.entries_at(LogLevel::Error).len(), 1);
    }

    #[test]
    fn test_delete_flow() {
        let (mut view, _) = view(FakeApi::with(vec![sample(1, "One", "a"), sample(2, "Two", "b")]));
        view.load();

        view.confirm_delete(ProjectId::new(1));
        assert_eq!(view.pending_delete(), Some(ProjectId::new(1)));
        view.cancel_delete();
        assert_eq!(view.pending_delete(), None);

        view.confirm_delete(ProjectId::new(2));
        assert!(view.delete_pending());
        assert_eq!(view.pending_delete(), None);
        let titles: Vec<_> = view.projects().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["One"]);
    }

    #[test]
    fn test_delete_failure_keeps_list_and_confirmation() {
        let (mut view, logger) = view(FakeApi::with(vec![sample(1, "One", "a")]));
        view.load();
        view.api().fail.set(true);
        view.confirm_delete(ProjectId::new(1));

        assert!(!view.delete_project(ProjectId::new(1)));
        assert_eq!(view.projects().len(), 1);
        assert_eq!(view.pending_delete(), Some(ProjectId::new(1)));
        assert!(logger.contains("Error deleting project"));
    }

    #[test]
    fn test_access_editor_and_render() {
        let (mut view, _) = view(FakeApi::with(vec![sample(5, "Five", "desc")]));
        view.load();
        view.access_editor(ProjectId::new(5));
        assert_eq!(view.navigator().current().map(|r| r.path()), Some("/editor/5".to_string()));
        assert!(view.render().contains("#5 Project Title: Five"));
    }
}
