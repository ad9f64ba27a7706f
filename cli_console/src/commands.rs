//! Project commands
//!
//! Each command drives a [`ProjectListView`] the way the page would: the
//! list is loaded (which also primes the CSRF token) before anything that
//! changes the backend.

use services_logger::SharedLogger;
use services_projects::{HistoryNavigator, ProjectApi, ProjectId, ProjectListView};

/// CLI Command handler
pub struct CommandHandler<A: ProjectApi> {
    view: ProjectListView<A, HistoryNavigator>,
}

impl<A: ProjectApi> CommandHandler<A> {
    pub fn new(api: A, logger: SharedLogger) -> Self {
        Self {
            view: ProjectListView::new(api, HistoryNavigator::new(), logger),
        }
    }

    pub fn view(&self) -> &ProjectListView<A, HistoryNavigator> {
        &self.view
    }

    /// Runs one command line
    ///
    /// Example: `projects new "Thesis" "Chapter drafts"`
    pub fn execute(&mut self, args: &[String]) -> Result<String, String> {
        let (command, rest) = args.split_first().ok_or("No command given")?;
        match (command.as_str(), rest) {
            ("ls", []) => Ok(self.ls()),
            ("new", [title, description]) => self.create(title, description),
            ("rm", [id]) => self.remove(parse_id(id)?),
            ("open", [id]) => Ok(self.open(parse_id(id)?)),
            ("ls" | "new" | "rm" | "open", _) => Err(format!("Wrong arguments for {}", command)),
            (other, _) => Err(format!("Unknown command: {}", other)),
        }
    }

    /// Lists projects
    ///
    /// Example: `projects ls`
    pub fn ls(&mut self) -> String {
        self.view.load();
        self.view.render()
    }

    /// Creates a project and opens it
    ///
    /// Example: `projects new <title> <description>`
    pub fn create(&mut self, title: &str, description: &str) -> Result<String, String> {
        self.view.load();
        self.view.open_create_dialog();
        self.view.set_new_title(title);
        self.view.set_new_description(description);
        if !self.view.draft().is_complete() {
            return Err("Title and description are both required".to_string());
        }
        let id = self
            .view
            .create_project()
            .ok_or("Project was not created")?;
        Ok(format!("Created project {}\n{}", id, self.location()))
    }

    /// Deletes a project
    ///
    /// Example: `projects rm 7`
    pub fn remove(&mut self, id: ProjectId) -> Result<String, String> {
        self.view.load();
        self.view.confirm_delete(id);
        if self.view.delete_pending() {
            Ok(format!("Deleted project {}", id))
        } else {
            self.view.cancel_delete();
            Err(format!("Project {} was not deleted", id))
        }
    }

    /// Prints the editor route of a project
    ///
    /// Example: `projects open 7`
    pub fn open(&mut self, id: ProjectId) -> String {
        self.view.access_editor(id);
        self.location()
    }

    fn location(&self) -> String {
        match self.view.navigator().current() {
            Some(route) => format!("Open {}", route),
            None => String::new(),
        }
    }
}

fn parse_id(raw: &str) -> Result<ProjectId, String> {
    raw.parse::<ProjectId>()
        .map_err(|_| format!("Invalid project id: {}", raw))
}
