//! # Pipeline Integration Tests
//!
//! End-to-end tests that cross crate boundaries: the project list view
//! talking to a backend, and a project's document flowing through the
//! editor and toolbar and back into the project record.
//!
//! ## Test Philosophy
//!
//! - **Wire-shaped fakes**: the fake backend stores JSON, so every record
//!   makes the same serde round trip it would over HTTP
//! - **Failures stay local**: a failing backend call leaves the view as it was
//! - **Documents survive**: editor content saved into a project loads back
//!   to the same document

#![cfg(test)]

use std::cell::RefCell;
use std::sync::Arc;

use core_types::ProjectId;
use editor_core::{BlockSpec, Editor, EditorState, Point, RangeSelection, TextFormatType};
use serde::Serialize;
use services_logger::{LogLevel, MemoryLogger};
use services_projects::{
    ApiError, ApiResult, HistoryNavigator, NewProject, Project, ProjectApi, ProjectListView, Route,
};
use services_toolbar::{
    BlockType, CommandDispatcher, ScriptedPrompt, ToolbarAction, ToolbarSynchronizer,
};

// ============================================================================
// JSON Backend
// ============================================================================

/// Backend that keeps each project as a JSON document
#[derive(Default)]
struct JsonBackend {
    rows: RefCell<Vec<String>>,
    next_id: RefCell<i64>,
    csrf_primed: RefCell<bool>,
    offline: RefCell<bool>,
}

impl JsonBackend {
    fn online(&self) -> ApiResult<()> {
        if *self.offline.borrow() {
            return Err(ApiError::Status {
                status: 503,
                url: "http://backend.test/projects/".into(),
            });
        }
        Ok(())
    }

    /// Unsafe calls without the token are refused, as the real backend does
    fn csrf_checked(&self) -> ApiResult<()> {
        self.online()?;
        if !*self.csrf_primed.borrow() {
            return Err(ApiError::Status {
                status: 403,
                url: "http://backend.test/projects/".into(),
            });
        }
        Ok(())
    }

    fn decode(row: &str) -> Project {
        serde_json::from_str(row).unwrap()
    }

    fn store(&self, project: &Project) {
        let mut rows = self.rows.borrow_mut();
        let row = to_json(project);
        match rows.iter().position(|r| Self::decode(r).id == project.id) {
            Some(index) => rows[index] = row,
            None => rows.push(row),
        }
    }

    fn fetch(&self, id: ProjectId) -> Option<Project> {
        self.rows
            .borrow()
            .iter()
            .map(|r| Self::decode(r))
            .find(|p| p.id == id)
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap()
}

impl ProjectApi for JsonBackend {
    fn prime_csrf(&self) -> ApiResult<()> {
        self.online()?;
        *self.csrf_primed.borrow_mut() = true;
        Ok(())
    }

    fn list(&self) -> ApiResult<Vec<Project>> {
        self.online()?;
        Ok(self.rows.borrow().iter().map(|r| Self::decode(r)).collect())
    }

    fn create(&self, project: &NewProject) -> ApiResult<Project> {
        self.csrf_checked()?;
        let body: serde_json::Value = serde_json::from_str(&to_json(project)).unwrap();
        let mut next_id = self.next_id.borrow_mut();
        *next_id += 1;
        let row = serde_json::json!({
            "id": *next_id,
            "title": body["title"],
            "description": body["description"],
            "editor_content": "",
            "created_at": "2024-05-01T12:00:00Z",
            "updated_at": "2024-05-01T12:00:00Z",
        });
        self.rows.borrow_mut().push(row.to_string());
        Ok(Self::decode(&row.to_string()))
    }

    fn delete(&self, id: ProjectId) -> ApiResult<()> {
        self.csrf_checked()?;
        self.rows.borrow_mut().retain(|r| Self::decode(r).id != id);
        Ok(())
    }
}

fn page(backend: JsonBackend) -> (ProjectListView<JsonBackend, HistoryNavigator>, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let view = ProjectListView::new(backend, HistoryNavigator::new(), logger.clone());
    (view, logger)
}

// ============================================================================
// Project Pipeline Tests
// ============================================================================

#[test]
fn test_create_alpha_beta_opens_its_editor() {
    let (mut view, logger) = page(JsonBackend::default());
    view.load();

    view.open_create_dialog();
    view.set_new_title("Alpha");
    view.set_new_description("Beta");
    let id = view.create_project().expect("project should be created");

    let stored = view.api().fetch(id).unwrap();
    assert_eq!(stored.title, "Alpha");
    assert_eq!(stored.description, "Beta");
    assert_eq!(view.projects().last(), Some(&stored));
    assert_eq!(view.navigator().current(), Some(Route::Editor(id)));
    assert_eq!(Route::Editor(id).path(), format!("/editor/{}", id));
    assert!(logger.entries_at(LogLevel::Error).is_empty());
}

#[test]
fn test_writes_before_load_are_refused_and_logged() {
    let (mut view, logger) = page(JsonBackend::default());
    view.set_new_title("Alpha");
    view.set_new_description("Beta");

    assert_eq!(view.create_project(), None);
    assert!(view.projects().is_empty());
    assert!(logger.contains("Error creating project"));

    view.load();
    assert!(view.create_project().is_some());
}

#[test]
fn test_offline_backend_keeps_the_list() {
    let (mut view, logger) = page(JsonBackend::default());
    view.load();
    view.set_new_title("Keep");
    view.set_new_description("me");
    let id = view.create_project().unwrap();

    *view.api().offline.borrow_mut() = true;
    view.load();
    assert_eq!(view.projects().len(), 1);

    view.confirm_delete(id);
    assert!(!view.delete_pending());
    assert_eq!(view.projects().len(), 1);
    assert_eq!(logger.entries_at(LogLevel::Error).len(), 3);

    *view.api().offline.borrow_mut() = false;
    assert!(view.delete_pending());
    assert!(view.projects().is_empty());
    assert!(view.api().fetch(id).is_none());
}

#[test]
fn test_document_round_trips_through_the_project_record() {
    let backend = JsonBackend::default();
    let (mut view, _) = page(backend);
    view.load();
    view.set_new_title("Essay");
    view.set_new_description("Draft");
    let id = view.create_project().unwrap();

    let project = view.api().fetch(id).unwrap();
    assert!(project.editor_content.is_empty());

    let logger = Arc::new(MemoryLogger::new());
    let mut editor = Editor::with_state(EditorState::from_blocks(&[BlockSpec::paragraph(
        "Hello essay",
    )]));
    let sync = ToolbarSynchronizer::attach(&editor, logger.clone());
    let mut dispatcher = CommandDispatcher::new(ScriptedPrompt::new(), logger);

    let text = editor.read(|v| v.tree().first_text_descendant(v.block(0).unwrap()).unwrap());
    editor
        .set_selection(Some(
            RangeSelection::new(Point::text(text, 0), Point::text(text, 5)).into(),
        ))
        .unwrap();
    dispatcher.dispatch(&mut editor, &sync.state(), ToolbarAction::Format(TextFormatType::Bold));
    dispatcher.dispatch(
        &mut editor,
        &sync.state(),
        ToolbarAction::SetBlockType(BlockType::H2),
    );

    let saved = Project {
        editor_content: editor.to_json().unwrap(),
        ..project
    };
    view.api().store(&saved);

    let reloaded = Editor::from_json(&view.api().fetch(id).unwrap().editor_content).unwrap();
    let before = editor.snapshot();
    let after = reloaded.snapshot();
    assert_eq!(after.blocks, before.blocks);
    assert_eq!(after.kinds(), vec!["h2"]);
    assert_eq!(after.blocks[0].text, "Hello essay");
    assert_eq!(after.undo_depth, 0);
}
