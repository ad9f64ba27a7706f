//! Toolbar actions and their dispatch into the editor

use core_types::NodeKey;
use editor_core::{Command, Editor, EditorResult, NodeKind, TextFormatType, UpdateTxn};
use services_logger::{LogEntry, SharedLogger};
use services_settings::{keys, SettingsRegistry};

use crate::prompt::UrlPrompt;
use crate::state::{BlockType, ToolbarState};

const LOG_SOURCE: &str = "toolbar";

/// Message shown when asking for a link target
pub const LINK_PROMPT_MESSAGE: &str = "Enter the URL of the link:";

/// Prefilled link target
pub const DEFAULT_LINK_URL: &str = "https://";

/// A toolbar button or selector change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Undo,
    Redo,
    SetBlockType(BlockType),
    Format(TextFormatType),
    BulletList,
    NumberedList,
    Link,
    Quote,
    Code,
}

impl ToolbarAction {
    /// Parses a button name (`bold`, `h2`, `ul`, ...)
    pub fn parse(name: &str) -> Option<Self> {
        let action = match name {
            "undo" => ToolbarAction::Undo,
            "redo" => ToolbarAction::Redo,
            "ul" | "bullet" => ToolbarAction::BulletList,
            "ol" | "numbered" => ToolbarAction::NumberedList,
            "link" => ToolbarAction::Link,
            "quote" => ToolbarAction::Quote,
            "code" => ToolbarAction::Code,
            other => {
                if let Some(block) = BlockType::parse(other) {
                    ToolbarAction::SetBlockType(block)
                } else {
                    ToolbarAction::Format(TextFormatType::parse(other)?)
                }
            }
        };
        Some(action)
    }
}

/// What happened to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to the editor
    ///
    /// Also returned when the editor rejects the command or rewrite. The
    /// failure is logged, not reported here, and the document is left as
    /// it was.
    Dispatched,
    /// The user cancelled a prompt; nothing was dispatched
    Cancelled,
    /// The button is disabled in the current state
    Disabled,
}

/// Turns toolbar actions into editor commands and rewrites
///
/// The dispatcher never reads results back; failed rewrites are logged and
/// leave the document as it was.
pub struct CommandDispatcher<P> {
    prompt: P,
    link_default: String,
    logger: SharedLogger,
}

impl<P: UrlPrompt> CommandDispatcher<P> {
    pub fn new(prompt: P, logger: SharedLogger) -> Self {
        Self {
            prompt,
            link_default: DEFAULT_LINK_URL.to_string(),
            logger,
        }
    }

    /// Takes the prefilled link target from settings
    pub fn with_settings(mut self, settings: &SettingsRegistry) -> Self {
        if let Some(url) = settings.get_string(keys::TOOLBAR_LINK_DEFAULT) {
            self.link_default = url.to_string();
        }
        self
    }

    pub fn with_link_default(mut self, url: impl Into<String>) -> Self {
        self.link_default = url.into();
        self
    }

    pub fn link_default(&self) -> &str {
        &self.link_default
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    pub fn prompt_mut(&mut self) -> &mut P {
        &mut self.prompt
    }

    /// Performs `action` against `editor`
    ///
    /// Toggles are decided from `state`, the toolbar state the user is
    /// looking at.
    pub fn dispatch(
        &mut self,
        editor: &mut Editor,
        state: &ToolbarState,
        action: ToolbarAction,
    ) -> DispatchOutcome {
        match action {
            ToolbarAction::Undo if !state.can_undo => DispatchOutcome::Disabled,
            ToolbarAction::Redo if !state.can_redo => DispatchOutcome::Disabled,
            ToolbarAction::Undo => self.send(editor, Command::Undo),
            ToolbarAction::Redo => self.send(editor, Command::Redo),
            ToolbarAction::Format(format) => self.send(editor, Command::FormatText(format)),
            ToolbarAction::BulletList => {
                let command = if state.is_bullet_list {
                    Command::RemoveList
                } else {
                    Command::InsertUnorderedList
                };
                self.send(editor, command)
            }
            ToolbarAction::NumberedList => {
                let command = if state.is_numbered_list {
                    Command::RemoveList
                } else {
                    Command::InsertOrderedList
                };
                self.send(editor, command)
            }
            ToolbarAction::Link => {
                if state.is_link {
                    return self.send(editor, Command::ToggleLink(None));
                }
                match self.prompt.prompt(LINK_PROMPT_MESSAGE, &self.link_default) {
                    Some(url) => self.send(editor, Command::ToggleLink(Some(url))),
                    None => DispatchOutcome::Cancelled,
                }
            }
            ToolbarAction::SetBlockType(block) => {
                let kind = block.node_kind();
                self.rewrite("Block type change", editor, |txn, logger| {
                    rewrite_blocks(txn, logger, &kind)
                })
            }
            ToolbarAction::Quote => {
                let kind = if state.is_quote {
                    NodeKind::Paragraph
                } else {
                    NodeKind::Quote
                };
                self.rewrite("Quote toggle", editor, |txn, logger| {
                    rewrite_blocks(txn, logger, &kind)
                })
            }
            ToolbarAction::Code => self.rewrite("Code toggle", editor, |txn, _| toggle_code(txn)),
        }
    }

    fn send(&self, editor: &mut Editor, command: Command) -> DispatchOutcome {
        let name = command.kind().as_str();
        if let Err(err) = editor.dispatch_command(command) {
            self.logger.log(
                LogEntry::error("Command failed")
                    .with_source(LOG_SOURCE)
                    .with_field("command", name)
                    .with_field("error", err),
            );
        }
        DispatchOutcome::Dispatched
    }

    fn rewrite<F>(&self, what: &'static str, editor: &mut Editor, f: F) -> DispatchOutcome
    where
        F: FnOnce(&mut UpdateTxn<'_>, &SharedLogger) -> EditorResult<()>,
    {
        let logger = &self.logger;
        if let Err(err) = editor.update(|txn| f(txn, logger)) {
            logger.log(
                LogEntry::error("Structural rewrite abandoned")
                    .with_source(LOG_SOURCE)
                    .with_field("operation", what)
                    .with_field("error", err),
            );
        }
        DispatchOutcome::Dispatched
    }
}

/// Top-level blocks touched by the selection, deduplicated
///
/// Nodes with no reachable top-level block are logged and skipped.
fn touched_blocks(txn: &UpdateTxn<'_>, logger: &SharedLogger) -> EditorResult<Vec<NodeKey>> {
    let Some(range) = txn.range_selection() else {
        return Ok(Vec::new());
    };
    let tree = txn.tree();
    let mut blocks = Vec::new();
    for node in range.nodes(tree)? {
        if node == tree.root() {
            continue;
        }
        match tree.top_level_element(node) {
            Ok(block) if !blocks.contains(&block) => blocks.push(block),
            Ok(_) => {}
            Err(_) => logger.log(
                LogEntry::warn("No top-level element found for node")
                    .with_source(LOG_SOURCE)
                    .with_field("node", node),
            ),
        }
    }
    Ok(blocks)
}

/// Rebuilds every touched block as `kind`, children moved in order
///
/// A list yields one block per item. Selection endpoints on text keep
/// their keys and offsets; endpoints on a replaced element follow it.
fn rewrite_blocks(txn: &mut UpdateTxn<'_>, logger: &SharedLogger, kind: &NodeKind) -> EditorResult<()> {
    for block in touched_blocks(txn, logger)? {
        if txn.tree().kind(block)?.is_list() {
            let items = txn.tree().children(block)?.to_vec();
            for item in items {
                let replacement = txn.create(kind.clone());
                txn.insert_before(block, replacement)?;
                txn.move_children(item, replacement)?;
                txn.remap_selection(item, replacement);
            }
            txn.remove(block)?;
        } else {
            let replacement = txn.create(kind.clone());
            txn.replace(block, replacement, true)?;
        }
    }
    Ok(())
}

/// Leaves a code block through a new paragraph, or swaps the anchor's block
/// for an empty code block
fn toggle_code(txn: &mut UpdateTxn<'_>) -> EditorResult<()> {
    let Some(range) = txn.range_selection() else {
        return Ok(());
    };
    let block = txn.top_level_element(range.anchor.key)?;

    if matches!(txn.tree().kind(block)?, NodeKind::Code { .. }) {
        let paragraph = txn.create_paragraph();
        txn.insert_after(block, paragraph)?;
        txn.select_start(paragraph)?;
    } else {
        let code = txn.create_code();
        txn.replace(block, code, false)?;
        txn.select_start(code)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use editor_core::{BlockSpec, EditorState, HeadingTag, Point, RangeSelection};
    use services_logger::{LogLevel, MemoryLogger};
    use services_settings::{SettingLayer, SettingValue};
    use std::sync::Arc;

    fn dispatcher(prompt: ScriptedPrompt) -> (CommandDispatcher<ScriptedPrompt>, Arc<MemoryLogger>) {
        let logger = Arc::new(MemoryLogger::new());
        (CommandDispatcher::new(prompt, logger.clone()), logger)
    }

    fn editor_with(blocks: &[BlockSpec]) -> Editor {
        Editor::with_state(EditorState::from_blocks(blocks))
    }

    fn text_in(editor: &Editor, block: usize) -> NodeKey {
        editor.read(|view| {
            let b = view.block(block).unwrap();
            view.tree().first_text_descendant(b).unwrap()
        })
    }

    fn select(editor: &mut Editor, anchor: Point, focus: Point) {
        editor
            .set_selection(Some(RangeSelection::new(anchor, focus).into()))
            .unwrap();
    }

    fn kinds(editor: &Editor) -> Vec<String> {
        editor
            .snapshot()
            .blocks
            .into_iter()
            .map(|b| b.kind)
            .collect()
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(ToolbarAction::parse("bold"), Some(ToolbarAction::Format(TextFormatType::Bold)));
        assert_eq!(ToolbarAction::parse("h2"), Some(ToolbarAction::SetBlockType(BlockType::H2)));
        assert_eq!(ToolbarAction::parse("ol"), Some(ToolbarAction::NumberedList));
        assert_eq!(ToolbarAction::parse("blink"), None);
    }

    #[test]
    fn test_undo_disabled_without_dispatch() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[BlockSpec::paragraph("x")]);
        let state = ToolbarState::default();
        assert_eq!(d.dispatch(&mut editor, &state, ToolbarAction::Undo), DispatchOutcome::Disabled);
        assert_eq!(d.dispatch(&mut editor, &state, ToolbarAction::Redo), DispatchOutcome::Disabled);
    }

    #[test]
    fn test_heading_keeps_text_and_offsets() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[BlockSpec::paragraph("Hello")]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 1), Point::text(t, 3));

        let outcome = d.dispatch(
            &mut editor,
            &ToolbarState::default(),
            ToolbarAction::SetBlockType(BlockType::H1),
        );

        assert_eq!(outcome, DispatchOutcome::Dispatched);
        assert_eq!(kinds(&editor), vec!["h1"]);
        assert_eq!(editor.read(|view| view.text_content()), "Hello");
        let range = editor.read(|view| view.range_selection().cloned()).unwrap();
        assert_eq!(range.anchor, Point::text(t, 1));
        assert_eq!(range.focus, Point::text(t, 3));
    }

    #[test]
    fn test_block_type_handles_each_block_once() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[
            BlockSpec::runs([("a", editor_core::TextFormat::NONE), ("b", editor_core::TextFormat::BOLD)]),
            BlockSpec::paragraph("c"),
            BlockSpec::paragraph("untouched"),
        ]);
        let a = text_in(&editor, 0);
        let c = text_in(&editor, 1);
        select(&mut editor, Point::text(a, 0), Point::text(c, 1));

        d.dispatch(
            &mut editor,
            &ToolbarState::default(),
            ToolbarAction::SetBlockType(BlockType::H2),
        );

        assert_eq!(kinds(&editor), vec!["h2", "h2", "paragraph"]);
        assert_eq!(editor.read(|view| view.text_content()), "ab\nc\nuntouched");
    }

    #[test]
    fn test_block_type_on_list_splits_items() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[BlockSpec::list(editor_core::ListTag::Bullet, ["one", "two"])]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 0), Point::text(t, 0));

        d.dispatch(
            &mut editor,
            &ToolbarState::default(),
            ToolbarAction::SetBlockType(BlockType::H3),
        );
        assert_eq!(kinds(&editor), vec!["h3", "h3"]);
    }

    #[test]
    fn test_quote_toggle_both_ways() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[BlockSpec::heading(HeadingTag::H1, "Cite")]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 2), Point::text(t, 2));

        d.dispatch(&mut editor, &ToolbarState::default(), ToolbarAction::Quote);
        assert_eq!(kinds(&editor), vec!["quote"]);

        let quoted = ToolbarState {
            is_quote: true,
            ..Default::default()
        };
        d.dispatch(&mut editor, &quoted, ToolbarAction::Quote);
        assert_eq!(kinds(&editor), vec!["paragraph"]);
        assert_eq!(editor.read(|view| view.text_content()), "Cite");
    }

    #[test]
    fn test_code_toggle_leaves_code_block() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[BlockSpec::code("fn main() {}")]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 3), Point::text(t, 3));

        let code_state = ToolbarState {
            is_code: true,
            ..Default::default()
        };
        d.dispatch(&mut editor, &code_state, ToolbarAction::Code);

        assert_eq!(kinds(&editor), vec!["code", "paragraph"]);
        assert_eq!(editor.snapshot().blocks[0].text, "fn main() {}");
        let (anchor, paragraph) = editor.read(|view| {
            (view.range_selection().unwrap().anchor, view.block(1).unwrap())
        });
        assert_eq!(anchor, Point::element(paragraph, 0));
    }

    #[test]
    fn test_code_toggle_replaces_block_with_empty_code() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[BlockSpec::paragraph("soon code"), BlockSpec::paragraph("next")]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 1), Point::text(t, 1));

        d.dispatch(&mut editor, &ToolbarState::default(), ToolbarAction::Code);

        let snapshot = editor.snapshot();
        assert_eq!(snapshot.kinds(), vec!["code", "paragraph"]);
        assert_eq!(snapshot.blocks[0].text, "");
        assert_eq!(snapshot.blocks[1].text, "next");
        assert!(editor.can_undo());
    }

    #[test]
    fn test_link_cancelled_prompt_dispatches_nothing() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new().cancel());
        let mut editor = editor_with(&[BlockSpec::paragraph("plain text")]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 0), Point::text(t, 5));
        let before = editor.state().clone();

        let outcome = d.dispatch(&mut editor, &ToolbarState::default(), ToolbarAction::Link);

        assert_eq!(outcome, DispatchOutcome::Cancelled);
        assert_eq!(editor.state(), &before);
        assert_eq!(
            d.prompt().asked(),
            &[(LINK_PROMPT_MESSAGE.to_string(), DEFAULT_LINK_URL.to_string())]
        );
    }

    #[test]
    fn test_link_active_removes_without_prompt() {
        let (mut d, _) = dispatcher(ScriptedPrompt::new().answer("https://rust-lang.org"));
        let mut editor = editor_with(&[BlockSpec::paragraph("plain text")]);
        let t = text_in(&editor, 0);
        select(&mut editor, Point::text(t, 0), Point::text(t, 5));

        d.dispatch(&mut editor, &ToolbarState::default(), ToolbarAction::Link);
        let linked = editor.read(|view| {
            let p = view.block(0).unwrap();
            view.tree().children(p).unwrap().iter().any(|c| view.tree().kind(*c).unwrap().is_link())
        });
        assert!(linked);

        let active = ToolbarState {
            is_link: true,
            ..Default::default()
        };
        d.dispatch(&mut editor, &active, ToolbarAction::Link);
        assert_eq!(d.prompt().asked().len(), 1);
        let linked = editor.read(|view| {
            let p = view.block(0).unwrap();
            view.tree().children(p).unwrap().iter().any(|c| view.tree().kind(*c).unwrap().is_link())
        });
        assert!(!linked);
    }

    #[test]
    fn test_link_default_from_settings() {
        let mut settings = SettingsRegistry::with_builtin_defaults();
        settings.set(
            keys::TOOLBAR_LINK_DEFAULT,
            SettingValue::String("https://intranet/".into()),
            SettingLayer::File,
        );
        let (d, _) = dispatcher(ScriptedPrompt::new());
        let d = d.with_settings(&settings);
        assert_eq!(d.link_default(), "https://intranet/");
    }

    #[test]
    fn test_failed_rewrite_is_logged_and_still_dispatched() {
        let (mut d, logger) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[BlockSpec::paragraph("x")]);
        let root = editor.read(|view| view.tree().root());
        editor
            .set_selection(Some(RangeSelection::collapsed(Point::element(root, 0)).into()))
            .unwrap();
        let before = editor.state().clone();

        let outcome = d.dispatch(&mut editor, &ToolbarState::default(), ToolbarAction::Code);

        assert_eq!(outcome, DispatchOutcome::Dispatched);
        assert_eq!(editor.state(), &before);
        assert!(!editor.can_undo());
        assert!(logger.contains("Structural rewrite abandoned"));
        assert_eq!(logger.entries_at(LogLevel::Error).len(), 1);
    }

    #[test]
    fn test_rewrite_without_selection_is_noop() {
        let (mut d, logger) = dispatcher(ScriptedPrompt::new());
        let mut editor = editor_with(&[BlockSpec::paragraph("x")]);
        let before = editor.state().clone();

        d.dispatch(&mut editor, &ToolbarState::default(), ToolbarAction::Code);
        d.dispatch(&mut editor, &ToolbarState::default(), ToolbarAction::Quote);

        assert_eq!(editor.state(), &before);
        assert!(logger.entries_at(LogLevel::Error).is_empty());
    }
}
