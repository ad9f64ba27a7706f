//! Toolbar Demo
//!
//! Replays a script of toolbar clicks against a small document and prints
//! the toolbar after each one.
//!
//! A script has one step per line. A step is either a button name
//! (`bold`, `h2`, `ul`, `link`, `undo`, ...) or `select <block> <start> <end>`,
//! which selects characters of the first text run of a top-level block.
//! Blank lines and lines starting with `#` are skipped.

use editor_core::{BlockSpec, Editor, EditorState, Point, RangeSelection};
use services_logger::SharedLogger;
use services_settings::SettingsRegistry;
use services_toolbar::{CommandDispatcher, ToolbarAction, ToolbarSynchronizer, ToolbarView, UrlPrompt};

/// Script used when none is given
pub const DEFAULT_SCRIPT: &str = "\
select 0 0 5
bold
italic
h1
paragraph
ul
undo
redo
select 1 0 4
link
code
code
";

/// The document [`DEFAULT_SCRIPT`] is written against
pub fn sample_document() -> Vec<BlockSpec> {
    vec![
        BlockSpec::paragraph("Hello toolbar"),
        BlockSpec::paragraph("Docs live at the usual place"),
    ]
}

/// One line of a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Select { block: usize, start: usize, end: usize },
    Click(ToolbarAction),
}

/// Parses a script, reporting the first bad line
pub fn parse_script(script: &str) -> Result<Vec<Step>, String> {
    let mut steps = Vec::new();
    for (number, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = parse_step(line).ok_or_else(|| format!("line {}: {}", number + 1, line))?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_step(line: &str) -> Option<Step> {
    let mut words = line.split_whitespace();
    let first = words.next()?;
    if first != "select" {
        return match words.next() {
            None => ToolbarAction::parse(first).map(Step::Click),
            Some(_) => None,
        };
    }
    let mut number = || words.next()?.parse::<usize>().ok();
    let step = Step::Select {
        block: number()?,
        start: number()?,
        end: number()?,
    };
    words.next().is_none().then_some(step)
}

/// An editor with a toolbar attached
pub struct ToolbarDemo<P> {
    editor: Editor,
    sync: ToolbarSynchronizer,
    dispatcher: CommandDispatcher<P>,
    view: ToolbarView,
}

impl<P: UrlPrompt> ToolbarDemo<P> {
    pub fn new(blocks: &[BlockSpec], prompt: P, settings: &SettingsRegistry, logger: SharedLogger) -> Self {
        let editor = Editor::with_state(EditorState::from_blocks(blocks))
            .with_history_depth(crate::history_depth(settings));
        let sync = ToolbarSynchronizer::attach(&editor, logger.clone());
        let dispatcher = CommandDispatcher::new(prompt, logger).with_settings(settings);
        Self {
            editor,
            sync,
            dispatcher,
            view: ToolbarView::new(),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn render(&self) -> String {
        self.view.render(&self.sync.state())
    }

    /// Runs one step and returns the output line
    pub fn step(&mut self, step: Step) -> String {
        match step {
            Step::Select { block, start, end } => match self.select(block, start, end) {
                Ok(()) => format!("{:<10} {}", "select", self.render()),
                Err(err) => format!("{:<10} {}", "select", err),
            },
            Step::Click(action) => {
                let state = self.sync.state();
                let outcome = self.dispatcher.dispatch(&mut self.editor, &state, action);
                format!("{:<10} {} ({:?})", label(action), self.render(), outcome)
            }
        }
    }

    pub fn run(&mut self, steps: &[Step]) -> Vec<String> {
        let mut lines = vec![format!("{:<10} {}", "start", self.render())];
        lines.extend(steps.iter().map(|step| self.step(*step)));
        lines.push(format!("{:<10} {:?}", "document", self.editor.read(|view| view.text_content())));
        lines
    }

    fn select(&mut self, block: usize, start: usize, end: usize) -> Result<(), String> {
        let text = self
            .editor
            .read(|view| view.block(block).and_then(|b| view.tree().first_text_descendant(b)))
            .ok_or_else(|| format!("no text in block {}", block))?;
        let selection = RangeSelection::new(Point::text(text, start), Point::text(text, end));
        self.editor
            .set_selection(Some(selection.into()))
            .map_err(|e| e.to_string())
    }
}

fn label(action: ToolbarAction) -> String {
    match action {
        ToolbarAction::Undo => "undo".to_string(),
        ToolbarAction::Redo => "redo".to_string(),
        ToolbarAction::SetBlockType(block) => block.as_str().to_string(),
        ToolbarAction::Format(format) => format.as_str().to_string(),
        ToolbarAction::BulletList => "ul".to_string(),
        ToolbarAction::NumberedList => "ol".to_string(),
        ToolbarAction::Link => "link".to_string(),
        ToolbarAction::Quote => "quote".to_string(),
        ToolbarAction::Code => "code".to_string(),
    }
}
