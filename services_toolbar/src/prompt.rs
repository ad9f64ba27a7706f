//! Host prompts

use std::collections::VecDeque;
use std::io::{BufRead, Write};

/// Synchronous text prompt supplied by the host
pub trait UrlPrompt {
    /// Shows `message` with `default` prefilled
    ///
    /// Returns `None` when the user cancels.
    fn prompt(&mut self, message: &str, default: &str) -> Option<String>;
}

/// Prompt answering from a queue; cancels once the queue is empty
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompt {
    answers: VecDeque<Option<String>>,
    asked: Vec<(String, String)>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an accepted answer
    pub fn answer(mut self, url: impl Into<String>) -> Self {
        self.answers.push_back(Some(url.into()));
        self
    }

    /// Queues a cancellation
    pub fn cancel(mut self) -> Self {
        self.answers.push_back(None);
        self
    }

    /// (message, default) of every prompt shown so far
    pub fn asked(&self) -> &[(String, String)] {
        &self.asked
    }
}

impl UrlPrompt for ScriptedPrompt {
    fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
        self.asked.push((message.to_string(), default.to_string()));
        self.answers.pop_front().flatten()
    }
}

/// Line-oriented prompt over a reader and a writer
///
/// An empty line accepts the default; end of input cancels.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> UrlPrompt for LinePrompt<R, W> {
    fn prompt(&mut self, message: &str, default: &str) -> Option<String> {
        write!(self.output, "{} [{}] ", message, default).ok()?;
        self.output.flush().ok()?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => {
                let answer = line.trim();
                if answer.is_empty() {
                    Some(default.to_string())
                } else {
                    Some(answer.to_string())
                }
            }
        }
    }
}
