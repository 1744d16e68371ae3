//! Command scripts - one JSON command per line
//!
//! ```text
//! # place a red block, then the rover
//! {"type":"place_object","color":"red"}
//! {"type":"load_scene","scene_id":"rover"}
//! {"type":"clear_all"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use stage_command::Command;
use std::io::BufRead;
use thiserror::Error;

/// A line that could not be turned into a command
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Iterates the commands of a script as they are read
pub struct ScriptReader<R> {
    lines: std::io::Lines<R>,
    line: usize,
}

impl<R: BufRead> ScriptReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> Iterator for ScriptReader<R> {
    type Item = Result<(usize, Command), ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;

            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let line = self.line;
            return Some(
                serde_json::from_str(trimmed)
                    .map(|command| (line, command))
                    .map_err(|source| ScriptError::Parse { line, source }),
            );
        }
    }
}
