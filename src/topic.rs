use std::{
    fmt,
    io::{self, BufRead, Write},
};

use colored::Colorize;

pub const TOPIC_PROMPT: &str = "Enter the topic you want to research and write about: ";
pub const EMPTY_TOPIC_NOTICE: &str = "Please enter a valid topic (cannot be empty)";

/// Subject of a run. Always non-empty and trimmed.
///
/// The text is interpolated verbatim into every stage's instructions, so
/// whatever the user typed reaches the backend unfiltered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Spaces become underscores, then everything is lower-cased.
    pub fn slug(&self) -> String {
        self.0.replace(' ', "_").to_lowercase()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prompts until a non-empty line is read. `Ok(None)` means the input
/// stream ended before a topic was given.
pub fn read_topic<R, W>(input: &mut R, output: &mut W) -> io::Result<Option<Topic>>
where
    R: BufRead,
    W: Write,
{
    let mut line = String::new();
    loop {
        write!(output, "\n{}", TOPIC_PROMPT.bold())?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        match Topic::parse(&line) {
            Some(topic) => return Ok(Some(topic)),
            None => writeln!(output, "{}", EMPTY_TOPIC_NOTICE.red())?,
        }
    }
}
