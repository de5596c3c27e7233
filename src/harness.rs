//! Intake, execution, persistence and console reporting for one run.

use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use colored::Colorize;
use tracing::error;

use crate::{
    error::RunError,
    persist::{self, format_seconds},
    pipeline::{PipelineEvent, PipelineExecutor, PipelineResult},
    registry::Topology,
    topic::{read_topic, Topic},
};

pub const RETRY_GUIDANCE: &str =
    "Please try again with a different topic or check your internet connection.";

const RULE_WIDTH: usize = 60;

#[derive(Debug)]
pub enum Outcome {
    Completed { path: PathBuf, result: PipelineResult },
    Failed { message: String },
    /// Input ended before a topic was entered.
    NoTopic,
}

pub struct Harness<'a> {
    topology: Topology,
    executor: &'a PipelineExecutor,
    output_dir: &'a Path,
}

impl<'a> Harness<'a> {
    pub fn new(topology: Topology, executor: &'a PipelineExecutor, output_dir: &'a Path) -> Self {
        Self {
            topology,
            executor,
            output_dir,
        }
    }

    /// Runs once. A preset topic skips the interactive prompt.
    ///
    /// Pipeline and persistence failures are reported on `output` and
    /// returned as [`Outcome::Failed`]; only console I/O errors escape.
    pub async fn run<R, W>(
        &self,
        preset: Option<Topic>,
        input: &mut R,
        output: &mut W,
    ) -> io::Result<Outcome>
    where
        R: BufRead,
        W: Write,
    {
        self.print_banner(output)?;

        let topic = match preset {
            Some(topic) => topic,
            None => match read_topic(input, output)? {
                Some(topic) => topic,
                None => return Ok(Outcome::NoTopic),
            },
        };

        self.print_start(&topic, output)?;

        match self.execute(&topic, output).await {
            Ok((path, result)) => {
                self.print_success(&path, &result, output)?;
                Ok(Outcome::Completed { path, result })
            }
            Err(err) => {
                error!(error = %err, topic = %topic, mode = %self.topology, "run failed");
                let message = err.to_string();
                writeln!(output, "{} {}", "An error occurred:".red().bold(), message)?;
                writeln!(output, "{RETRY_GUIDANCE}")?;
                Ok(Outcome::Failed { message })
            }
        }
    }

    async fn execute<W: Write>(
        &self,
        topic: &Topic,
        output: &mut W,
    ) -> Result<(PathBuf, PipelineResult), RunError> {
        let total = self.topology.stages().len();
        let result = self
            .executor
            .run_with_observer(self.topology, topic, |event| {
                // Progress lines are best effort.
                let _ = print_progress(event, total, output);
            })
            .await?;
        let path = persist::persist(self.output_dir, topic, &result)?;
        Ok((path, result))
    }

    fn print_banner<W: Write>(&self, out: &mut W) -> io::Result<()> {
        match self.topology {
            Topology::Chained => {
                writeln!(
                    out,
                    "{}",
                    "Welcome to Autonomous Research & Article Writing with AI Agents!".bold()
                )?;
                writeln!(out, "{}", rule())?;
            }
            Topology::Unified => {
                writeln!(out, "{}", "Welcome to Single-Agent Content Creation System!".bold())?;
                writeln!(out, "{}", rule())?;
                writeln!(out, "This system uses ONE agent to handle research, writing, and editing")?;
                writeln!(out, "Compare this with the multi-agent system performance!")?;
                writeln!(out, "{}", rule())?;
            }
        }
        Ok(())
    }

    fn print_start<W: Write>(&self, topic: &Topic, out: &mut W) -> io::Result<()> {
        match self.topology {
            Topology::Chained => {
                writeln!(out, "\nStarting research and article writing on: '{topic}'")?;
                writeln!(out, "This may take a few minutes...\n")?;
            }
            Topology::Unified => {
                writeln!(out, "\nStarting single-agent content creation on: '{topic}'")?;
                writeln!(out, "This may take a few minutes...")?;
                writeln!(out, "Single agent will handle: Research -> Writing -> Editing\n")?;
            }
        }
        out.flush()
    }

    fn print_success<W: Write>(
        &self,
        path: &Path,
        result: &PipelineResult,
        out: &mut W,
    ) -> io::Result<()> {
        let seconds = format_seconds(result.elapsed);
        let heading = match self.topology {
            Topology::Chained => {
                writeln!(out, "\n{}", "Article successfully generated!".green().bold())?;
                "GENERATED ARTICLE:"
            }
            Topology::Unified => {
                writeln!(
                    out,
                    "\n{}",
                    "Single-agent article successfully generated!".green().bold()
                )?;
                writeln!(out, "Processing time: {seconds} seconds")?;
                "SINGLE-AGENT GENERATED ARTICLE:"
            }
        };
        writeln!(out, "Saved as: {}", display_name(path))?;
        writeln!(out, "\n{}", rule())?;
        writeln!(out, "{}", heading.bold())?;
        writeln!(out, "{}", rule())?;
        writeln!(out, "{}", result.artifact)?;

        if self.topology == Topology::Unified {
            writeln!(out, "\n{}", rule())?;
            writeln!(out, "{}", "PERFORMANCE ANALYSIS:".bold())?;
            writeln!(out, "{}", rule())?;
            writeln!(out, "Single Agent Approach:")?;
            writeln!(out, "   Time: {seconds} seconds")?;
            writeln!(out, "   Method: One agent handling all tasks sequentially")?;
            writeln!(out, "   Cognitive Load: High (research + writing + editing)")?;
            writeln!(out, "\nNow run the multi-agent version with the same topic to compare!")?;
            writeln!(out, "   Command: research-article")?;
        }
        Ok(())
    }
}

fn print_progress<W: Write>(event: &PipelineEvent, total: usize, out: &mut W) -> io::Result<()> {
    match event {
        PipelineEvent::StageStarted { index, stage, role } => {
            writeln!(out, "[{}/{}] {} is working on {}...", index + 1, total, role.bold(), stage)?;
        }
        PipelineEvent::StageCompleted {
            index,
            stage,
            elapsed,
            ..
        } => {
            writeln!(
                out,
                "[{}/{}] {} finished in {} seconds",
                index + 1,
                total,
                stage,
                format_seconds(*elapsed)
            )?;
        }
        _ => return Ok(()),
    }
    out.flush()
}

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn display_name(path: &Path) -> String {
    match path.parent() {
        Some(parent) if parent == Path::new(".") || parent.as_os_str().is_empty() => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        _ => path.display().to_string(),
    }
}
