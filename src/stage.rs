use handlebars::{no_escape, Handlebars, RenderError};
use once_cell::sync::Lazy;
use serde_json::json;

use crate::topic::Topic;

static TEMPLATES: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut registry = Handlebars::new();
    // Topics go into prompts, not HTML.
    registry.register_escape_fn(no_escape);
    registry
});

/// Renders a `{{topic}}` template.
pub fn render(template: &str, topic: &Topic) -> Result<String, RenderError> {
    TEMPLATES.render_template(template, &json!({ "topic": topic.as_str() }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Planner,
    Writer,
    Editor,
    UnifiedSpecialist,
}

/// Who performs a stage. Holds only templates; nothing survives a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorRole {
    pub kind: RoleKind,
    pub name: String,
    pub goal: String,
    pub backstory: String,
}

impl ExecutorRole {
    pub fn new(
        kind: RoleKind,
        name: impl Into<String>,
        goal: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }

    pub fn persona(&self, topic: &Topic) -> Result<String, RenderError> {
        let goal = render(&self.goal, topic)?;
        let backstory = render(&self.backstory, topic)?;
        Ok(format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.name, backstory, goal
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageSpec {
    pub name: String,
    pub description: String,
    pub expected_output: String,
    pub executor: ExecutorRole,
}

impl StageSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
        executor: ExecutorRole,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
            executor,
        }
    }

    pub fn bind(&self, topic: &Topic) -> Result<BoundStage, RenderError> {
        Ok(BoundStage {
            name: self.name.clone(),
            role: self.executor.name.clone(),
            persona: self.executor.persona(topic)?,
            description: render(&self.description, topic)?,
            expected_output: self.expected_output.clone(),
        })
    }
}

/// A stage with the topic substituted in, ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStage {
    pub name: String,
    pub role: String,
    pub persona: String,
    pub description: String,
    pub expected_output: String,
}

impl BoundStage {
    pub fn prompt(&self) -> String {
        format!(
            "{}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        )
    }
}
