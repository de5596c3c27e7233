use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::time;
use tracing::{debug, info, warn};

use crate::{
    error::PipelineError,
    registry::Topology,
    retry::RetryPolicy,
    stage::{BoundStage, StageSpec},
    topic::Topic,
    types::{ChatMessage, CompletionRequest},
    LLMProvider,
};

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Binding,
    Executing { index: usize, stage: String },
    Completed,
    Failed { stage: Option<String> },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StateChanged(PipelineState),
    StageStarted {
        index: usize,
        stage: String,
        role: String,
    },
    StageCompleted {
        index: usize,
        stage: String,
        output: String,
        elapsed: Duration,
    },
    Completed {
        elapsed: Duration,
    },
    Failed {
        stage: Option<String>,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput {
    pub stage: String,
    pub role: String,
    pub output: String,
}

/// The final artifact of one run plus how it was produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub artifact: String,
    pub elapsed: Duration,
    pub topology: Topology,
    pub stage_outputs: Vec<StageOutput>,
    pub states: Vec<PipelineState>,
}

/// Drives the stages of a topology strictly one after another, feeding
/// each stage the topic and every earlier stage's output.
pub struct PipelineExecutor {
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    stage_timeout: Option<Duration>,
    retry: RetryPolicy,
    event_callback: Option<Arc<dyn Fn(&PipelineEvent) + Send + Sync>>,
}

impl PipelineExecutor {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            stage_timeout: None,
            retry: RetryPolicy::none(),
            event_callback: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_event_callback(
        mut self,
        callback: impl Fn(&PipelineEvent) + Send + Sync + 'static,
    ) -> Self {
        self.event_callback = Some(Arc::new(callback));
        self
    }

    pub async fn run(
        &self,
        topology: Topology,
        topic: &Topic,
    ) -> Result<PipelineResult, PipelineError> {
        self.run_stages(topology, topology.stages(), topic).await
    }

    /// Like [`run`](Self::run), also reporting every event of this run to
    /// `observer`, after any callback installed on the executor.
    pub async fn run_with_observer<F>(
        &self,
        topology: Topology,
        topic: &Topic,
        mut observer: F,
    ) -> Result<PipelineResult, PipelineError>
    where
        F: FnMut(&PipelineEvent),
    {
        self.execute(topology, topology.stages(), topic, &mut observer)
            .await
    }

    /// Same as [`run`](Self::run) with an explicit stage table.
    pub async fn run_stages(
        &self,
        topology: Topology,
        stages: &[StageSpec],
        topic: &Topic,
    ) -> Result<PipelineResult, PipelineError> {
        self.execute(topology, stages, topic, &mut |_: &PipelineEvent| {})
            .await
    }

    async fn execute(
        &self,
        topology: Topology,
        stages: &[StageSpec],
        topic: &Topic,
        observer: &mut dyn FnMut(&PipelineEvent),
    ) -> Result<PipelineResult, PipelineError> {
        let mut trace = RunTrace {
            states: vec![PipelineState::Idle],
            observer,
        };
        let result = self.drive(topology, stages, topic, &mut trace).await;

        if let Err(ref error) = result {
            let stage = match trace.states.last() {
                Some(PipelineState::Executing { stage, .. }) => Some(stage.clone()),
                _ => None,
            };
            self.transition(&mut trace, PipelineState::Failed { stage: stage.clone() });
            self.emit_event(
                &mut trace,
                &PipelineEvent::Failed {
                    stage,
                    message: error.to_string(),
                },
            );
        }

        result.map(|mut run| {
            run.states = trace.states;
            run
        })
    }

    async fn drive(
        &self,
        topology: Topology,
        stages: &[StageSpec],
        topic: &Topic,
        trace: &mut RunTrace<'_>,
    ) -> Result<PipelineResult, PipelineError> {
        if stages.is_empty() {
            return Err(PipelineError::NoStages);
        }

        let started = Instant::now();
        self.transition(trace, PipelineState::Binding);
        let bound = stages
            .iter()
            .map(|stage| {
                stage.bind(topic).map_err(|source| PipelineError::Template {
                    stage: stage.name.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut context = vec![ChatMessage::user(format!("Topic: {}", topic.as_str()))];
        let mut stage_outputs = Vec::with_capacity(bound.len());

        for (index, stage) in bound.iter().enumerate() {
            self.transition(
                trace,
                PipelineState::Executing {
                    index,
                    stage: stage.name.clone(),
                },
            );
            self.emit_event(
                trace,
                &PipelineEvent::StageStarted {
                    index,
                    stage: stage.name.clone(),
                    role: stage.role.clone(),
                },
            );
            info!(stage = %stage.name, role = %stage.role, "stage started");

            let stage_started = Instant::now();
            let output = self.execute_stage(stage, &context).await?;
            let elapsed = stage_started.elapsed();

            info!(stage = %stage.name, elapsed_ms = elapsed.as_millis() as u64, "stage finished");
            debug!(stage = %stage.name, output = %output, "stage output");

            context.push(ChatMessage::assistant(output.clone()).with_name(stage.name.clone()));
            self.emit_event(
                trace,
                &PipelineEvent::StageCompleted {
                    index,
                    stage: stage.name.clone(),
                    output: output.clone(),
                    elapsed,
                },
            );
            stage_outputs.push(StageOutput {
                stage: stage.name.clone(),
                role: stage.role.clone(),
                output,
            });
        }

        let elapsed = started.elapsed();
        let artifact = stage_outputs
            .last()
            .map(|last| last.output.clone())
            .unwrap_or_default();

        self.transition(trace, PipelineState::Completed);
        self.emit_event(trace, &PipelineEvent::Completed { elapsed });

        Ok(PipelineResult {
            artifact,
            elapsed,
            topology,
            stage_outputs,
            states: Vec::new(),
        })
    }

    async fn execute_stage(
        &self,
        stage: &BoundStage,
        context: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let mut attempt = 1;
        loop {
            match self.call_once(stage, context).await {
                Ok(output) => return Ok(output),
                Err(error) if self.retry.should_retry(attempt, &error) => {
                    warn!(stage = %stage.name, attempt, error = %error, "stage failed, retrying");
                    if let Some(delay) = self.retry.delay(attempt) {
                        time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn call_once(
        &self,
        stage: &BoundStage,
        context: &[ChatMessage],
    ) -> Result<String, PipelineError> {
        let request = self.build_request(stage, context);
        let call = self.provider.complete(request);

        let response = match self.stage_timeout {
            Some(limit) => match time::timeout(limit, call).await {
                Ok(response) => response,
                Err(_) => {
                    return Err(PipelineError::Timeout {
                        stage: stage.name.clone(),
                        timeout_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => call.await,
        };

        let response = response.map_err(|source| PipelineError::Backend {
            stage: stage.name.clone(),
            source,
        })?;

        Ok(response.message.text().unwrap_or_default().to_string())
    }

    fn build_request(&self, stage: &BoundStage, context: &[ChatMessage]) -> CompletionRequest {
        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(ChatMessage::system(stage.persona.clone()));
        messages.extend(context.iter().cloned());
        messages.push(ChatMessage::user(stage.prompt()).with_name(stage.name.clone()));

        let mut request = CompletionRequest::new(self.model.clone(), messages);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }

    fn transition(&self, trace: &mut RunTrace<'_>, next: PipelineState) {
        debug!(state = ?next, "pipeline state");
        self.emit_event(trace, &PipelineEvent::StateChanged(next.clone()));
        trace.states.push(next);
    }

    fn emit_event(&self, trace: &mut RunTrace<'_>, event: &PipelineEvent) {
        if let Some(callback) = &self.event_callback {
            let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (callback)(event)));
        }
        (trace.observer)(event);
    }
}

/// Per-run bookkeeping: the state trace and the caller's observer.
struct RunTrace<'a> {
    states: Vec<PipelineState>,
    observer: &'a mut dyn FnMut(&PipelineEvent),
}
