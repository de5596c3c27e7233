use std::sync::Mutex;

use async_trait::async_trait;

use crate::{
    providers::LLMProvider,
    types::{ChatMessage, CompletionRequest, CompletionResponse},
    LLMError,
};

type Responder = dyn Fn(&CompletionRequest, usize) -> Result<String, LLMError> + Send + Sync;

/// Deterministic backend: answers from a fixed script or a closure and
/// records every request in the order it arrived.
pub struct ScriptedProvider {
    responder: Box<Responder>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let responses: Vec<String> = responses.into_iter().map(Into::into).collect();
        Self::from_fn(move |_, index| {
            responses
                .get(index)
                .cloned()
                .ok_or_else(|| LLMError::Provider("no more scripted responses".to_string()))
        })
    }

    /// The closure receives the request and its zero-based call index.
    pub fn from_fn(
        responder: impl Fn(&CompletionRequest, usize) -> Result<String, LLMError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LLMError> {
        let index = {
            let mut guard = self
                .requests
                .lock()
                .map_err(|_| LLMError::Provider("scripted provider poisoned".to_string()))?;
            guard.push(request.clone());
            guard.len() - 1
        };

        let content = (self.responder)(&request, index)?;
        Ok(CompletionResponse {
            message: ChatMessage::assistant(content),
            usage: None,
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_script_then_fails() {
        let provider = ScriptedProvider::new(["one", "two"]);
        let request = CompletionRequest::new("model", vec![ChatMessage::user("hi")]);

        let first = provider.complete(request.clone()).await.unwrap();
        let second = provider.complete(request.clone()).await.unwrap();
        let third = provider.complete(request).await;

        assert_eq!(first.message.text(), Some("one"));
        assert_eq!(second.message.text(), Some("two"));
        assert!(matches!(third, Err(LLMError::Provider(_))));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn closure_sees_request_and_index() {
        let provider = ScriptedProvider::from_fn(|request, index| {
            Ok(format!("{index}:{}", request.prompt().unwrap_or_default()))
        });
        let request = CompletionRequest::new("model", vec![ChatMessage::user("ping")]);

        let response = provider.complete(request).await.unwrap();

        assert_eq!(response.message.text(), Some("0:ping"));
        assert_eq!(provider.requests()[0].model, "model");
    }
}
