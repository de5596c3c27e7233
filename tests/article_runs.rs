use std::{fs, io::Cursor, sync::Arc};

use schreibwerk::{
    providers::scripted::ScriptedProvider, Harness, LLMError, Outcome, PipelineExecutor, Topic,
    Topology,
};

/// Replies `OUT:<stage>` for whichever stage is asking.
fn echo_provider() -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::from_fn(|request, _| {
        let stage = request
            .messages
            .last()
            .and_then(|message| message.name.clone())
            .unwrap_or_default();
        Ok(format!("OUT:{stage}"))
    }))
}

#[tokio::test]
async fn chained_run_writes_final_stage_output() {
    colored::control::set_override(false);
    let dir = tempfile::tempdir().unwrap();
    let executor = PipelineExecutor::new(echo_provider(), "llama3");
    let harness = Harness::new(Topology::Chained, &executor, dir.path());
    let mut output = Vec::new();

    let outcome = harness
        .run(
            None,
            &mut Cursor::new("\nFuture of Renewable Energy\n"),
            &mut output,
        )
        .await
        .unwrap();

    let expected = dir.path().join("article_future_of_renewable_energy.md");
    match outcome {
        Outcome::Completed { path, result } => {
            assert_eq!(path, expected);
            assert_eq!(result.artifact, "OUT:edit");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(fs::read_to_string(&expected).unwrap(), "OUT:edit");

    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains("Please enter a valid topic (cannot be empty)"));
    assert!(printed.contains("Starting research and article writing on: 'Future of Renewable Energy'"));
    assert!(printed.contains("GENERATED ARTICLE:"));
    assert!(printed.trim_end().ends_with("OUT:edit"));
}

#[tokio::test]
async fn unified_run_writes_header_and_comparison_note() {
    colored::control::set_override(false);
    let dir = tempfile::tempdir().unwrap();
    let provider = echo_provider();
    let executor = PipelineExecutor::new(provider.clone(), "llama3");
    let harness = Harness::new(Topology::Unified, &executor, dir.path());
    let mut output = Vec::new();

    harness
        .run(Topic::parse("Future of Renewable Energy"), &mut Cursor::new(""), &mut output)
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 1);
    let written = fs::read_to_string(
        dir.path()
            .join("SINGLE_AGENT_article_future_of_renewable_energy.md"),
    )
    .unwrap();
    assert!(written.starts_with(
        "# Single-Agent Generated Article\n**Topic:** Future of Renewable Energy\n**Processing Time:** "
    ));
    assert!(written.contains(" seconds\n**Generated by:** Single Unified Agent\n\n---\n\n"));
    assert!(written.ends_with("\n\nOUT:create_content"));

    let printed = String::from_utf8(output).unwrap();
    assert!(printed.contains("PERFORMANCE ANALYSIS:"));
    assert!(printed.contains("Cognitive Load: High (research + writing + editing)"));
}

#[tokio::test]
async fn failed_run_leaves_existing_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("article_ai.md");
    fs::write(&path, "previous article").unwrap();

    let provider = Arc::new(ScriptedProvider::from_fn(|_, index| {
        if index == 1 {
            Err(LLMError::Provider("model crashed".to_string()))
        } else {
            Ok("partial".to_string())
        }
    }));
    let executor = PipelineExecutor::new(provider.clone(), "llama3");
    let harness = Harness::new(Topology::Chained, &executor, dir.path());

    let outcome = harness
        .run(Topic::parse("AI"), &mut Cursor::new(""), &mut Vec::new())
        .await
        .unwrap();

    assert!(matches!(outcome, Outcome::Failed { .. }));
    assert_eq!(provider.call_count(), 2);
    assert_eq!(fs::read_to_string(&path).unwrap(), "previous article");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn repeat_runs_produce_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let executor = PipelineExecutor::new(echo_provider(), "llama3");
    let harness = Harness::new(Topology::Chained, &executor, dir.path());
    let path = dir.path().join("article_rust_in_production.md");

    harness
        .run(Topic::parse("Rust in Production"), &mut Cursor::new(""), &mut Vec::new())
        .await
        .unwrap();
    let first = fs::read(&path).unwrap();

    harness
        .run(Topic::parse("Rust in Production"), &mut Cursor::new(""), &mut Vec::new())
        .await
        .unwrap();
    let second = fs::read(&path).unwrap();

    assert_eq!(first, second);
}
