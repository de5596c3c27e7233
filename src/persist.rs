use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::info;

use crate::{pipeline::PipelineResult, registry::Topology, topic::Topic};

pub fn output_filename(topology: Topology, topic: &Topic) -> String {
    format!("{}{}.md", topology.file_prefix(), topic.slug())
}

/// Seconds rounded to two decimals, always with a fractional part
/// (`1.23`, `1.2`, `5.0`).
pub fn format_seconds(elapsed: Duration) -> String {
    let rounded = (elapsed.as_secs_f64() * 100.0).round() / 100.0;
    let text = rounded.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// File body for a run. Unified runs carry a metadata header.
pub fn render_document(topic: &Topic, result: &PipelineResult) -> String {
    match result.topology {
        Topology::Chained => result.artifact.clone(),
        Topology::Unified => format!(
            "# Single-Agent Generated Article\n\
             **Topic:** {}\n\
             **Processing Time:** {} seconds\n\
             **Generated by:** Single Unified Agent\n\n\
             ---\n\n\
             {}",
            topic,
            format_seconds(result.elapsed),
            result.artifact
        ),
    }
}

/// Writes the article into `dir`, replacing any earlier file for the same
/// topic and mode.
pub fn persist(dir: &Path, topic: &Topic, result: &PipelineResult) -> io::Result<PathBuf> {
    let path = dir.join(output_filename(result.topology, topic));
    fs::write(&path, render_document(topic, result))?;
    info!(path = %path.display(), mode = %result.topology, "article written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(topology: Topology, artifact: &str, elapsed: Duration) -> PipelineResult {
        PipelineResult {
            artifact: artifact.to_string(),
            elapsed,
            topology,
            stage_outputs: Vec::new(),
            states: Vec::new(),
        }
    }

    #[test]
    fn filenames_follow_mode_prefix() {
        let topic = Topic::parse("Future of Renewable Energy").unwrap();
        assert_eq!(
            output_filename(Topology::Chained, &topic),
            "article_future_of_renewable_energy.md"
        );
        assert_eq!(
            output_filename(Topology::Unified, &topic),
            "SINGLE_AGENT_article_future_of_renewable_energy.md"
        );
    }

    #[test]
    fn seconds_render_like_rounded_floats() {
        assert_eq!(format_seconds(Duration::from_millis(1234)), "1.23");
        assert_eq!(format_seconds(Duration::from_millis(1200)), "1.2");
        assert_eq!(format_seconds(Duration::from_secs(5)), "5.0");
        assert_eq!(format_seconds(Duration::from_millis(1999)), "2.0");
    }

    #[test]
    fn unified_document_has_metadata_header() {
        let topic = Topic::parse("AI").unwrap();
        let run = result(Topology::Unified, "Hello", Duration::from_millis(1230));

        assert_eq!(
            render_document(&topic, &run),
            "# Single-Agent Generated Article\n**Topic:** AI\n**Processing Time:** 1.23 seconds\n**Generated by:** Single Unified Agent\n\n---\n\nHello"
        );
    }

    #[test]
    fn chained_document_is_artifact_only() {
        let topic = Topic::parse("AI").unwrap();
        let run = result(Topology::Chained, "# Title\n\nBody", Duration::from_secs(3));
        assert_eq!(render_document(&topic, &run), "# Title\n\nBody");
    }

    #[test]
    fn persist_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let topic = Topic::parse("Tide Pools").unwrap();

        persist(dir.path(), &topic, &result(Topology::Chained, "first", Duration::ZERO)).unwrap();
        let path =
            persist(dir.path(), &topic, &result(Topology::Chained, "second", Duration::ZERO)).unwrap();

        assert_eq!(path, dir.path().join("article_tide_pools.md"));
        assert_eq!(fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let topic = Topic::parse("x").unwrap();
        let missing = dir.path().join("nope");

        assert!(persist(&missing, &topic, &result(Topology::Chained, "a", Duration::ZERO)).is_err());
    }
}
