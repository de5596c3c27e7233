//! The two fixed topologies and the stage tables behind them.
//!
//! Tables are built once per process and hold `{{topic}}` templates;
//! binding to a concrete topic happens per run.

use std::fmt;

use once_cell::sync::Lazy;

use crate::stage::{ExecutorRole, RoleKind, StageSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Planner, writer and editor as three agents, one stage each.
    Chained,
    /// One specialist running all three phases in a single stage.
    Unified,
}

impl Topology {
    pub fn stages(&self) -> &'static [StageSpec] {
        match self {
            Topology::Chained => CHAINED.as_slice(),
            Topology::Unified => UNIFIED.as_slice(),
        }
    }

    pub fn mode_tag(&self) -> &'static str {
        match self {
            Topology::Chained => "multi-agent",
            Topology::Unified => "single-agent",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Topology::Chained => "article_",
            Topology::Unified => "SINGLE_AGENT_article_",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode_tag())
    }
}

static CHAINED: Lazy<Vec<StageSpec>> = Lazy::new(|| {
    let planner = ExecutorRole::new(
        RoleKind::Planner,
        "Content Planner",
        "Plan engaging and factually accurate content on {{topic}}",
        "You're working on planning a blog article about the topic: {{topic}}. \
         You collect information that helps the audience learn something and make informed decisions. \
         Your work is the basis for the Content Writer to write an article on this topic.",
    );
    let writer = ExecutorRole::new(
        RoleKind::Writer,
        "Content Writer",
        "Write a comprehensive and engaging article on {{topic}} based on the plan provided by the Content Planner",
        "You are a skilled content writer. \
         You will write a blog article based on the plan provided by the Content Planner. \
         Your article should be engaging, informative, and well-structured. \
         You will also ensure that the article is factually accurate and provides value to the readers.",
    );
    let editor = ExecutorRole::new(
        RoleKind::Editor,
        "Content Editor",
        "Review and edit the article on {{topic}} to ensure it meets quality standards",
        "You are a content editor. \
         You will review the article written by the Content Writer. \
         Your job is to ensure that the article is well-written, engaging, and free of errors. \
         You will also check the article for factual accuracy and ensure it meets the quality standards of the publication.",
    );

    vec![
        StageSpec::new(
            "plan",
            "1. Prioritize the latest trends, key players, and noteworthy news on {{topic}}.\n\
             2. Identify the target audience and their pain points.\n\
             3. Create a content outline with intro, key points, and a call to action.\n\
             4. Include SEO keywords and relevant data or sources.",
            "A detailed content plan with outline, audience analysis, SEO keywords, and references.",
            planner,
        ),
        StageSpec::new(
            "write",
            "1. Use the content plan to write a compelling blog post on {{topic}}.\n\
             2. Naturally incorporate SEO keywords.\n\
             3. Use engaging section titles.\n\
             4. Include intro, body, and conclusion.\n\
             5. Proofread and ensure alignment with brand voice.",
            "A ready-to-publish blog post in markdown format, 2–3 paragraphs per section.",
            writer,
        ),
        StageSpec::new(
            "edit",
            "Proofread the blog post on {{topic}} for grammar and tone alignment with brand voice.",
            "A polished blog post in markdown format, ready for publishing.",
            editor,
        ),
    ]
});

static UNIFIED: Lazy<Vec<StageSpec>> = Lazy::new(|| {
    let specialist = ExecutorRole::new(
        RoleKind::UnifiedSpecialist,
        "Complete Content Creation Specialist",
        "You are a comprehensive content creation specialist who handles the entire article creation process. \
         You must perform three distinct functions in sequence:\n\
         1. RESEARCH & PLANNING: Plan engaging and factually accurate content on {{topic}}\n\
         2. CONTENT WRITING: Write a comprehensive and engaging article based on your research\n\
         3. EDITING & REVIEW: Review and edit the article to ensure it meets quality standards",
        "You are an expert content creation specialist with expertise in research, writing, and editing. \
         You work as a one-person editorial team, capable of:\n\n\
         AS A CONTENT PLANNER:\n\
         - You work on planning a blog article about the topic: {{topic}}\n\
         - You collect information that helps the audience learn something and make informed decisions\n\
         - You create comprehensive research and planning as the foundation for article writing\n\n\
         AS A CONTENT WRITER:\n\
         - You are a skilled content writer who transforms research into compelling articles\n\
         - You write blog articles based on the research and planning you've completed\n\
         - Your articles are engaging, informative, and well-structured\n\
         - You ensure that articles are factually accurate and provide value to readers\n\n\
         AS A CONTENT EDITOR:\n\
         - You are a content editor who reviews and polishes written content\n\
         - You ensure articles are well-written, engaging, and free of errors\n\
         - You check for factual accuracy and ensure content meets quality standards\n\
         - You provide the final polish for publication-ready content",
    );

    vec![StageSpec::new(
        "create_content",
        "You must complete the entire content creation process for the topic: {{topic}}\n\n\
         PHASE 1 - RESEARCH & PLANNING:\n\
         1. Prioritize the latest trends, key players, and noteworthy news on {{topic}}\n\
         2. Identify the target audience and their pain points\n\
         3. Create a content outline with intro, key points, and a call to action\n\
         4. Include SEO keywords and relevant data or sources\n\n\
         PHASE 2 - CONTENT WRITING:\n\
         1. Use your research and content plan to write a compelling blog post on {{topic}}\n\
         2. Naturally incorporate SEO keywords\n\
         3. Use engaging section titles\n\
         4. Include intro, body, and conclusion\n\
         5. Ensure alignment with brand voice\n\n\
         PHASE 3 - EDITING & REVIEW:\n\
         1. Proofread the blog post for grammar and readability\n\
         2. Check tone alignment with brand voice\n\
         3. Verify factual accuracy\n\
         4. Ensure the article meets publication quality standards\n\
         5. Make final polishing adjustments\n\n\
         IMPORTANT: You must complete ALL three phases in sequence. \
         Show your work for each phase clearly.",
        "A complete, publication-ready article that includes:\n\
         1. Research summary and content plan\n\
         2. Full blog post in markdown format (2-3 paragraphs per section)\n\
         3. Editorial review notes and final polished version\n\
         The final output should be a polished blog post ready for publishing.",
        specialist,
    )]
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::Topic;

    #[test]
    fn chained_has_three_distinct_roles_in_order() {
        let stages = Topology::Chained.stages();
        let names: Vec<_> = stages.iter().map(|s| s.name.as_str()).collect();
        let kinds: Vec<_> = stages.iter().map(|s| s.executor.kind).collect();

        assert_eq!(names, ["plan", "write", "edit"]);
        assert_eq!(kinds, [RoleKind::Planner, RoleKind::Writer, RoleKind::Editor]);
    }

    #[test]
    fn unified_is_one_stage_with_all_phases() {
        let stages = Topology::Unified.stages();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].executor.kind, RoleKind::UnifiedSpecialist);
        for phase in ["PHASE 1", "PHASE 2", "PHASE 3"] {
            assert!(stages[0].description.contains(phase), "missing {phase}");
        }
    }

    #[test]
    fn specialist_persona_covers_writer_and_editor_duties() {
        let backstory = &Topology::Unified.stages()[0].executor.backstory;
        for line in [
            "You are a skilled content writer who transforms research into compelling articles",
            "You write blog articles based on the research and planning you've completed",
            "Your articles are engaging, informative, and well-structured",
            "You are a content editor who reviews and polishes written content",
            "You check for factual accuracy and ensure content meets quality standards",
        ] {
            assert!(backstory.contains(line), "missing persona line: {line}");
        }
    }

    #[test]
    fn writer_contract_keeps_paragraph_range() {
        let write = &Topology::Chained.stages()[1];
        assert_eq!(
            write.expected_output,
            "A ready-to-publish blog post in markdown format, 2–3 paragraphs per section."
        );
    }

    #[test]
    fn every_stage_is_topic_scoped() {
        let topic = Topic::parse("Quantum Gardening").unwrap();
        for topology in [Topology::Chained, Topology::Unified] {
            for stage in topology.stages() {
                let bound = stage.bind(&topic).unwrap();
                assert!(
                    bound.description.contains("Quantum Gardening"),
                    "{} does not mention the topic",
                    stage.name
                );
                assert!(!bound.description.contains("{{"));
            }
        }
    }

    #[test]
    fn registries_are_shared_across_calls() {
        assert!(std::ptr::eq(
            Topology::Chained.stages().as_ptr(),
            Topology::Chained.stages().as_ptr()
        ));
    }
}
