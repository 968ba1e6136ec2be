//! End-to-end agent runs without a language model.

use docent::agent::{ChunkKind, ChunkOrigin, ClassifiedChunk, Graph, Status};
use docent::{Document, ToolId};
use futures_util::StreamExt;

fn report() -> Document {
    Document::new(
        "INTRODUCTION\nThis report describes the migration.\n\n\
         CONCLUSION\nThe migration finished on time and under budget.\n\n\
         REFERENCES\n[1] Internal wiki.",
        "txt",
        vec![
            "Introduction".to_string(),
            "Conclusion".to_string(),
            "References".to_string(),
        ],
    )
}

#[tokio::test]
async fn test_conclusion_scenario() {
    let state = Graph::offline()
        .run("Is there a conclusion? summarize it", report())
        .await;

    assert_eq!(state.plan, vec!["heading_search", "summarizer"]);
    assert_eq!(state.status, Status::Completed);
    assert!(
        state
            .final_answer
            .contains("YES - Document has a Conclusion section")
    );
    assert!(state.tool_outputs.contains(ToolId::HeadingSearch));
    assert!(state.tool_outputs.contains(ToolId::Summarizer));
    assert_eq!(state.observations.len(), 2);
    assert!(state.error_message.is_empty());
}

#[tokio::test]
async fn test_overview_and_flow_diagram_plan() {
    let state = Graph::offline()
        .run(
            "Does the document have an overview and a flow diagram?",
            report(),
        )
        .await;

    assert_eq!(state.plan, vec!["heading_search", "diagram_checker"]);
    assert!(
        state
            .final_answer
            .contains("NO - No Overview section found")
    );
    assert!(state.final_answer.contains("NO - No diagrams found"));
}

#[tokio::test]
async fn test_plan_is_deterministic() {
    let graph = Graph::offline();
    for _ in 0..3 {
        let state = graph
            .run(
                "Does the document have an overview and a flow diagram?",
                Document::default(),
            )
            .await;
        assert_eq!(state.plan, vec!["heading_search", "diagram_checker"]);
    }
}

#[tokio::test]
async fn test_validation_plan_runs_three_tools() {
    let state = Graph::offline().run("Is anything missing?", report()).await;

    assert_eq!(
        state.plan,
        vec!["format_checker", "heading_search", "diagram_checker"]
    );
    assert_eq!(state.tool_outputs.len(), 3);
    assert_eq!(state.observations.len(), 3);
    assert!(state.observations[0].starts_with("format_checker: "));
    assert_eq!(state.status, Status::Completed);
    // The critic routes to synthesis as soon as the queue drains.
    assert_eq!(state.loop_counter, 3);
}

#[tokio::test]
async fn test_offline_stream() {
    let chunks: Vec<ClassifiedChunk> = Graph::offline()
        .run_stream("Is there a conclusion? summarize it", report())
        .collect()
        .await;

    let wire: Vec<String> = chunks.iter().map(ClassifiedChunk::to_wire).collect();
    assert_eq!(wire.len(), 4);
    assert_eq!(
        wire[0],
        "THOUGHT:\n### 🎯 Goal\nFind and summarize document overview/summary\n\n"
    );
    assert_eq!(
        wire[1],
        "THOUGHT:### 🧠 Strategy\nQuery asks for overview/summary\n\n"
    );
    assert_eq!(
        wire[2],
        "THOUGHT:### 🔧 Action Plan\n`heading_search → summarizer`\n\n---\n"
    );

    let answer = &chunks[3];
    assert_eq!(answer.kind, ChunkKind::Answer);
    assert_eq!(answer.origin, ChunkOrigin::FinalAnswer);
    assert!(answer.text.contains("YES - Document has a Conclusion section"));
}
