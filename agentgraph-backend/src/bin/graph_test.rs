//! Graph Test Fixture
//!
//! A minimal harness for running a small agent graph against a real
//! completion endpoint without booting the full app.
//!
//! Usage:
//!   TEST_QUERY="plan a tiny dinner party" \
//!   TEST_LLM_ENDPOINT="https://api.openai.com/v1/chat/completions" \
//!   TEST_LLM_SECRET="your-api-key" \
//!   TEST_LLM_MODEL="gpt-4o-mini" \
//!   cargo run --bin graph_test

use std::env;
use std::sync::Arc;

use futures_util::{pin_mut, StreamExt};

use agentgraph_backend::ai::OpenAiClient;
use agentgraph_backend::{Agent, Edge, Graph, GraphNode, GraphTask, InMemoryMemory, Memory};

#[tokio::main]
async fn main() {
    env_logger::init();

    let query = env::var("TEST_QUERY").unwrap_or_else(|_| "plan a tiny dinner party".to_string());
    let endpoint = env::var("TEST_LLM_ENDPOINT").ok();
    let secret = env::var("TEST_LLM_SECRET").unwrap_or_default();
    let model = env::var("TEST_LLM_MODEL").ok();

    let client = Arc::new(
        OpenAiClient::new(&secret, endpoint.as_deref(), model.as_deref(), None)
            .expect("failed to build completion client"),
    );

    let planner = Agent::new(
        "planner",
        "You produce a short numbered plan for the user's request.",
        client.clone(),
    );
    let writer = Agent::new(
        "writer",
        "You turn a plan into one friendly paragraph.",
        client,
    );

    let mut graph = Graph::new();
    graph.add_node("planner", GraphNode::Completion(Arc::new(planner)));
    graph.add_node("writer", GraphNode::Completion(Arc::new(writer)));
    graph.set_entry_point("planner", "^USER_INPUT_0^", Some("plan".to_string()), None);
    graph.add_edge(
        Edge::new("planner", "writer", "Write up this plan: ^plan^")
            .with_result_key("writeup"),
    );

    let memory: Arc<dyn Memory> = Arc::new(InMemoryMemory::new());
    let task = GraphTask::new(Arc::new(graph), memory);

    println!("query: {}", query);
    println!("---");

    let events = task.run_task(query, 0);
    pin_mut!(events);
    while let Some(item) = events.next().await {
        match item {
            Ok(event) => {
                println!("[{}]", event.agent);
                println!("{}", event.output);
                println!("---");
            }
            Err(e) => {
                eprintln!("task failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let result = task
        .memory()
        .load()
        .last()
        .map(|m| m.content.clone())
        .unwrap_or_default();
    println!("final result:\n{}", result);
}
