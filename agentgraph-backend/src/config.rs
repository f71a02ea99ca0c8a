//! Environment and file-based configuration.
//!
//! Process settings come from the environment; agents, classifiers and the
//! graph topology are JSON files under the config directory:
//!
//! ```text
//! config/
//!   graph.json            - nodes, entry points, edges, agent file refs
//!   agents/<name>.json    - one completion agent or classifier per file
//! ```
//!
//! Secrets never live in the files: agent configs name the env var holding
//! their API key.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::agent::{Agent, GraphNode};
use crate::ai::{
    ClaudeClient, CompletionClient, EmbeddingClient, LlmProvider, OpenAiClient,
    OpenAiEmbeddingClient,
};
use crate::error::EngineError;
use crate::graph::{Edge, Graph};
use crate::handlers::{CredentialKind, CredentialSet, HandlerRegistry};
use crate::intent::{IntentClassifier, IntentExample};

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub config_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            config_dir: env::var("CONFIG_DIR")
                .unwrap_or_else(|_| "./config".to_string())
                .into(),
        }
    }
}

/// Completion-provider settings for one agent.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl LlmConfig {
    fn resolve_api_key(&self) -> String {
        self.api_key_env
            .as_deref()
            .and_then(|name| env::var(name).ok())
            .unwrap_or_default()
    }
}

/// Embedding-provider settings for a classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub dimension: Option<usize>,
}

impl EmbeddingConfig {
    fn resolve_api_key(&self) -> String {
        self.api_key_env
            .as_deref()
            .and_then(|name| env::var(name).ok())
            .unwrap_or_default()
    }
}

/// One completion agent, as stored in `agents/<name>.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub system_prompt: String,
    #[serde(default)]
    pub public_desc: String,
    pub llm: LlmConfig,
    #[serde(default)]
    pub credentials: HashMap<CredentialKind, String>,
}

/// One intent group in a classifier config.
#[derive(Debug, Clone, Deserialize)]
pub struct IntentConfig {
    pub label: String,
    pub examples: Vec<String>,
}

/// One classifier agent, as stored in `agents/<name>.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub name: String,
    pub intents: Vec<IntentConfig>,
    #[serde(default)]
    pub threshold: Option<f32>,
    pub embedding: EmbeddingConfig,
    /// Where to persist the embedded index; no persistence when absent.
    #[serde(default)]
    pub index_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Completion,
    Classifier,
}

/// Reference from graph.json to an agent file.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentRef {
    pub kind: AgentKind,
    pub file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryPointConfig {
    pub node: String,
    pub prompt: String,
    #[serde(default)]
    pub result_key: Option<String>,
    #[serde(default)]
    pub handlers: Option<Vec<String>>,
}

/// The whole `graph.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub agents: Vec<AgentRef>,
    pub nodes: Vec<NodeConfig>,
    pub entry_points: Vec<EntryPointConfig>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, EngineError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        EngineError::Configuration(format!("failed to read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        EngineError::Configuration(format!("failed to parse {}: {}", path.display(), e))
    })
}

pub fn create_completion_client(
    llm: &LlmConfig,
) -> Result<Arc<dyn CompletionClient>, EngineError> {
    let api_key = llm.resolve_api_key();
    let client: Arc<dyn CompletionClient> = match llm.provider {
        LlmProvider::OpenAi => Arc::new(
            OpenAiClient::new(
                &api_key,
                llm.endpoint.as_deref(),
                llm.model.as_deref(),
                llm.max_tokens,
            )
            .map_err(EngineError::Configuration)?,
        ),
        LlmProvider::Claude => Arc::new(
            ClaudeClient::new(
                &api_key,
                llm.endpoint.as_deref(),
                llm.model.as_deref(),
                llm.max_tokens,
            )
            .map_err(EngineError::Configuration)?,
        ),
    };
    Ok(client)
}

pub fn create_embedding_client(
    cfg: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingClient>, EngineError> {
    let client = OpenAiEmbeddingClient::new(
        &cfg.resolve_api_key(),
        cfg.endpoint.as_deref(),
        cfg.model.as_deref(),
        cfg.dimension,
    )
    .map_err(EngineError::Configuration)?;
    Ok(Arc::new(client))
}

pub fn build_completion_agent(
    config: AgentConfig,
    handlers: Arc<HandlerRegistry>,
) -> Result<Agent, EngineError> {
    let llm = create_completion_client(&config.llm)?;
    let mut credentials = CredentialSet::new();
    for (kind, value) in config.credentials {
        credentials.insert(kind, value);
    }
    Ok(Agent::new(config.name, config.system_prompt, llm)
        .with_public_desc(config.public_desc)
        .with_credentials(credentials)
        .with_handlers(handlers))
}

pub fn build_classifier(config: ClassifierConfig) -> Result<IntentClassifier, EngineError> {
    let embedder = create_embedding_client(&config.embedding)?;
    let examples: Vec<IntentExample> = config
        .intents
        .iter()
        .flat_map(|intent| {
            intent
                .examples
                .iter()
                .map(|utterance| IntentExample::new(intent.label.clone(), utterance.clone()))
        })
        .collect();

    let mut classifier = IntentClassifier::new(config.name, examples, embedder);
    if let Some(threshold) = config.threshold {
        classifier = classifier.with_threshold(threshold);
    }
    if let Some(path) = config.index_file {
        classifier = classifier.with_index_path(path);
    }
    Ok(classifier)
}

/// Load `graph.json` and every referenced agent file, and wire the graph.
pub fn load_graph(config: &Config, handlers: Arc<HandlerRegistry>) -> Result<Graph, EngineError> {
    let graph_path = config.config_dir.join("graph.json");
    let graph_config: GraphConfig = read_json(&graph_path)?;

    let mut agents: HashMap<String, GraphNode> = HashMap::new();
    for agent_ref in &graph_config.agents {
        let path = config.config_dir.join(&agent_ref.file);
        let (name, node) = match agent_ref.kind {
            AgentKind::Completion => {
                let agent_config: AgentConfig = read_json(&path)?;
                let name = agent_config.name.clone();
                let agent = build_completion_agent(agent_config, handlers.clone())?;
                (name, GraphNode::Completion(Arc::new(agent)))
            }
            AgentKind::Classifier => {
                let classifier_config: ClassifierConfig = read_json(&path)?;
                let name = classifier_config.name.clone();
                let classifier = build_classifier(classifier_config)?;
                (name, GraphNode::Classifier(Arc::new(classifier)))
            }
        };
        agents.insert(name, node);
    }

    let mut graph = Graph::new();
    for node in &graph_config.nodes {
        let agent = agents.get(&node.agent).ok_or_else(|| {
            EngineError::Configuration(format!(
                "node '{}' references unknown agent '{}'",
                node.id, node.agent
            ))
        })?;
        graph.add_node(node.id.clone(), agent.clone());
    }

    for entry in &graph_config.entry_points {
        let mut edge = Edge::entry(entry.node.clone(), entry.prompt.clone());
        edge.result_key = entry.result_key.clone();
        edge.handlers = entry.handlers.clone();
        graph.add_edge(edge);
    }

    for edge in &graph_config.edges {
        graph.add_edge(edge.clone());
    }

    log::info!(
        "[CONFIG] graph loaded: {} agents, {} nodes, {} entry points, {} edges",
        graph_config.agents.len(),
        graph_config.nodes.len(),
        graph_config.entry_points.len(),
        graph_config.edges.len()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT_JSON: &str = r#"{
        "name": "foodie",
        "system_prompt": "You recommend restaurants.",
        "public_desc": "food explorer",
        "llm": { "provider": "openai", "model": "gpt-4o-mini" },
        "credentials": { "ETH": "0x01" }
    }"#;

    const CLASSIFIER_JSON: &str = r#"{
        "name": "router",
        "intents": [
            { "label": "recommend", "examples": ["where should I eat"] },
            { "label": "pay", "examples": ["send money"] }
        ],
        "threshold": 0.4,
        "embedding": { "model": "text-embedding-ada-002" }
    }"#;

    #[test]
    fn test_agent_config_parses() {
        let config: AgentConfig = serde_json::from_str(AGENT_JSON).unwrap();
        assert_eq!(config.name, "foodie");
        assert!(matches!(config.llm.provider, LlmProvider::OpenAi));
        assert_eq!(config.credentials.len(), 1);
    }

    #[test]
    fn test_classifier_config_parses() {
        let config: ClassifierConfig = serde_json::from_str(CLASSIFIER_JSON).unwrap();
        assert_eq!(config.name, "router");
        assert_eq!(config.intents.len(), 2);
        assert_eq!(config.threshold, Some(0.4));
        assert!(config.index_file.is_none());
    }

    #[test]
    fn test_build_completion_agent() {
        let config: AgentConfig = serde_json::from_str(AGENT_JSON).unwrap();
        let agent =
            build_completion_agent(config, Arc::new(HandlerRegistry::new())).unwrap();
        assert_eq!(agent.name(), "foodie");
        assert_eq!(agent.public_desc(), "food explorer");
    }

    #[test]
    fn test_load_graph_from_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("agents")).unwrap();
        fs::write(dir.path().join("agents/foodie.json"), AGENT_JSON).unwrap();
        fs::write(
            dir.path().join("graph.json"),
            r#"{
                "agents": [{ "kind": "completion", "file": "agents/foodie.json" }],
                "nodes": [{ "id": "foodie", "agent": "foodie" }],
                "entry_points": [{ "node": "foodie", "prompt": "^USER_INPUT_0^", "result_key": "end" }],
                "edges": []
            }"#,
        )
        .unwrap();

        let config = Config {
            port: 0,
            config_dir: dir.path().to_path_buf(),
        };
        let graph = load_graph(&config, Arc::new(HandlerRegistry::new())).unwrap();

        assert_eq!(graph.node("foodie").unwrap().name(), "foodie");
        let entries = graph.entry_edges().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].result_key.as_deref(), Some("end"));
    }

    #[test]
    fn test_load_graph_unknown_agent_reference_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("graph.json"),
            r#"{
                "agents": [],
                "nodes": [{ "id": "foodie", "agent": "nope" }],
                "entry_points": []
            }"#,
        )
        .unwrap();

        let config = Config {
            port: 0,
            config_dir: dir.path().to_path_buf(),
        };
        let err = load_graph(&config, Arc::new(HandlerRegistry::new())).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
