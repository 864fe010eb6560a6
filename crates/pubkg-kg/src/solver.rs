//! Question answering over the knowledge graph.
//!
//! The question is tokenised, matching nodes become entry points, a BFS of
//! `depth` hops collects the neighbourhood, and the induced subgraph is
//! rendered as plain-text context for an [`AnswerSynthesizer`]. Citations
//! are the de-duplicated source references of that subgraph.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use pubkg_common::{PubkgError, Result};
use pubkg_config::{LlmConfig, SolverConfig};

use crate::graph::{KnowledgeGraph, SourceRef};
use crate::persist::load_knowledge_graph;

pub const KG_NOT_FOUND: &str = "Knowledge graph not found at provided path.";
pub const NO_RELEVANT_INFO: &str = "No relevant information found in KG.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<SourceRef>,
}

impl Answer {
    fn uncited(answer: &str) -> Self {
        Self { answer: answer.to_string(), citations: Vec::new() }
    }
}

/// Lower-case and split into runs of ASCII letters and digits.
pub fn simple_tokenise(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Nodes whose normalised text (or text, when absent) contains any token.
pub fn identify_entry_nodes(kg: &KnowledgeGraph, tokens: &[String]) -> Vec<String> {
    kg.nodes()
        .filter(|(_, node)| {
            let haystack = node
                .normalized_text
                .as_deref()
                .filter(|n| !n.is_empty())
                .unwrap_or(&node.text)
                .to_lowercase();
            tokens.iter().any(|t| !t.is_empty() && haystack.contains(t.as_str()))
        })
        .map(|(id, _)| id.clone())
        .collect()
}

/// Induced subgraph of everything within `depth` hops of `entries`,
/// following edges in both directions.
pub fn traverse_subgraph(kg: &KnowledgeGraph, entries: &[String], depth: usize) -> KnowledgeGraph {
    let mut visited: HashSet<String> = entries.iter().cloned().collect();
    let mut queue: VecDeque<(String, usize)> = entries.iter().map(|e| (e.clone(), 0)).collect();

    while let Some((id, hops)) = queue.pop_front() {
        if hops >= depth {
            continue;
        }
        let neighbours = kg
            .out_edges(&id)
            .map(|e| &e.target)
            .chain(kg.in_edges(&id).map(|e| &e.source));
        for next in neighbours {
            if visited.insert(next.clone()) {
                queue.push_back((next.clone(), hops + 1));
            }
        }
    }
    kg.induced_subgraph(&visited)
}

/// `ENTITY [TYPE] text` lines, then `RELATION (TYPE) subject -> object`.
pub fn format_context(kg: &KnowledgeGraph) -> String {
    let text_of = |id: &str| kg.node(id).map(|n| n.text.as_str()).unwrap_or("");
    let entities = kg
        .nodes()
        .map(|(_, node)| format!("ENTITY [{}] {}", node.entity_type, node.text));
    let relations = kg.edges().map(|e| {
        format!("RELATION ({}) {} -> {}", e.data.relation_type, text_of(&e.source), text_of(&e.target))
    });
    entities.chain(relations).collect::<Vec<_>>().join("\n")
}

/// Node sources then edge sources, de-duplicated on
/// (pmid, section, start, end).
pub fn gather_citations(kg: &KnowledgeGraph) -> Vec<SourceRef> {
    let mut seen = HashSet::new();
    kg.nodes()
        .flat_map(|(_, n)| n.sources.iter())
        .chain(kg.edges().flat_map(|e| e.data.sources.iter()))
        .filter(|s| seen.insert((s.pubmed_id.as_str(), s.section.as_str(), s.start_pos, s.end_pos)))
        .cloned()
        .collect()
}

#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    fn name(&self) -> &str;

    async fn synthesize(&self, question: &str, context: &str) -> Result<String>;
}

/// Echoes the question with a prefix of the context. Needs no service.
pub struct TemplateSynthesizer {
    pub preview_chars: usize,
}

impl Default for TemplateSynthesizer {
    fn default() -> Self {
        Self { preview_chars: 500 }
    }
}

impl TemplateSynthesizer {
    pub fn render(&self, question: &str, context: &str) -> String {
        let preview: String = context.chars().take(self.preview_chars).collect();
        format!(
            "Question: {question}\nRelevant context (truncated to {} chars):\n{preview}",
            self.preview_chars
        )
    }
}

#[async_trait]
impl AnswerSynthesizer for TemplateSynthesizer {
    fn name(&self) -> &str {
        "template"
    }

    async fn synthesize(&self, question: &str, context: &str) -> Result<String> {
        Ok(self.render(question, context))
    }
}

const SYSTEM_PROMPT: &str = "You answer biomedical questions using only the knowledge graph \
context provided. Each ENTITY line is a node and each RELATION line an edge. \
If the context does not answer the question, say so.";

/// Any OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ChatCompletionSynthesizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
    max_tokens: u32,
}

impl ChatCompletionSynthesizer {
    pub fn new(config: &LlmConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl AnswerSynthesizer for ChatCompletionSynthesizer {
    fn name(&self) -> &str {
        "chat-completion"
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn synthesize(&self, question: &str, context: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": format!("Question: {question}\n\nContext:\n{context}") },
            ],
            "max_tokens": self.max_tokens,
            "temperature": 0.1,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key.expose_secret());
        }
        let resp = req.send().await?;
        let status = resp.status();
        let json: serde_json::Value = resp.json().await?;
        if !status.is_success() {
            let message = json["error"]["message"].as_str().unwrap_or("unknown API error");
            return Err(PubkgError::Pipeline(format!("LLM API error [{}]: {}", status.as_u16(), message)));
        }

        json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| PubkgError::Pipeline("LLM response has no message content".into()))
    }
}

pub struct KgSolver {
    synthesizer: Box<dyn AnswerSynthesizer>,
    fallback: TemplateSynthesizer,
    depth: usize,
}

impl KgSolver {
    pub fn new(synthesizer: Box<dyn AnswerSynthesizer>, depth: usize) -> Self {
        Self { synthesizer, fallback: TemplateSynthesizer::default(), depth }
    }

    /// Chat completion when an LLM is configured, the template otherwise.
    pub fn from_config(config: &SolverConfig) -> Result<Self> {
        let template = TemplateSynthesizer { preview_chars: config.context_preview_chars };
        let synthesizer: Box<dyn AnswerSynthesizer> = match &config.llm {
            Some(llm) => Box::new(ChatCompletionSynthesizer::new(llm, Duration::from_secs(llm.timeout_secs))?),
            None => Box::new(TemplateSynthesizer { preview_chars: config.context_preview_chars }),
        };
        Ok(Self { synthesizer, fallback: template, depth: config.traversal_depth })
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Load the graph at `kg_path` and answer against it. A missing or
    /// unreadable graph yields the fixed "not found" answer.
    #[instrument(skip(self), fields(path = %kg_path.display()))]
    pub async fn answer(&self, question: &str, kg_path: &Path) -> Answer {
        let kg = match load_knowledge_graph(kg_path) {
            Ok(kg) => kg,
            Err(PubkgError::NotFound(_)) => return Answer::uncited(KG_NOT_FOUND),
            Err(e) => {
                warn!(error = %e, "Could not load knowledge graph");
                return Answer::uncited(KG_NOT_FOUND);
            }
        };
        self.answer_with_graph(question, &kg).await
    }

    pub async fn answer_with_graph(&self, question: &str, kg: &KnowledgeGraph) -> Answer {
        let tokens = simple_tokenise(question);
        let entries = identify_entry_nodes(kg, &tokens);
        if entries.is_empty() {
            return Answer::uncited(NO_RELEVANT_INFO);
        }

        let sub = traverse_subgraph(kg, &entries, self.depth);
        debug!(entries = entries.len(), nodes = sub.node_count(), edges = sub.edge_count(), "Subgraph collected");
        let context = format_context(&sub);

        let answer = match self.synthesizer.synthesize(question, &context).await {
            Ok(text) => text,
            Err(e) => {
                warn!(synthesizer = self.synthesizer.name(), error = %e, "Synthesis failed, using template");
                self.fallback.render(question, &context)
            }
        };
        let citations = gather_citations(&sub);
        info!(citations = citations.len(), "Question answered");
        Answer { answer, citations }
    }
}

/// Answer with the template synthesizer.
pub async fn answer_question(question: &str, kg_path: &Path, depth: usize) -> Answer {
    KgSolver::new(Box::new(TemplateSynthesizer::default()), depth)
        .answer(question, kg_path)
        .await
}
