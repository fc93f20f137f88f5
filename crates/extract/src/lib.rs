pub mod json;
pub mod llm;
pub mod normalizer;
pub mod prompt;
pub mod schema;
pub mod testing;

pub use llm::{OllamaClient, TextGenerator};
pub use normalizer::EntityNormalizer;
pub use schema::{Entity, ExtractionResult, KnowledgeGraph, ProcessedChunk, Relation};

use anyhow::{Context, Result};
use ingest::DocumentChunk;
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const EXTRACTION_TEMPERATURE: f32 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeGraphConfig {
    pub enabled: bool,
    pub entity_types: Vec<String>,
    pub relation_types: Vec<String>,
    pub min_confidence_threshold: f32,
}

impl Default for KnowledgeGraphConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            entity_types: ["PERSON", "ORGANIZATION", "CONCEPT", "TECHNOLOGY", "LOCATION", "EVENT"]
                .map(String::from)
                .to_vec(),
            relation_types: ["uses", "creates", "part_of", "located_in", "related_to", "causes"]
                .map(String::from)
                .to_vec(),
            min_confidence_threshold: 0.7,
        }
    }
}

pub struct KnowledgeGraphExtractor {
    generator: Arc<dyn TextGenerator>,
    config: KnowledgeGraphConfig,
}

impl KnowledgeGraphExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>, config: KnowledgeGraphConfig) -> Self {
        Self { generator, config }
    }

    /// Build a confidence-filtered graph from the refined chunks.
    ///
    /// Returns `None` when extraction is disabled or there is nothing to read.
    /// A response that cannot be parsed yields an empty graph carrying an
    /// `extraction_error` note; only a failed generator call is an error.
    pub async fn extract(&self, chunks: &[DocumentChunk]) -> Result<Option<KnowledgeGraph>> {
        if !self.config.enabled || chunks.is_empty() {
            return Ok(None);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let prompt = prompt::build_extraction_prompt(
            &texts,
            &self.config.entity_types,
            &self.config.relation_types,
        );

        let response = self
            .generator
            .generate(&prompt, EXTRACTION_TEMPERATURE)
            .await
            .context("Failed to generate knowledge graph")?;

        let raw = match Self::parse(&response) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "knowledge graph response was not valid JSON");
                let mut metadata = Map::new();
                metadata.insert("extraction_error".to_string(), json!(e.to_string()));
                metadata.insert("source_chunks".to_string(), json!(chunks.len()));
                return Ok(Some(KnowledgeGraph {
                    entities: Vec::new(),
                    relations: Vec::new(),
                    metadata,
                }));
            }
        };

        Ok(Some(self.build_graph(raw, chunks.len())))
    }

    fn parse(response: &str) -> Result<ExtractionResult> {
        let body = json::json_object(response).context("No JSON object in response")?;
        serde_json::from_str(body).context("Failed to parse extraction result")
    }

    fn build_graph(&self, raw: ExtractionResult, source_chunks: usize) -> KnowledgeGraph {
        let threshold = self.config.min_confidence_threshold;
        let entities_extracted = raw.entities.len();
        let relations_extracted = raw.relations.len();

        let entities: Vec<Entity> = raw
            .entities
            .into_iter()
            .enumerate()
            .map(|(i, mut entity)| {
                if entity.id.is_empty() {
                    entity.id = format!("entity_{}", i + 1);
                }
                entity.confidence = entity.confidence.clamp(0.0, 1.0);
                entity
            })
            .filter(|e| !e.name.trim().is_empty() && e.confidence >= threshold)
            .collect();

        let relations: Vec<Relation> = raw
            .relations
            .into_iter()
            .enumerate()
            .map(|(i, mut relation)| {
                if relation.id.is_empty() {
                    relation.id = format!("relation_{}", i + 1);
                }
                relation.confidence = relation.confidence.clamp(0.0, 1.0);
                relation
            })
            .filter(|r| r.is_complete() && r.confidence >= threshold)
            .collect();

        let (entities, relations) = Self::merge_duplicates(entities, relations);

        let mut graph = KnowledgeGraph {
            entities,
            relations,
            metadata: Map::new(),
        };

        let dangling = graph.dangling_relations().count();
        let metadata = &mut graph.metadata;
        metadata.insert("source_chunks".to_string(), json!(source_chunks));
        metadata.insert("entities_extracted".to_string(), json!(entities_extracted));
        metadata.insert("relations_extracted".to_string(), json!(relations_extracted));
        metadata.insert("min_confidence_threshold".to_string(), json!(threshold));
        metadata.insert("dangling_relations".to_string(), json!(dangling));

        debug!(
            entities = graph.entities.len(),
            relations = graph.relations.len(),
            dangling,
            "extracted knowledge graph"
        );

        graph
    }

    /// Collapse entities with the same normalized name into the most confident
    /// record and point relations at the surviving id.
    fn merge_duplicates(
        entities: Vec<Entity>,
        mut relations: Vec<Relation>,
    ) -> (Vec<Entity>, Vec<Relation>) {
        let mut normalizer = EntityNormalizer::new();
        let mut groups: Vec<(String, Vec<Entity>)> = Vec::new();

        for entity in entities {
            let key = normalizer.normalize(&entity.name);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(entity),
                None => groups.push((key, vec![entity])),
            }
        }

        let mut renamed: HashMap<String, String> = HashMap::new();
        let mut merged = Vec::with_capacity(groups.len());

        for (_, members) in groups {
            let mut best = 0;
            for (i, member) in members.iter().enumerate() {
                if member.confidence > members[best].confidence {
                    best = i;
                }
            }
            let survivor = members[best].clone();
            for member in &members {
                if member.id != survivor.id {
                    renamed.insert(member.id.clone(), survivor.id.clone());
                }
            }
            merged.push(survivor);
        }

        for relation in &mut relations {
            if let Some(id) = renamed.get(&relation.subject) {
                relation.subject = id.clone();
            }
            if let Some(id) = renamed.get(&relation.object) {
                relation.object = id.clone();
            }
        }

        (merged, relations)
    }

    pub fn config(&self) -> &KnowledgeGraphConfig {
        &self.config
    }
}
