use ingest::DocumentChunk;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub entity_type: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Directed edge between two entity ids. Endpoints may dangle when the
/// referenced entity was dropped by confidence filtering.
///
/// Model output may omit any field; records missing a name or an endpoint
/// are dropped by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub predicate: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Relation {
    /// Subject, predicate and object are all present.
    pub fn is_complete(&self) -> bool {
        [&self.subject, &self.predicate, &self.object]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Raw model output, before filtering.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl KnowledgeGraph {
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Relations with at least one endpoint that is not in `entities`.
    pub fn dangling_relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations
            .iter()
            .filter(|r| self.entity(&r.subject).is_none() || self.entity(&r.object).is_none())
    }

    /// Attach to each chunk the entities named in its text and the relations
    /// touching those entities.
    pub fn attribute(&self, chunks: &[DocumentChunk]) -> Vec<ProcessedChunk> {
        chunks
            .iter()
            .map(|chunk| {
                let text = chunk.content.to_lowercase();
                let entities: Vec<Entity> = self
                    .entities
                    .iter()
                    .filter(|e| !e.name.is_empty() && text.contains(&e.name.to_lowercase()))
                    .cloned()
                    .collect();
                let relations: Vec<Relation> = self
                    .relations
                    .iter()
                    .filter(|r| entities.iter().any(|e| e.id == r.subject || e.id == r.object))
                    .cloned()
                    .collect();

                ProcessedChunk {
                    chunk: chunk.clone(),
                    entities: Some(entities),
                    relations: Some(relations),
                }
            })
            .collect()
    }
}

/// A chunk plus whatever graph content was attributed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedChunk {
    #[serde(flatten)]
    pub chunk: DocumentChunk,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<Relation>>,
}

impl From<DocumentChunk> for ProcessedChunk {
    fn from(chunk: DocumentChunk) -> Self {
        Self {
            chunk,
            entities: None,
            relations: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, name: &str) -> Entity {
        Entity {
            id: id.to_string(),
            name: name.to_string(),
            entity_type: "CONCEPT".to_string(),
            confidence: 0.9,
            properties: Map::new(),
        }
    }

    fn relation(subject: &str, object: &str) -> Relation {
        Relation {
            id: format!("{subject}-{object}"),
            subject: subject.to_string(),
            predicate: "uses".to_string(),
            object: object.to_string(),
            confidence: 0.9,
            properties: Map::new(),
        }
    }

    #[test]
    fn test_partial_records_deserialize() {
        let relation: Relation =
            serde_json::from_str(r#"{"subject": "E1", "object": "E2", "confidence": 0.9}"#).unwrap();
        assert!(relation.predicate.is_empty());
        assert!(!relation.is_complete());
        assert!(self::relation("e1", "e2").is_complete());

        let entity: Entity = serde_json::from_str(r#"{"type": "CONCEPT"}"#).unwrap();
        assert!(entity.name.is_empty());
    }

    #[test]
    fn test_dangling_relations() {
        let graph = KnowledgeGraph {
            entities: vec![entity("e1", "Rust"), entity("e2", "Cargo")],
            relations: vec![relation("e1", "e2"), relation("e1", "e9")],
            metadata: Map::new(),
        };

        let dangling: Vec<_> = graph.dangling_relations().collect();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].object, "e9");
    }

    #[test]
    fn test_attribute_matches_names_case_insensitively() {
        let graph = KnowledgeGraph {
            entities: vec![entity("e1", "Rust"), entity("e2", "Cargo")],
            relations: vec![relation("e1", "e2")],
            metadata: Map::new(),
        };
        let chunk = DocumentChunk::new("doc_0".into(), "rust ships with a compiler.".into(), 0, (0, 27));

        let processed = graph.attribute(&[chunk]);
        let entities = processed[0].entities.as_ref().unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, "e1");
        assert_eq!(processed[0].relations.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_processed_chunk_serializes_flat() {
        let chunk = DocumentChunk::new("doc_0".into(), "text".into(), 0, (0, 4));
        let json = serde_json::to_value(ProcessedChunk::from(chunk)).unwrap();

        assert_eq!(json["document_id"], "doc_0");
        assert!(json.get("entities").is_none());
    }
}
