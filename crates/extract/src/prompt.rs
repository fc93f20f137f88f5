pub fn build_extraction_prompt(
    chunks: &[&str],
    entity_types: &[String],
    relation_types: &[String],
) -> String {
    let mut text = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        text.push_str(&format!("[Chunk {}]\n{}\n\n", i + 1, chunk));
    }

    format!(
        r#"Extract entities and relationships from the following text.

INSTRUCTIONS:
1. Identify key entities of these types: {}
2. Extract relationships between entities using these predicates: {}
3. Rate your confidence in each entity and relation from 0.0 to 1.0
4. Output ONLY valid JSON, nothing else
5. Use the exact schema below

SCHEMA:
{{
  "entities": [
    {{"id": "E1", "name": "EntityName", "type": "ENTITY_TYPE", "confidence": 0.9, "properties": {{"description": "brief description"}}}}
  ],
  "relations": [
    {{"id": "R1", "subject": "E1", "predicate": "relation_type", "object": "E2", "confidence": 0.8, "properties": {{"evidence": "quote from text"}}}}
  ]
}}

RULES:
- Use sequential IDs: E1, E2, E3 for entities and R1, R2, R3 for relations
- Relation subject and object must be entity IDs
- Evidence must be a direct quote from the text
- Output ONLY the JSON object, no markdown, no explanations

TEXT:
{}
JSON OUTPUT:"#,
        entity_types.join(", "),
        relation_types.join(", "),
        text
    )
}
