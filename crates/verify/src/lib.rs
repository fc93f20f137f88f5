pub mod prompt;
pub mod schema;

pub use schema::{Claim, ClaimStatus, FactVerification, OverallStatus};

use anyhow::{Context, Result};
use extract::TextGenerator;
use ingest::DocumentChunk;
use serde_json::{Map, json};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::schema::VerificationResponse;

const VERIFICATION_TEMPERATURE: f32 = 0.1;

pub struct FactVerifier {
    generator: Arc<dyn TextGenerator>,
}

impl FactVerifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Split `answer` into claims and check each against the chunks.
    ///
    /// Returns `None` without chunks. An unparseable response marks the whole
    /// answer inconclusive and records `verification_error` in the metadata.
    pub async fn verify(
        &self,
        answer: &str,
        chunks: &[DocumentChunk],
    ) -> Result<Option<FactVerification>> {
        if chunks.is_empty() {
            return Ok(None);
        }

        let sources: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let prompt = prompt::build_verification_prompt(answer, &sources);

        let response = self
            .generator
            .generate(&prompt, VERIFICATION_TEMPERATURE)
            .await
            .context("Failed to generate fact verification")?;

        let mut metadata = Map::new();
        metadata.insert("source_chunks".to_string(), json!(chunks.len()));

        let claims = match Self::parse(&response) {
            Ok(claims) => claims,
            Err(e) => {
                warn!(error = %e, "fact verification response was not valid JSON");
                metadata.insert("verification_error".to_string(), json!(e.to_string()));
                vec![Claim {
                    text: answer.to_string(),
                    status: ClaimStatus::Inconclusive,
                    confidence: 0.0,
                    evidence: Vec::new(),
                }]
            }
        };

        let count = |status: ClaimStatus| claims.iter().filter(|c| c.status == status).count();
        metadata.insert("claims_verified".to_string(), json!(count(ClaimStatus::Verified)));
        metadata.insert("claims_refuted".to_string(), json!(count(ClaimStatus::Refuted)));
        metadata.insert("claims_inconclusive".to_string(), json!(count(ClaimStatus::Inconclusive)));

        let overall = OverallStatus::from_claims(&claims);
        debug!(claims = claims.len(), ?overall, "verified answer");

        Ok(Some(FactVerification {
            claims,
            overall,
            metadata,
        }))
    }

    fn parse(response: &str) -> Result<Vec<Claim>> {
        let body = extract::json::json_object(response).context("No JSON object in response")?;
        let parsed: VerificationResponse =
            serde_json::from_str(body).context("Failed to parse verification result")?;

        Ok(parsed
            .claims
            .into_iter()
            .filter(|claim| !claim.text.trim().is_empty())
            .map(|mut claim| {
                claim.confidence = claim.confidence.clamp(0.0, 1.0);
                claim
            })
            .collect())
    }
}
