use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Verified,
    Refuted,
    #[default]
    #[serde(other)]
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(default)]
    pub text: String,
    /// Missing or unknown labels read as inconclusive.
    #[serde(default)]
    pub status: ClaimStatus,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Verified,
    PartiallyVerified,
    Unverified,
    Contradicted,
}

impl OverallStatus {
    /// All claims verified, some verified, or none. An empty claim list
    /// verifies nothing.
    pub fn from_claims(claims: &[Claim]) -> Self {
        let verified = claims
            .iter()
            .filter(|c| c.status == ClaimStatus::Verified)
            .count();

        match verified {
            0 => Self::Unverified,
            n if n == claims.len() => Self::Verified,
            _ => Self::PartiallyVerified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactVerification {
    pub claims: Vec<Claim>,
    pub overall: OverallStatus,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Shape the model is asked to produce.
#[derive(Debug, Deserialize)]
pub(crate) struct VerificationResponse {
    pub claims: Vec<Claim>,
}
