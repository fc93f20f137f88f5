pub mod refiner;
pub mod scorer;
pub mod synthesizer;

pub use refiner::{RecursiveRefiner, RefinedChunks};
pub use scorer::{RelevanceScorer, ScoreParseError, ScoringStrategy};
pub use synthesizer::{Answer, AnswerSynthesizer, INSUFFICIENT_INFORMATION};
