pub mod compare;
pub mod evolution;
pub mod merge;
pub mod models;
pub mod prompts;

pub use compare::ConceptComparator;
pub use evolution::EvolutionAnalyzer;
pub use merge::MergeSynthesizer;
pub use models::{
    CombinedSummary, CompareDecision, CompareResult, EvolutionResult, EvolutionType,
    ParentVersion, RankingResult, RankingsResponse,
};
