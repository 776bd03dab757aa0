pub mod committer;
pub mod rerank;
pub mod retriever;
pub mod scoring;

pub use committer::{CommitStatus, VersionCommitter};
pub use rerank::{CrossScoreStage, LlmRerankStage, RerankStage, RerankerChain};
pub use retriever::CandidateRetriever;
