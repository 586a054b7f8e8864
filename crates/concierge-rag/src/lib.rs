//! Retrieval-augmented answer pipeline: context assembly, similarity ranking,
//! generation, confidence policy and the FAQ fallback, driven by
//! [`ChatOrchestrator`].

pub mod context;
pub mod error;
pub mod fallback;
pub mod generate;
pub mod orchestrator;
pub mod policy;
pub mod ranker;

pub use context::{AssembledContext, ContextAssembler, RetrievalConfig, Retriever};
pub use error::{ChatError, FailureKind, PipelineFailure};
pub use fallback::FallbackResponder;
pub use generate::{AnswerComposer, GeneratedAnswer, GenerationConfig};
pub use orchestrator::{ChatOrchestrator, ChatOrchestratorBuilder, ChatRequest, ChatResponse};
