pub mod analyzer;
pub mod args;
pub mod client;
pub mod config;
pub mod errors;
pub mod extract;
pub mod input;
pub mod normalize;
pub mod prompts;
pub mod retry;
pub mod scanner;

// Re-export commonly used items for convenience
pub use analyzer::CodebaseAnalyzer;
pub use config::AiConfig;
pub use errors::AnalysisError;
pub use normalize::AnalysisReport;
