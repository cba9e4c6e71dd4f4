// Analysis pipeline: prompt assembly, generation calls and structured extraction.
// All model calls go through llm_client::TextGenerator.

pub mod handlers;
pub mod pipeline;
pub mod prompt_builder;
pub mod prompts;
