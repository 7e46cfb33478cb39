pub mod context_builder;

pub use context_builder::ReconciliationContextBuilder;
