//! Local compression history: JSONL logger and aggregation.

pub mod logger;
pub mod reporter;
