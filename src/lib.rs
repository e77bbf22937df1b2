pub mod agent;
pub mod catalog;
pub mod core;
pub mod embedding;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod tools;
