//! resume-rag: retrieval-augmented context for resume screening
//!
//! Keeps three vector collections (resumes, job descriptions, curated HR
//! knowledge), scores resumes against job descriptions and builds the
//! context handed to a language model. Everything keeps working, with empty
//! results, when the embedding model or the store is unavailable.

pub mod commands;
pub mod config;
pub mod embed;
pub mod embedding_backend;
pub mod error;
pub mod knowledge;
pub mod metadata;
pub mod progress;
pub mod rag;
pub mod store;

pub use error::{Error, Result};
pub use rag::{Outcome, ResumeRag};
