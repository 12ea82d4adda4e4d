//! All workspace integration tests for tessera

mod common;
mod e2e;
