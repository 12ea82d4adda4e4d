#![forbid(unsafe_code)]

//! Shared test utilities for the tessera workspace.

pub mod fixtures;
pub mod http_server;
pub mod rng;
pub mod scripted_net;

pub use fixtures::*;
pub use http_server::{ChunkServer, TestHttpServer};
pub use rng::*;
pub use scripted_net::ScriptedNet;
