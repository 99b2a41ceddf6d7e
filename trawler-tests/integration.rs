//! Integration tests for Trawler
//!
//! These tests drive whole-pipeline flows across crate boundaries: request
//! payloads in, enriched magnet messages out, with every network-facing
//! collaborator replaced by an in-process double.

#[path = "integration/jsonl_transport.rs"]
mod jsonl_transport;
#[path = "integration/pipeline_flow.rs"]
mod pipeline_flow;
#[path = "integration/torrent_pipeline.rs"]
mod torrent_pipeline;
