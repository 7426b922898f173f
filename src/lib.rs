//! # Latent Assets
//!
//! Indexes user-uploaded images by a multimodal embedding and serves
//! natural-language similarity queries over them, optionally biased by
//! user-assigned tags.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────────────┐   ┌───────────┐
//! │ Uploads  │──▶│ Ingest                     │──▶│  SQLite    │
//! │          │   │ dedup → store → embed      │   │ vectors +  │
//! └──────────┘   └───────────────────────────┘   │ payloads   │
//!                                                 └─────┬─────┘
//!                             ┌─────────────────────────┤
//!                             ▼                         ▼
//!                       ┌──────────┐             ┌──────────┐
//!                       │   CLI    │             │   HTTP   │
//!                       │ (latent) │             │  (axum)  │
//!                       └──────────┘             └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`dedup`] | Content fingerprinting and duplicate detection |
//! | [`embedding`] | Embedding gateway client and vector utilities |
//! | [`store`] | Asset Index: vector collection backends |
//! | [`search`] | Tag-biased hybrid search |
//! | [`ingest`] | Batch ingestion orchestration |
//! | [`storage`] | Durable byte storage for uploads |
//! | [`server`] | HTTP API |

pub mod config;
pub mod dedup;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod models;
pub mod search;
pub mod server;
pub mod storage;
pub mod store;
