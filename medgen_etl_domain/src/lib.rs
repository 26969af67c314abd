// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # MedGen ETL Domain
//!
//! Pure business logic for the MedGen extract-transform-load system. This
//! crate knows what a MedGen release *is* - the record shapes of the RRF and
//! mapping files, how lines are parsed and budgeted, how records are encoded
//! for a native bulk channel, and which operations a database loader must
//! provide - without depending on any database driver, network stack, or
//! async runtime.
//!
//! ## Architecture Position
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │         APPLICATION LAYER (medgen_etl)      │
//! │  - Run-load use case, ETL configuration     │
//! └─────────────────────┬───────────────────────┘
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │           DOMAIN LAYER (this crate)         │
//! │  - Typed records and file schemas           │
//! │  - Parsers and the transport encoder        │
//! │  - Value objects (mode, keys, manifest)     │
//! │  - NativeLoader port                        │
//! └─────────────────────▲───────────────────────┘
//!                       │ implements
//! ┌─────────────────────┴───────────────────────┐
//! │     INFRASTRUCTURE LAYER (medgen_etl)       │
//! │  - FTP fetcher, PostgreSQL loader, DDL      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - `error` - The `EtlError` taxonomy shared by every layer
//! - `entities` - Run context, run status, and load metrics
//! - `value_objects` - Load mode, business keys, checksum manifest
//! - `records` - One frozen record type per MedGen source file
//! - `services` - Record parsers and the bulk-channel encoder
//! - `repositories` - The `NativeLoader` port database adapters implement

pub mod entities;
pub mod error;
pub mod records;
pub mod repositories;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::{ApplyMetrics, CdcCounts, RunContext, RunStatus, TableRunMetrics};
pub use error::EtlError;
pub use repositories::{ApplyRequest, NativeLoader};
pub use value_objects::{BusinessKey, ChecksumManifest, LoadMode};
