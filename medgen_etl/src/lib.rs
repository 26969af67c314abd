// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # MedGen ETL
//!
//! An extract-transform-load pipeline that ingests the NCBI MedGen public
//! data release - pipe-delimited RRF files and gzip-compressed tab-delimited
//! mapping files - into PostgreSQL, atomically, resumably, and idempotently,
//! in either full-refresh or incremental (delta) mode.
//!
//! ## Architecture Overview
//!
//! The crate follows Clean Architecture:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (Run-load use case, static ETL configuration)              │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Domain Layer (medgen-etl-domain)                 │
//! │  (Records, parsers, encoder, value objects, loader port)    │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (FTP fetcher, PostgreSQL native loader, DDL catalog)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! Per logical table, strictly one way:
//!
//! ```text
//! Fetcher → Parser → Encoder → Staging Loader → CDC → Apply → Audit
//! ```
//!
//! The fetcher downloads with resume and checksum verification; the parser
//! yields typed records lazily; the encoder produces COPY TEXT lines; the
//! staging loader streams them through the native bulk channel; the CDC
//! engine classifies staging rows against production; the apply engine
//! commits either an atomic table swap (full) or a soft-delete merge
//! (delta); and the audit logger records run- and table-level metrics.
//! Logical tables are processed sequentially within a single run.

pub mod application;
pub mod infrastructure;
