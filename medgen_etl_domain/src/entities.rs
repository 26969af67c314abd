// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain entities: the ETL run and its metrics.

pub mod etl_run;

pub use etl_run::{ApplyMetrics, CdcCounts, RunContext, RunStatus, TableRunMetrics};
