// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! SQL catalog for the warehouse tables.

pub mod ddl;
