// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Binary entry point: bootstrap the CLI, initialise logging, run one ETL
//! run, and map the outcome to the process exit code (0 success, 1 any
//! failure).

use tracing::{error, info};

use medgen_etl::application::use_cases::run_load::{run_etl, EtlSettings};
use medgen_etl_bootstrap::{bootstrap_cli, init_logging, result_to_exit_code, ModeArg};
use medgen_etl_domain::value_objects::LoadMode;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    init_logging();

    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            error!("{}", e);
            return std::process::ExitCode::from(1);
        }
    };

    let mode = match cli.mode {
        ModeArg::Full => LoadMode::Full,
        ModeArg::Delta => LoadMode::Delta,
    };
    let settings = EtlSettings::new(
        cli.download_dir,
        cli.db_dsn,
        mode,
        cli.max_parse_errors,
        cli.verify,
    );

    let result = run_etl(settings).await;
    if let Ok(summary) = &result {
        info!(
            "Run {} loaded {} of {} extracted records.",
            summary.run_id, summary.records_loaded, summary.records_extracted
        );
    }
    result_to_exit_code(&result)
}
