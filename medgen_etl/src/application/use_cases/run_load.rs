// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Run-Load Use Case
//!
//! The orchestrator: one invocation performs one ETL run.
//!
//! ## Phases
//!
//! 1. **Download** - a single FTP session fetches the release version, the
//!    checksum manifest (unless verification is disabled), and every
//!    configured file, with resume and retry. The phase is synchronous and
//!    runs under `spawn_blocking`; a failure here ends the run before any
//!    database work.
//! 2. **ETL** - per configured table, in declared order: initialize
//!    staging, stream parse → encode → bulk load, apply (full swap, or
//!    CDC + delta merge), record a run-detail row, accumulate totals,
//!    clean up. Tables are strictly sequential; two apply phases never
//!    interleave.
//! 3. **Terminal audit** - `Succeeded` with aggregates, or `Failed` with
//!    the formatted error. A failure may have invalidated the working
//!    session, so the terminal `Failed` record is written over a fresh
//!    connection.
//!
//! `records_loaded` counts inserted + updated rows; soft deletes are
//! reported per table but never counted as loaded.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{error, info, warn};
use uuid::Uuid;

use medgen_etl_domain::entities::{RunContext, RunStatus, TableRunMetrics};
use medgen_etl_domain::error::EtlError;
use medgen_etl_domain::records::{
    ConceptRecord, RelationshipRecord, SemanticTypeRecord,
    SourceAttributeRecord,
};
use medgen_etl_domain::repositories::{ApplyRequest, NativeLoader};
use medgen_etl_domain::services::{HpoMappingParser, NamesParser, PipeDelimitedParser};
use medgen_etl_domain::services::tsv_encoder::stream_tsv;
use medgen_etl_domain::value_objects::{BusinessKey, LoadMode};

use crate::application::etl_config::{
    etl_config, EtlTableConfig, RecordParser, NCBI_FTP_HOST, NCBI_FTP_PATH,
};
use crate::infrastructure::downloader::FtpFetcher;
use crate::infrastructure::loader::create_loader;

/// Everything one run needs, resolved from the validated CLI.
#[derive(Debug, Clone)]
pub struct EtlSettings {
    pub download_dir: PathBuf,
    pub db_dsn: String,
    pub mode: LoadMode,
    pub max_parse_errors: u64,
    pub verify: bool,
    pub ftp_host: String,
    pub ftp_path: String,
}

impl EtlSettings {
    pub fn new(
        download_dir: PathBuf,
        db_dsn: String,
        mode: LoadMode,
        max_parse_errors: u64,
        verify: bool,
    ) -> Self {
        Self {
            download_dir,
            db_dsn,
            mode,
            max_parse_errors,
            verify,
            ftp_host: NCBI_FTP_HOST.to_string(),
            ftp_path: NCBI_FTP_PATH.to_string(),
        }
    }
}

/// Aggregate outcome of a successful run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub records_extracted: u64,
    pub records_loaded: u64,
}

/// Executes one complete ETL run.
pub async fn run_etl(settings: EtlSettings) -> Result<RunSummary, EtlError> {
    let mut run = RunContext::new(settings.mode, env!("CARGO_PKG_VERSION"));
    info!("Starting MedGen ETL run ID: {}", run.run_id);
    info!(
        "Package version: {}, Mode: {}",
        run.package_version, run.mode
    );

    // --- Download phase (blocking FTP work, off the async runtime) ---
    let outcome = {
        let host = settings.ftp_host.clone();
        let base_path = settings.ftp_path.clone();
        let download_dir = settings.download_dir.clone();
        let verify = settings.verify;
        tokio::task::spawn_blocking(move || {
            download_phase(&host, &base_path, &download_dir, verify)
        })
        .await
        .map_err(|e| EtlError::io_error(format!("download task failed: {e}")))??
    };
    run.release_version = outcome.release_version.clone();
    run.source_files = outcome.source_files.clone();

    // --- ETL phase ---
    let mut loader = create_loader(&settings.db_dsn)?;
    loader.connect().await?;
    let log_id = loader.log_run_start(&run).await?;

    let mut total_extracted = 0u64;
    let mut total_loaded = 0u64;
    let result = run_tables(
        &mut *loader,
        &settings,
        &outcome.local_paths,
        log_id,
        &mut total_extracted,
        &mut total_loaded,
    )
    .await;

    match result {
        Ok(()) => {
            loader
                .log_run_finish(
                    log_id,
                    RunStatus::Succeeded,
                    total_extracted,
                    total_loaded,
                    None,
                )
                .await?;
            loader.close().await?;
            info!("--- ETL process finished successfully. ---");
            Ok(RunSummary {
                run_id: run.run_id,
                records_extracted: total_extracted,
                records_loaded: total_loaded,
            })
        }
        Err(e) => {
            error!(
                "An unexpected error occurred during the ETL process: {}",
                e
            );
            let _ = loader.close().await;
            record_failure(&settings.db_dsn, log_id, total_extracted, total_loaded, &e).await;
            Err(e)
        }
    }
}

/// Writes the terminal `Failed` audit record over a fresh connection; the
/// working session may have been invalidated by the failure itself.
async fn record_failure(
    db_dsn: &str,
    log_id: i64,
    records_extracted: u64,
    records_loaded: u64,
    cause: &EtlError,
) {
    let attempt = async {
        let mut error_loader = create_loader(db_dsn)?;
        error_loader.connect().await?;
        error_loader
            .log_run_finish(
                log_id,
                RunStatus::Failed,
                records_extracted,
                records_loaded,
                Some(&format!("{cause:?}")),
            )
            .await?;
        error_loader.close().await
    };
    if let Err(log_e) = attempt.await {
        error!("Failed to log the ETL failure: {}", log_e);
    }
}

async fn run_tables(
    loader: &mut dyn NativeLoader,
    settings: &EtlSettings,
    local_paths: &HashMap<String, PathBuf>,
    log_id: i64,
    total_extracted: &mut u64,
    total_loaded: &mut u64,
) -> Result<(), EtlError> {
    for config in etl_config() {
        let local_path = local_paths.get(config.file).ok_or_else(|| {
            EtlError::invalid_config(format!("No local copy recorded for {}", config.file))
        })?;

        info!(
            "--- Starting ETL for {} -> {} ---",
            config.file, config.prod_table
        );

        // 1. Initialize staging
        loader
            .initialize_staging(config.staging_table, config.staging_ddl)
            .await?;

        // 2. Parse, transform, and load into staging
        info!("Opening and parsing {}...", local_path.display());
        let mut stream = open_record_stream(config, local_path, settings.max_parse_errors)?;
        let extracted = loader
            .bulk_load(config.staging_table, &mut *stream)
            .await?;
        drop(stream);
        info!("Extracted and staged {} records.", extracted);

        let mut metrics = TableRunMetrics::new(config.prod_table);
        metrics.records_extracted = extracted;
        *total_extracted += extracted;

        // 3. Apply changes to production and capture metrics
        let business_key = BusinessKey::new(config.business_key)?;
        let request = ApplyRequest {
            mode: settings.mode,
            staging_table: config.staging_table,
            production_table: config.prod_table,
            production_ddl: config.prod_ddl,
            index_ddls: config.index_ddls,
            pk_name: config.prod_pk,
            business_key: Some(&business_key),
            full_load_select_sql: config.full_load_select_sql,
        };
        let apply_metrics = match settings.mode {
            LoadMode::Full => loader.apply_changes(&request).await?,
            LoadMode::Delta => {
                // Identify changes, then apply them in the same session.
                loader
                    .execute_cdc(
                        config.staging_table,
                        config.prod_table,
                        config.prod_pk,
                        &business_key,
                    )
                    .await?;
                loader.apply_changes(&request).await?
            }
        };
        metrics.absorb_apply(apply_metrics);

        // 4. Record per-table metrics
        loader.log_run_detail(log_id, &metrics).await?;

        // 5. Loaded means new or changed in production
        *total_loaded += metrics.records_loaded();

        // 6. Cleanup staging and backup tables
        loader.cleanup(config.staging_table, config.prod_table).await?;
    }
    Ok(())
}

/// Builds the lazy parse→encode byte stream for one table's local file.
///
/// Gzip members are decompressed on the fly; everything downstream sees a
/// plain buffered text stream.
fn open_record_stream(
    config: &EtlTableConfig,
    path: &Path,
    max_errors: u64,
) -> Result<Box<dyn Iterator<Item = Result<Vec<u8>, EtlError>> + Send>, EtlError> {
    let file = File::open(path)?;
    let reader: Box<dyn std::io::BufRead + Send> = if config.file.ends_with(".gz") {
        Box::new(BufReader::new(GzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(match config.parser {
        RecordParser::Concepts => Box::new(stream_tsv(
            PipeDelimitedParser::<_, ConceptRecord>::new(reader, max_errors),
        )),
        RecordParser::SemanticTypes => Box::new(stream_tsv(PipeDelimitedParser::<
            _,
            SemanticTypeRecord,
        >::new(reader, max_errors))),
        RecordParser::Relationships => Box::new(stream_tsv(PipeDelimitedParser::<
            _,
            RelationshipRecord,
        >::new(reader, max_errors))),
        RecordParser::Sources => Box::new(stream_tsv(PipeDelimitedParser::<
            _,
            SourceAttributeRecord,
        >::new(reader, max_errors))),
        RecordParser::Names => Box::new(stream_tsv(NamesParser::new(reader, max_errors))),
        RecordParser::HpoMapping => {
            Box::new(stream_tsv(HpoMappingParser::new(reader, max_errors)))
        }
    })
}

/// One FTP session: release version, manifest, every configured file.
struct DownloadOutcome {
    release_version: String,
    source_files: BTreeMap<String, String>,
    local_paths: HashMap<String, PathBuf>,
}

fn download_phase(
    host: &str,
    base_path: &str,
    download_dir: &Path,
    verify: bool,
) -> Result<DownloadOutcome, EtlError> {
    fs::create_dir_all(download_dir)?;
    let mut fetcher = FtpFetcher::new(host, base_path);
    fetcher.connect()?;
    let result = fetch_release(&mut fetcher, download_dir, verify);
    fetcher.close();
    result
}

fn fetch_release(
    fetcher: &mut FtpFetcher,
    download_dir: &Path,
    verify: bool,
) -> Result<DownloadOutcome, EtlError> {
    let release_version = fetcher.fetch_release_version("README");
    info!("MedGen Release Version: {}", release_version);

    let checksums = if verify {
        // The manifest name varies across mirrors; take the first listing
        // entry mentioning md5, falling back to the conventional name.
        let listing = fetcher.list_files()?;
        let checksum_filename = listing
            .iter()
            .find(|f| f.to_lowercase().contains("md5"))
            .cloned()
            .unwrap_or_else(|| "md5sum.txt".to_string());
        info!("Attempting to use checksum file: {}", checksum_filename);
        Some(fetcher.fetch_checksums(&checksum_filename)?)
    } else {
        warn!("Running with --no-verify. File integrity will not be checked.");
        None
    };

    let mut local_paths = HashMap::new();
    for config in etl_config() {
        let local_path = download_dir.join(config.file);
        fetcher.download_file(config.file, &local_path, checksums.as_ref())?;
        local_paths.insert(config.file.to_string(), local_path);
    }

    let source_files = checksums
        .map(|manifest| manifest.subset(etl_config().iter().map(|c| c.file)))
        .unwrap_or_default();

    Ok(DownloadOutcome {
        release_version,
        source_files,
        local_paths,
    })
}
