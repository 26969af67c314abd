// /////////////////////////////////////////////////////////////////////////////
// MedGen ETL
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # FTP Fetcher
//!
//! Downloads release files from the NCBI FTP server with resume, retry,
//! and checksum verification.
//!
//! ## Behaviour
//!
//! - **Session**: anonymous login, `cwd` into the release directory on
//!   connect, clean `QUIT` on close.
//! - **Resume**: when a non-empty local file exists, the transfer restarts
//!   at its size (FTP `REST`) and the file is opened in append mode.
//! - **Retry**: up to [`MAX_DOWNLOAD_ATTEMPTS`] attempts per file with
//!   exponential backoff (≈2s initial, 60s cap). Transport failures keep
//!   the partial file so the next attempt resumes; a checksum mismatch
//!   deletes the corrupt file so the next attempt starts fresh.
//! - **Verification**: MD5 of the complete local file against the
//!   publisher's manifest. MD5 is a manifest-compatibility choice, not a
//!   security control.
//! - **Release version**: the README is scanned line by line for
//!   `Last update|Release Date|Version: <value>` (case-insensitive); the
//!   sentinel `"Unknown"` is returned when nothing matches or the README
//!   is absent.
//!
//! The API is synchronous; the orchestrator runs the whole download phase
//! under `tokio::task::spawn_blocking`.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;
use suppaftp::FtpStream;
use tracing::{error, info, warn};

use medgen_etl_domain::error::EtlError;
use medgen_etl_domain::value_objects::ChecksumManifest;

/// Attempts per file before the download is declared failed.
pub const MAX_DOWNLOAD_ATTEMPTS: u32 = 5;

static RELEASE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:Last update|Release Date|Version):\s*(.*)").expect("valid release regex")
});

/// Exponential backoff schedule: 2s, 4s, 8s, 16s, capped at 60s.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt).clamp(2, 60))
}

/// First release-version declaration found in README text, trimmed.
pub(crate) fn scan_release_version(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        RELEASE_PATTERN
            .captures(line)
            .map(|caps| caps[1].trim().to_string())
    })
}

/// Streaming MD5 of a local file, lowercase hex.
pub(crate) fn md5_hex(path: &Path) -> Result<String, EtlError> {
    let mut hasher = Md5::new();
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn ftp_err(e: suppaftp::FtpError) -> EtlError {
    EtlError::download_failed(e.to_string())
}

/// FTP session against the MedGen release directory.
pub struct FtpFetcher {
    host: String,
    base_path: String,
    stream: Option<FtpStream>,
}

impl FtpFetcher {
    pub fn new(host: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            base_path: base_path.into(),
            stream: None,
        }
    }

    /// Connects, logs in anonymously, and changes into the base directory.
    pub fn connect(&mut self) -> Result<(), EtlError> {
        info!("Connecting to FTP server: {}", self.host);
        let mut stream = FtpStream::connect((self.host.as_str(), 21)).map_err(ftp_err)?;
        stream.login("anonymous", "anonymous").map_err(ftp_err)?;
        stream.cwd(&self.base_path).map_err(ftp_err)?;
        info!(
            "Successfully connected and changed directory to {}",
            self.base_path
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Quits the session; lenient about servers that drop the control
    /// connection first.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.quit() {
                warn!("FTP quit failed: {}", e);
            } else {
                info!("FTP connection closed.");
            }
        }
    }

    fn stream(&mut self) -> Result<&mut FtpStream, EtlError> {
        self.stream
            .as_mut()
            .ok_or_else(|| EtlError::download_failed("FTP connection not established"))
    }

    /// Lists the files present in the release directory.
    pub fn list_files(&mut self) -> Result<Vec<String>, EtlError> {
        self.stream()?.nlst(None).map_err(ftp_err)
    }

    fn retr_text(&mut self, remote_filename: &str) -> Result<String, EtlError> {
        let cursor = self
            .stream()?
            .retr_as_buffer(remote_filename)
            .map_err(ftp_err)?;
        Ok(String::from_utf8_lossy(cursor.get_ref()).into_owned())
    }

    /// Downloads and parses the checksum manifest.
    ///
    /// # Errors
    ///
    /// `ChecksumsUnavailable` when the file cannot be retrieved; callers
    /// may choose to proceed unverified via `--no-verify`.
    pub fn fetch_checksums(&mut self, checksum_filename: &str) -> Result<ChecksumManifest, EtlError> {
        match self.retr_text(checksum_filename) {
            Ok(text) => Ok(ChecksumManifest::parse(&text)),
            Err(e) => Err(EtlError::ChecksumsUnavailable(format!(
                "Could not find or parse checksum file '{checksum_filename}' on the FTP server. \
                 To proceed without verification, use the --no-verify flag. Original error: {e}"
            ))),
        }
    }

    /// Scans the README for the release date/version, returning the
    /// `"Unknown"` sentinel when it cannot be determined.
    pub fn fetch_release_version(&mut self, readme_filename: &str) -> String {
        info!(
            "Attempting to find release version from '{}'...",
            readme_filename
        );
        match self.retr_text(readme_filename) {
            Ok(text) => match scan_release_version(&text) {
                Some(version) => {
                    info!("Found release version: {}", version);
                    version
                }
                None => {
                    warn!("Release version not found in README. Returning 'Unknown'.");
                    "Unknown".to_string()
                }
            },
            Err(e) => {
                warn!("Could not download or parse '{}': {}", readme_filename, e);
                "Unknown".to_string()
            }
        }
    }

    /// Downloads one file with resume and retry, verifying it against the
    /// manifest when one is supplied.
    ///
    /// Partial files are intentionally retained between attempts so a
    /// retry resumes instead of restarting; only checksum-failed files are
    /// deleted.
    pub fn download_file(
        &mut self,
        remote_filename: &str,
        local_filepath: &Path,
        checksums: Option<&ChecksumManifest>,
    ) -> Result<(), EtlError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_download(remote_filename, local_filepath, checksums) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    error!(
                        "Download of {} failed on attempt {}/{}: {}",
                        remote_filename, attempt, MAX_DOWNLOAD_ATTEMPTS, e
                    );
                    if attempt >= MAX_DOWNLOAD_ATTEMPTS || !e.is_retryable_transfer() {
                        return Err(e);
                    }
                    std::thread::sleep(backoff_delay(attempt));
                }
            }
        }
    }

    fn try_download(
        &mut self,
        remote_filename: &str,
        local_filepath: &Path,
        checksums: Option<&ChecksumManifest>,
    ) -> Result<(), EtlError> {
        if let Some(parent) = local_filepath.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let resume_from = fs::metadata(local_filepath).map(|m| m.len()).unwrap_or(0);
        let mut file = if resume_from > 0 {
            info!(
                "Resuming download for {} from byte {}.",
                remote_filename, resume_from
            );
            OpenOptions::new().append(true).open(local_filepath)?
        } else {
            info!(
                "Downloading {} to {}...",
                remote_filename,
                local_filepath.display()
            );
            File::create(local_filepath)?
        };

        let stream = self.stream()?;
        if resume_from > 0 {
            stream.resume_transfer(resume_from as usize).map_err(ftp_err)?;
        }
        let mut data = stream.retr_as_stream(remote_filename).map_err(ftp_err)?;
        std::io::copy(&mut data, &mut file)?;
        stream.finalize_retr_stream(data).map_err(ftp_err)?;
        file.flush()?;
        drop(file);

        info!("Successfully downloaded {}", remote_filename);

        if let Some(manifest) = checksums {
            let expected = manifest.expect(remote_filename)?;
            info!("Verifying checksum for {}...", remote_filename);
            let actual = md5_hex(local_filepath)?;
            if actual != expected {
                error!(
                    "Checksum mismatch for {}! Expected: {}, Got: {}",
                    remote_filename, expected, actual
                );
                // Corrupt file: delete it so the retry starts fresh.
                fs::remove_file(local_filepath)?;
                return Err(EtlError::ChecksumMismatch {
                    file: remote_filename.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
            info!("Checksum valid for {}.", remote_filename);
        }

        Ok(())
    }
}

impl Drop for FtpFetcher {
    fn drop(&mut self) {
        self.close();
    }
}
