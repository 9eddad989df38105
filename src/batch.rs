//! Convert many files at once.
//!
//! Each input gets its own [`Session`], driven through the same steps an
//! interactive user would take: upload, apply the requested size and
//! quality, encode, save. Sessions share nothing but the backend, so files
//! run in parallel on the rayon pool.
//!
//! Progress is reported per file as a [`BatchEvent`] over an optional
//! channel, which the CLI drains on a printer thread. The returned
//! [`BatchSummary`] holds the same events in input order.

use crate::imaging::ImageBackend;
use crate::session::{ImageDetails, Session, SessionDefaults, SessionError};
use crate::upload::{SourceFile, UploadError};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Per-run settings layered on top of the session defaults.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u32>,
    /// Release the aspect lock before applying `width`/`height`.
    pub unlocked: bool,
    /// Where outputs go. `None` writes next to each input.
    pub output_dir: Option<PathBuf>,
    pub overwrite: bool,
}

/// One successfully converted file.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub original: ImageDetails,
    pub converted: ImageDetails,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_percent: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchEvent {
    Converted {
        index: usize,
        report: ConversionReport,
    },
    /// Not an accepted image type; nothing was read.
    Rejected {
        index: usize,
        source: PathBuf,
        reason: String,
    },
    Failed {
        index: usize,
        source: PathBuf,
        reason: String,
    },
}

impl BatchEvent {
    /// 1-based position of the input this event is about.
    pub fn index(&self) -> usize {
        match self {
            Self::Converted { index, .. }
            | Self::Rejected { index, .. }
            | Self::Failed { index, .. } => *index,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub converted: usize,
    pub rejected: usize,
    pub failed: usize,
    pub events: Vec<BatchEvent>,
}

/// Apply size and quality options to a loaded session.
///
/// Width alone (or height alone) follows the lock; both together pin the
/// exact size, which implies releasing the lock.
pub fn apply_options(session: &mut Session, options: &BatchOptions) -> Result<(), SessionError> {
    let exact = options.width.is_some() && options.height.is_some();
    if options.unlocked || exact {
        session.set_locked(false);
    }
    if let Some(width) = options.width {
        session.set_width(width)?;
    }
    if let Some(height) = options.height {
        session.set_height(height)?;
    }
    if let Some(quality) = options.quality {
        session.set_quality(quality);
    }
    Ok(())
}

/// Convert one file end to end on the calling thread.
pub fn convert_file(
    backend: &(impl ImageBackend + ?Sized),
    path: &Path,
    defaults: SessionDefaults,
    options: &BatchOptions,
) -> Result<ConversionReport, BatchError> {
    let file = SourceFile::from_path(path)?;
    let mut session = Session::new(defaults);
    session.upload(backend, file)?;
    apply_options(&mut session, options)?;

    let request = session
        .request_conversion()
        .ok_or(SessionError::NotLoaded)?;
    let result = request.run(backend);
    let failure = result.as_ref().err().map(|e| e.to_string());
    session.complete(request.seq, result);
    if let Some(reason) = failure {
        return Err(BatchError::Encode(reason));
    }

    let dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let output = session.save(&dir, options.overwrite)?;

    let original = session.original().cloned().ok_or(SessionError::NotLoaded)?;
    let converted = session.converted().cloned().ok_or(SessionError::NoOutput)?;
    Ok(ConversionReport {
        source: path.to_path_buf(),
        output,
        original,
        converted,
        savings_percent: session.savings_percent(),
    })
}

/// Convert every input in parallel.
///
/// Events are sent as files finish (in completion order); the summary lists
/// them in input order.
pub fn convert_batch(
    backend: &(impl ImageBackend + ?Sized),
    inputs: &[PathBuf],
    defaults: SessionDefaults,
    options: &BatchOptions,
    progress: Option<Sender<BatchEvent>>,
) -> BatchSummary {
    let events: Vec<BatchEvent> = inputs
        .par_iter()
        .enumerate()
        .map(|(i, path)| {
            let index = i + 1;
            let event = match convert_file(backend, path, defaults, options) {
                Ok(report) => BatchEvent::Converted { index, report },
                Err(BatchError::Upload(e @ UploadError::InvalidInputType(_))) => {
                    BatchEvent::Rejected {
                        index,
                        source: path.clone(),
                        reason: e.to_string(),
                    }
                }
                Err(e) => BatchEvent::Failed {
                    index,
                    source: path.clone(),
                    reason: e.to_string(),
                },
            };
            debug!(index, path = %path.display(), "batch item finished");
            if let Some(tx) = &progress {
                let _ = tx.send(event.clone());
            }
            event
        })
        .collect();

    let mut summary = BatchSummary::default();
    for event in &events {
        match event {
            BatchEvent::Converted { .. } => summary.converted += 1,
            BatchEvent::Rejected { .. } => summary.rejected += 1,
            BatchEvent::Failed { .. } => summary.failed += 1,
        }
    }
    summary.events = events;
    summary
}
