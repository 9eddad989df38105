//! Conversion session: source holder, derived output, and their wiring.
//!
//! A [`Session`] is the whole application state for one image:
//!
//! ```text
//!            upload (accepted + decoded)
//!   Idle ─────────────────────────────────▶ Loaded { processing }
//!    ▲                                          │
//!    └──────────────── reset ───────────────────┘
//! ```
//!
//! ## Derived output
//!
//! The converted output is a function of (source, target width, target
//! height, quality). Edits that change any of those mark the output
//! *stale*; nothing is encoded until someone asks:
//!
//! - [`Session::refresh`] encodes synchronously on the calling thread.
//! - [`Session::request_conversion`] hands back a [`ConversionRequest`] to
//!   run elsewhere (see [`worker`](crate::worker)), and
//!   [`Session::complete`] applies its result later.
//!
//! ## Last request wins
//!
//! Every request carries a sequence number from a counter that never goes
//! backwards, not even across resets. A completion is applied only if its
//! number is the latest one issued; anything older is dropped. Processing
//! therefore turns on at the first request after an edit and off exactly
//! once, when the newest request completes.
//!
//! ## Display handles
//!
//! The original's handle is issued once per upload. Starting a new request
//! releases the current converted handle before the encode runs, so at most
//! one converted handle is ever live. Reset releases everything.

use crate::dimensions::TargetDimensions;
use crate::handles::{DisplayHandle, HandleStore};
use crate::imaging::calculations::savings_percent;
use crate::imaging::{
    BackendError, DecodedImage, Dimensions, EncodeParams, EncodedImage, ImageBackend, Quality,
    ResizeFilter, convert, plan_encode,
};
use crate::upload::{SourceFile, UploadError};
use crate::{mime, naming};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No image loaded")]
    NotLoaded,
    #[error("No converted output available")]
    NoOutput,
    #[error("Refusing to overwrite {0}")]
    WouldOverwrite(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata for one image slot (original or converted).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ImageDetails {
    pub handle: DisplayHandle,
    pub size: u64,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub mime: String,
}

impl ImageDetails {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

/// Values a session starts with and returns to on reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionDefaults {
    pub quality: Quality,
    pub lock_aspect_ratio: bool,
    pub filter: ResizeFilter,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            lock_aspect_ratio: true,
            filter: ResizeFilter::default(),
        }
    }
}

/// Coarse application state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loaded { processing: bool },
}

/// Work order for one encode, runnable off the session's thread.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub seq: u64,
    pub source: DecodedImage,
    pub params: EncodeParams,
}

impl ConversionRequest {
    pub fn run(&self, backend: &(impl ImageBackend + ?Sized)) -> Result<EncodedImage, BackendError> {
        convert(backend, &self.source, &self.params)
    }
}

/// What [`Session::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Newest request succeeded; the converted slot is filled.
    Applied,
    /// Newest request failed; the converted slot stays empty.
    Failed,
    /// A newer request was issued (or the session was reset); result dropped.
    Superseded,
}

struct LoadedSource {
    decoded: DecodedImage,
    details: ImageDetails,
}

pub struct Session {
    defaults: SessionDefaults,
    handles: HandleStore,
    source: Option<LoadedSource>,
    converted: Option<ImageDetails>,
    target: Option<TargetDimensions>,
    quality: Quality,
    locked: bool,
    stale: bool,
    next_seq: u64,
    pending: Option<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionDefaults::default())
    }
}

impl Session {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            defaults,
            handles: HandleStore::new(),
            source: None,
            converted: None,
            target: None,
            quality: defaults.quality,
            locked: defaults.lock_aspect_ratio,
            stale: false,
            next_seq: 0,
            pending: None,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn phase(&self) -> Phase {
        match self.source {
            None => Phase::Idle,
            Some(_) => Phase::Loaded {
                processing: self.pending.is_some(),
            },
        }
    }

    pub fn is_processing(&self) -> bool {
        self.pending.is_some()
    }

    /// An input changed since the last request was issued.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn original(&self) -> Option<&ImageDetails> {
        self.source.as_ref().map(|s| &s.details)
    }

    pub fn converted(&self) -> Option<&ImageDetails> {
        self.converted.as_ref()
    }

    pub fn target(&self) -> Option<Dimensions> {
        self.target.map(|t| t.dimensions())
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        self.target.map(|t| t.aspect_ratio())
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn live_handles(&self) -> usize {
        self.handles.live_count()
    }

    pub fn resolve(&self, handle: DisplayHandle) -> Option<Arc<[u8]>> {
        self.handles.resolve(handle)
    }

    /// Savings of the converted output over the original, once settled.
    pub fn savings_percent(&self) -> Option<u32> {
        if self.is_processing() {
            return None;
        }
        let original = self.original()?;
        let converted = self.converted.as_ref()?;
        savings_percent(original.size, converted.size)
    }

    /// The artifact to save: present only when an output exists and no
    /// newer encode is outstanding.
    pub fn downloadable(&self) -> Option<(&ImageDetails, Arc<[u8]>)> {
        if self.is_processing() {
            return None;
        }
        let details = self.converted.as_ref()?;
        let bytes = self.handles.resolve(details.handle)?;
        Some((details, bytes))
    }

    // =========================================================================
    // Upload and reset
    // =========================================================================

    /// Accept, decode and install a new source image.
    ///
    /// A rejected type leaves the session untouched. Otherwise any current
    /// image is discarded first, so a decode failure leaves the session Idle.
    /// Quality and lock carry over from before the upload.
    /// On success the target is seeded from the source and the output is
    /// marked stale for the initial conversion.
    pub fn upload(
        &mut self,
        backend: &(impl ImageBackend + ?Sized),
        file: SourceFile,
    ) -> Result<&ImageDetails, UploadError> {
        file.check_type()?;
        self.clear_image();

        let decoded = backend.decode(&file.bytes).map_err(|source| {
            warn!(name = %file.name, error = %source, "decode failed, session stays idle");
            UploadError::Decode {
                name: file.name.clone(),
                source,
            }
        })?;

        let dims = decoded.dimensions();
        let handle = self.handles.issue(Arc::clone(&file.bytes));
        let details = ImageDetails {
            handle,
            size: file.size(),
            name: file.name,
            width: dims.width,
            height: dims.height,
            mime: file.mime,
        };
        debug!(name = %details.name, %dims, size = details.size, "source loaded");

        self.target = Some(TargetDimensions::seed(dims, self.locked));
        self.stale = true;
        let source = self.source.insert(LoadedSource { decoded, details });
        Ok(&source.details)
    }

    /// Return to Idle: drop the image, restore default quality and lock, and
    /// orphan any in-flight request.
    pub fn reset(&mut self) {
        self.clear_image();
        self.quality = self.defaults.quality;
        self.locked = self.defaults.lock_aspect_ratio;
    }

    /// Drop the source, output and target and release every handle.
    /// Quality and lock are user settings and survive.
    fn clear_image(&mut self) {
        let released = self.handles.release_all();
        if released > 0 || self.source.is_some() {
            debug!(released, "image cleared");
        }
        self.source = None;
        self.converted = None;
        self.target = None;
        self.stale = false;
        self.pending = None;
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    pub fn set_width(&mut self, width: u32) -> Result<(), SessionError> {
        let target = self.target.as_mut().ok_or(SessionError::NotLoaded)?;
        if target.set_width(width) {
            self.stale = true;
        }
        Ok(())
    }

    pub fn set_height(&mut self, height: u32) -> Result<(), SessionError> {
        let target = self.target.as_mut().ok_or(SessionError::NotLoaded)?;
        if target.set_height(height) {
            self.stale = true;
        }
        Ok(())
    }

    /// Set quality (clamped to 1–100). Marks the output stale if loaded and changed.
    pub fn set_quality(&mut self, quality: u32) {
        let quality = Quality::new(quality);
        if quality != self.quality {
            self.quality = quality;
            if self.source.is_some() {
                self.stale = true;
            }
        }
    }

    /// Engage or release the aspect lock. Never changes dimensions or the ratio.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
        if let Some(target) = self.target.as_mut() {
            target.set_locked(locked);
        }
    }

    pub fn toggle_lock(&mut self) -> bool {
        self.set_locked(!self.locked);
        self.locked
    }

    // =========================================================================
    // Derivation
    // =========================================================================

    /// Issue a request for the current inputs.
    ///
    /// Releases the current converted output, marks the session processing
    /// and clears the stale flag. Returns `None` when Idle.
    pub fn request_conversion(&mut self) -> Option<ConversionRequest> {
        let source = self.source.as_ref()?;
        let target = self.target?;

        if let Some(previous) = self.converted.take() {
            self.handles.release(previous.handle);
        }

        self.next_seq += 1;
        self.pending = Some(self.next_seq);
        self.stale = false;

        let params = plan_encode(target.dimensions(), self.quality, self.defaults.filter);
        debug!(seq = self.next_seq, width = params.width, height = params.height, quality = %params.quality, "conversion requested");
        Some(ConversionRequest {
            seq: self.next_seq,
            source: source.decoded.clone(),
            params,
        })
    }

    /// Apply the result of request `seq`, unless a newer one has been issued.
    pub fn complete(
        &mut self,
        seq: u64,
        result: Result<EncodedImage, BackendError>,
    ) -> CompletionOutcome {
        if self.pending != Some(seq) {
            debug!(seq, latest = ?self.pending, "dropping superseded conversion");
            return CompletionOutcome::Superseded;
        }
        self.pending = None;

        let Some(source) = self.source.as_ref() else {
            return CompletionOutcome::Superseded;
        };

        match result {
            Ok(encoded) => {
                let size = encoded.size();
                let Dimensions { width, height } = encoded.dimensions;
                let handle = self.handles.issue(Arc::from(encoded.bytes));
                let details = ImageDetails {
                    handle,
                    size,
                    name: naming::output_name(&source.details.name),
                    width,
                    height,
                    mime: mime::OUTPUT_MIME.to_string(),
                };
                info!(name = %details.name, width, height, size, "conversion complete");
                self.converted = Some(details);
                CompletionOutcome::Applied
            }
            Err(error) => {
                warn!(seq, %error, "conversion failed, no output");
                CompletionOutcome::Failed
            }
        }
    }

    /// Encode on the calling thread if the output is stale.
    ///
    /// Returns `None` when there was nothing to do.
    pub fn refresh(&mut self, backend: &(impl ImageBackend + ?Sized)) -> Option<CompletionOutcome> {
        if !self.stale {
            return None;
        }
        let request = self.request_conversion()?;
        let result = request.run(backend);
        Some(self.complete(request.seq, result))
    }

    /// Write the converted artifact as `<dir>/<stem>.webp`.
    pub fn save(&self, dir: &Path, overwrite: bool) -> Result<PathBuf, SessionError> {
        if self.source.is_none() {
            return Err(SessionError::NotLoaded);
        }
        let (details, bytes) = self.downloadable().ok_or(SessionError::NoOutput)?;
        let path = dir.join(&details.name);
        std::fs::create_dir_all(dir)?;
        // Without overwrite, the existence check and the create are one step.
        let mut file = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(overwrite)
            .create_new(!overwrite)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SessionError::WouldOverwrite(path));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&bytes)?;
        info!(path = %path.display(), size = details.size, "saved");
        Ok(path)
    }
}
