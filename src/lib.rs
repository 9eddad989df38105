//! # webpify
//!
//! Resize raster images and re-encode them as lossy WebP. One image at a
//! time in an interactive shell, or many at once from the command line.
//!
//! # Architecture: Source In, Derived Output Out
//!
//! Everything revolves around a [`session::Session`], which holds one source
//! image and the inputs of a conversion:
//!
//! ```text
//! SourceFile ──upload──▶ Session ──request──▶ ConversionRequest ──backend──▶ EncodedImage
//!                          ▲  │                                                 │
//!                 width,   │  └────────────── complete(seq, result) ◀───────────┘
//!                 height,  │
//!                 quality, lock
//! ```
//!
//! The converted output is never edited directly. It is a function of
//! (source, width, height, quality): edits mark it stale, and the next
//! request recomputes it from scratch. Requests are numbered and only the
//! newest one's result is kept, so a slow encode that finishes late can
//! never overwrite the result of a newer edit.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`session`] | State machine (Idle / Loaded / Processing), derivation, last-request-wins |
//! | [`dimensions`] | Target width/height reconciliation under the aspect lock |
//! | [`upload`] | Input files and the type gate that runs before any decoding |
//! | [`mime`] | Declared MIME types and the accepted set |
//! | [`naming`] | `<stem>.webp` output names |
//! | [`handles`] | Display handles for image bytes, released when superseded |
//! | [`worker`] | Background encoder thread for interactive use |
//! | [`batch`] | Parallel conversion of many files, one session each |
//! | [`shell`] | Interactive line-oriented front-end |
//! | [`imaging`] | Decode, resize and WebP encode behind the `ImageBackend` trait |
//! | [`config`] | `webpify.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Lossy WebP Through libwebp
//!
//! The `image` crate decodes PNG, JPEG and GIF and does the resampling, but
//! its own WebP encoder is lossless only. Quality is the whole point of the
//! tool, so encoding goes through the `webp` crate (libwebp bindings). The
//! split sits behind [`imaging::ImageBackend`], which tests replace with a
//! mock that fabricates sizes.
//!
//! ## Type Gate Before Decode
//!
//! A file is accepted by its declared type, not by sniffing. A wrong type is
//! refused before a single byte is read, and the current image (if any)
//! stays as it was. Only the three advertised formats pass.
//!
//! ## Aspect Lock Keeps the Original Ratio
//!
//! The ratio is captured once at upload. Editing one edge under the lock
//! derives the other from that ratio, never from the current target, so
//! repeated edits do not drift. Unlocking and re-locking changes nothing
//! until the next edit.
//!
//! ## Handles Are Bounded
//!
//! Each original or converted image is exposed through a
//! [`handles::DisplayHandle`]. Starting a new conversion releases the
//! previous output's handle, and reset releases everything, so a long
//! editing session holds at most two.

pub mod batch;
pub mod config;
pub mod dimensions;
pub mod handles;
pub mod imaging;
pub mod mime;
pub mod naming;
pub mod output;
pub mod session;
pub mod shell;
pub mod upload;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
