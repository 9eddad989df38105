//! Image processing: decode, draw at size, encode as WebP.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (PNG, JPEG, GIF) |
//! | **Draw at target size** | `resize_exact` with a configurable filter |
//! | **Encode → WebP** | `webp` crate (libwebp, lossy) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing an encode
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, DecodedImage, Dimensions, EncodedImage, ImageBackend};
pub use operations::{
    SweepPoint, convert, grows_with_quality, plan_encode, quality_sweep, sweep_qualities,
};
pub use params::{EncodeParams, Quality, ResizeFilter};
pub use rust_backend::RustBackend;
