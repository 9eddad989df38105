//! Target dimension reconciliation.
//!
//! [`TargetDimensions`] holds the requested output size together with the
//! aspect ratio captured from the original at upload time. With the lock
//! engaged, editing one edge recomputes the other from that fixed ratio;
//! unlocked, edges are independent. Toggling the lock never touches the
//! current size or the ratio.

use crate::imaging::Dimensions;
use crate::imaging::calculations::{
    aspect_ratio, clamp_dimension, height_for_width, width_for_height,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetDimensions {
    width: u32,
    height: u32,
    ratio: f64,
    locked: bool,
}

impl TargetDimensions {
    /// Seed from the original image: target equals source, ratio captured.
    pub fn seed(original: Dimensions, locked: bool) -> Self {
        Self {
            width: clamp_dimension(original.width),
            height: clamp_dimension(original.height),
            ratio: aspect_ratio(original.width, original.height),
            locked,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.ratio
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Set the width, recomputing height when locked.
    ///
    /// Returns `true` if either edge changed.
    pub fn set_width(&mut self, width: u32) -> bool {
        let before = (self.width, self.height);
        self.width = clamp_dimension(width);
        if self.locked {
            self.height = height_for_width(self.width, self.ratio);
        }
        before != (self.width, self.height)
    }

    /// Set the height, recomputing width when locked.
    ///
    /// Returns `true` if either edge changed.
    pub fn set_height(&mut self, height: u32) -> bool {
        let before = (self.width, self.height);
        self.height = clamp_dimension(height);
        if self.locked {
            self.width = width_for_height(self.height, self.ratio);
        }
        before != (self.width, self.height)
    }
}
