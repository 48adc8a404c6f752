//! The display region a map is rendered into and captured from.

use crate::map::MapOptions;
use crate::types::{Coordinate, RasterImage};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

/// Largest accepted side of a region, in logical pixels.
pub const MAX_REGION_SIDE: u32 = 4096;

/// Where a frame's pixels came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOrigin {
    /// Produced in-process.
    Local,
    /// Fetched from another host; capturing it needs cross-origin permission.
    CrossOrigin {
        /// Host that served the pixels.
        host: String,
    },
}

/// What a region currently shows.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    /// Encoded map pixels.
    pub image: RasterImage,
    /// Center of the view.
    pub center: Coordinate,
    /// Options the view was rendered with.
    pub options: MapOptions,
    /// Provenance of the pixels.
    pub origin: FrameOrigin,
    /// When the frame was presented.
    pub rendered_at: SystemTime,
}

#[derive(Debug)]
struct RegionState {
    width: u32,
    height: u32,
    scale: u32,
    mounted: bool,
    frame: Option<RenderedFrame>,
    sequence: u64,
}

/// A fixed-size display region shared by the renderer and the capturer.
///
/// Cloning yields another handle to the same region.
#[derive(Debug, Clone)]
pub struct MapRegion {
    inner: Arc<RwLock<RegionState>>,
}

impl MapRegion {
    /// Creates a mounted region of `width`x`height` logical pixels at scale 1.
    ///
    /// Each side is clamped to `1..=MAX_REGION_SIDE`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegionState {
                width: width.clamp(1, MAX_REGION_SIDE),
                height: height.clamp(1, MAX_REGION_SIDE),
                scale: 1,
                mounted: true,
                frame: None,
                sequence: 0,
            })),
        }
    }

    /// Sets the device pixel ratio (1 or 2).
    pub fn with_scale(self, scale: u32) -> Self {
        self.write().scale = scale.clamp(1, 2);
        self
    }

    /// Creates a region that is not yet attached to the display.
    pub fn unmounted(width: u32, height: u32) -> Self {
        let region = Self::new(width, height);
        region.write().mounted = false;
        region
    }

    fn read(&self) -> RwLockReadGuard<'_, RegionState> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegionState> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Attaches the region to the display.
    pub fn mount(&self) {
        self.write().mounted = true;
    }

    /// Detaches the region; its frame is dropped.
    pub fn unmount(&self) {
        let mut state = self.write();
        state.mounted = false;
        state.frame = None;
    }

    /// Returns true if the region is attached.
    pub fn is_mounted(&self) -> bool {
        self.read().mounted
    }

    /// Logical size in CSS-like pixels.
    pub fn size(&self) -> (u32, u32) {
        let state = self.read();
        (state.width, state.height)
    }

    /// Device pixel ratio.
    pub fn scale(&self) -> u32 {
        self.read().scale
    }

    /// Physical size in device pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let state = self.read();
        (
            state.width.saturating_mul(state.scale),
            state.height.saturating_mul(state.scale),
        )
    }

    /// Returns a copy of the frame currently shown, if any.
    pub fn frame(&self) -> Option<RenderedFrame> {
        self.read().frame.clone()
    }

    /// Returns true once any frame has been presented.
    pub fn has_frame(&self) -> bool {
        self.read().frame.is_some()
    }

    /// Sequence number of the current frame (0 before the first one).
    pub fn sequence(&self) -> u64 {
        self.read().sequence
    }

    /// Replaces the shown frame and returns its sequence number.
    ///
    /// Returns `None` if the region was unmounted in the meantime.
    pub fn present(&self, frame: RenderedFrame) -> Option<u64> {
        let mut state = self.write();
        if !state.mounted {
            return None;
        }
        state.sequence += 1;
        state.frame = Some(frame);
        tracing::debug!(sequence = state.sequence, "map frame replaced");
        Some(state.sequence)
    }
}
