//! Frame source capability: a paired color/depth stream whose dimensions are
//! only known once it signals that its metadata is ready.

/// Dimensions reported by the metadata-ready signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMetadata {
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
}

/// One decoded color frame and its matching depth frame, both RGBA8.
#[derive(Debug, Clone, Copy)]
pub struct FramePair<'a> {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub color: &'a [u8],
    pub depth: &'a [u8],
}

pub trait FrameSource {
    /// Non-blocking. Yields the metadata exactly once, the first time it is
    /// polled after the source became ready; `None` before and after.
    fn poll_ready(&mut self) -> Option<SourceMetadata>;

    /// Metadata, once known.
    fn metadata(&self) -> Option<SourceMetadata>;

    /// Advances playback by `dt` seconds and returns the frame pair to show,
    /// if a new one is due.
    fn advance(&mut self, dt: f32) -> Option<FramePair<'_>>;

    /// Re-aligns the depth stream with the color stream's playback position.
    fn sync(&mut self);
}
