//! Looping color/depth image sequences decoded off the render thread.
//!
//! A source directory holds two sequences, `color/` and `depth/`, played back
//! side by side like two videos. Each stream keeps its own cursor and loops at
//! its own length, so sequences of unequal length drift apart until
//! [`FrameSource::sync`] realigns depth with color.

use anyhow::{bail, Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use depthcloud::{FramePair, FrameSource, SourceMetadata};
use image::{imageops::FilterType, RgbaImage};
use std::path::{Path, PathBuf};
use std::thread;
use walkdir::WalkDir;

/// Decoded frames buffered ahead of playback.
const PREFETCH: usize = 2;

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

struct DecodedFrame {
    generation: u64,
    index: usize,
    width: u32,
    height: u32,
    color: Vec<u8>,
    depth: Vec<u8>,
}

enum LoaderMsg {
    Frame(DecodedFrame),
    Failed(String),
}

enum Control {
    /// Restart both cursors at color frame `color_index`, depth aligned to it;
    /// later frames carry `generation`.
    Sync { generation: u64, color_index: usize },
}

/// Sorted image files directly under `dir`.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let frames: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();

    if frames.is_empty() {
        bail!("no frames found in '{}'", dir.display());
    }
    Ok(frames)
}

pub struct ImageSequenceSource {
    frames: Receiver<LoaderMsg>,
    ready: Receiver<SourceMetadata>,
    control: Sender<Control>,
    metadata: Option<SourceMetadata>,
    frame_interval: f32,
    clock: f32,
    generation: u64,
    current: Option<DecodedFrame>,
    failed: bool,
}

impl ImageSequenceSource {
    /// Lists both sequences under `root` and starts decoding in the
    /// background. Metadata arrives later through [`FrameSource::poll_ready`].
    pub fn open(root: &Path, fps: f32) -> Result<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            bail!("frame rate must be positive, got {}", fps);
        }

        let color = list_frames(&root.join("color"))
            .with_context(|| format!("reading color sequence of '{}'", root.display()))?;
        let depth = list_frames(&root.join("depth"))
            .with_context(|| format!("reading depth sequence of '{}'", root.display()))?;

        log::info!(
            "Opening '{}': {} color frames, {} depth frames at {} fps",
            root.display(),
            color.len(),
            depth.len(),
            fps
        );
        if color.len() != depth.len() {
            log::warn!(
                "Color and depth sequences differ in length ({} vs {}); they will drift",
                color.len(),
                depth.len()
            );
        }

        let (frame_tx, frames) = bounded(PREFETCH);
        let (ready_tx, ready) = bounded(1);
        let (control, control_rx) = unbounded();

        thread::Builder::new()
            .name("frame-loader".into())
            .spawn(move || run_loader(color, depth, ready_tx, frame_tx, control_rx))
            .context("spawning frame loader thread")?;

        Ok(Self {
            frames,
            ready,
            control,
            metadata: None,
            frame_interval: 1.0 / fps,
            clock: 0.0,
            generation: 0,
            current: None,
            failed: false,
        })
    }

    /// Index of the color frame currently shown.
    fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|f| f.index)
    }

    /// Pulls the next frame of the current generation, discarding stale ones.
    fn next_fresh(&mut self) -> Option<DecodedFrame> {
        loop {
            match self.frames.try_recv() {
                Ok(LoaderMsg::Frame(frame)) if frame.generation != self.generation => continue,
                Ok(LoaderMsg::Frame(frame)) => return Some(frame),
                Ok(LoaderMsg::Failed(reason)) => {
                    log::error!("Frame loader stopped: {}", reason);
                    self.failed = true;
                    return None;
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    if !self.failed {
                        log::error!("Frame loader exited unexpectedly");
                        self.failed = true;
                    }
                    return None;
                }
            }
        }
    }
}

impl FrameSource for ImageSequenceSource {
    fn poll_ready(&mut self) -> Option<SourceMetadata> {
        if self.metadata.is_some() {
            return None;
        }
        let metadata = self.ready.try_recv().ok()?;
        self.metadata = Some(metadata);
        Some(metadata)
    }

    fn metadata(&self) -> Option<SourceMetadata> {
        self.metadata
    }

    fn advance(&mut self, dt: f32) -> Option<FramePair<'_>> {
        if self.metadata.is_none() || self.failed {
            return None;
        }

        self.clock += dt;
        if self.current.is_some() && self.clock < self.frame_interval {
            return None;
        }

        let frame = self.next_fresh()?;
        // Drop whole missed intervals rather than replaying them.
        self.clock = if self.current.is_some() {
            (self.clock - self.frame_interval) % self.frame_interval
        } else {
            0.0
        };
        self.current = Some(frame);

        self.current.as_ref().map(|f| FramePair {
            index: f.index,
            width: f.width,
            height: f.height,
            color: &f.color,
            depth: &f.depth,
        })
    }

    fn sync(&mut self) {
        // Continue from the frame after the one on screen, not from wherever
        // the prefetching loader has got to.
        let color_index = self.current_index().map_or(0, |shown| shown + 1);
        self.generation += 1;
        if self
            .control
            .send(Control::Sync {
                generation: self.generation,
                color_index,
            })
            .is_err()
        {
            log::warn!("Frame loader is gone; nothing to resynchronise");
            return;
        }
        // Show the first aligned frame as soon as it arrives.
        self.clock = self.frame_interval;
        log::info!("Resynchronising depth playback to color");
    }
}

fn run_loader(
    color: Vec<PathBuf>,
    depth: Vec<PathBuf>,
    ready: Sender<SourceMetadata>,
    frames: Sender<LoaderMsg>,
    control: Receiver<Control>,
) {
    // `open` guarantees both lists are non-empty.
    let (width, height) = match image::image_dimensions(&color[0]) {
        Ok(dims) => dims,
        Err(e) => {
            let _ = frames.send(LoaderMsg::Failed(format!(
                "reading '{}': {}",
                color[0].display(),
                e
            )));
            return;
        }
    };

    let metadata = SourceMetadata {
        width,
        height,
        frame_count: color.len(),
    };
    if ready.send(metadata).is_err() {
        return;
    }

    let mut generation = 0;
    let mut color_index = 0;
    let mut depth_index = 0;

    loop {
        while let Ok(cmd) = control.try_recv() {
            match cmd {
                Control::Sync {
                    generation: next,
                    color_index: resume,
                } => {
                    generation = next;
                    color_index = resume % color.len();
                    depth_index = color_index % depth.len();
                }
            }
        }

        let msg = match decode_pair(&color[color_index], &depth[depth_index], width, height) {
            Ok((color_rgba, depth_rgba)) => LoaderMsg::Frame(DecodedFrame {
                generation,
                index: color_index,
                width,
                height,
                color: color_rgba.into_raw(),
                depth: depth_rgba.into_raw(),
            }),
            Err(e) => LoaderMsg::Failed(format!("{:#}", e)),
        };
        let failed = matches!(msg, LoaderMsg::Failed(_));

        // Blocks while the prefetch queue is full; errors once the source is dropped.
        if frames.send(msg).is_err() || failed {
            log::debug!("Frame loader exiting");
            return;
        }

        color_index = (color_index + 1) % color.len();
        depth_index = (depth_index + 1) % depth.len();
    }
}

/// Decodes one color and one depth image in parallel, both at `width`x`height`.
fn decode_pair(
    color: &Path,
    depth: &Path,
    width: u32,
    height: u32,
) -> Result<(RgbaImage, RgbaImage)> {
    let (color, depth) = rayon::join(
        || load_rgba(color, width, height, FilterType::Triangle),
        || load_rgba(depth, width, height, FilterType::Nearest),
    );
    Ok((color?, depth?))
}

fn load_rgba(path: &Path, width: u32, height: u32, filter: FilterType) -> Result<RgbaImage> {
    let img = image::open(path)
        .with_context(|| format!("decoding '{}'", path.display()))?
        .to_rgba8();

    if img.dimensions() == (width, height) {
        Ok(img)
    } else {
        log::trace!(
            "Resizing '{}' from {:?} to {}x{}",
            path.display(),
            img.dimensions(),
            width,
            height
        );
        Ok(image::imageops::resize(&img, width, height, filter))
    }
}
