//! Screen preprocessing.
use anyhow::{ensure, Context, Result};
use candle_core::{Device, Tensor};
use image::{imageops::FilterType, RgbImage};
use log::trace;
use per_core::FramePreprocessor;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// A rendered RGB frame, row-major with interleaved channels.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbFrame {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// `height * width * 3` bytes.
    pub pixels: Vec<u8>,
}

impl RgbFrame {
    /// Constructs a frame, checking the size and the number of bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "Empty {}x{} frame", width, height);
        let n_bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .with_context(|| format!("A {}x{} RGB frame does not fit in memory", width, height))?;
        ensure!(
            pixels.len() == n_bytes,
            "{} bytes for a {}x{} RGB frame",
            pixels.len(),
            width,
            height
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Configuration of [`ScreenPreprocessor`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ScreenPreprocessorConfig {
    /// Length of the shorter edge after resizing.
    pub resize: u32,
}

impl Default for ScreenPreprocessorConfig {
    fn default() -> Self {
        Self { resize: 100 }
    }
}

impl ScreenPreprocessorConfig {
    /// Sets the length of the shorter edge after resizing.
    pub fn resize(mut self, v: u32) -> Self {
        self.resize = v;
        self
    }
}

/// Turns [`RgbFrame`]s into tensors of shape `[1, 3, height, width]` with
/// values in `[0, 1]`.
///
/// Frames are resized with a Catmull-Rom filter so that the shorter edge is
/// `resize` pixels long, keeping the aspect ratio.
pub struct ScreenPreprocessor {
    resize: u32,
}

impl ScreenPreprocessor {
    /// Size of a `width` x `height` frame after resizing.
    pub fn output_size(&self, width: u32, height: u32) -> Result<(u32, u32)> {
        ensure!(width > 0 && height > 0, "Empty {}x{} frame", width, height);
        let scale = |long: u32, short: u32| {
            let len = long as u64 * self.resize as u64 / short as u64;
            u32::try_from(len).with_context(|| format!("Resized edge of {} pixels", len))
        };
        if width <= height {
            Ok((self.resize, scale(height, width)?))
        } else {
            Ok((scale(width, height)?, self.resize))
        }
    }
}

impl FramePreprocessor<RgbFrame> for ScreenPreprocessor {
    type Config = ScreenPreprocessorConfig;
    type State = Tensor;

    fn build(config: &Self::Config) -> Result<Self> {
        ensure!(config.resize > 0, "Frames cannot be resized to zero pixels");
        Ok(Self {
            resize: config.resize,
        })
    }

    fn preprocess(&self, frame: &RgbFrame) -> Result<Tensor> {
        let img = RgbImage::from_raw(frame.width, frame.height, frame.pixels.clone())
            .context("Frame does not hold width * height RGB pixels")?;
        let (w, h) = self.output_size(frame.width, frame.height)?;
        trace!("Resize {}x{} to {}x{}", frame.width, frame.height, w, h);
        let img = image::imageops::resize(&img, w, h, FilterType::CatmullRom);

        let data = img
            .into_raw()
            .into_iter()
            .map(|p| p as f32 / 255.0)
            .collect::<Vec<_>>();
        let t = Tensor::from_vec(data, (h as usize, w as usize, 3), &Device::Cpu)?
            .permute((2, 0, 1))?
            .contiguous()?
            .unsqueeze(0)?;
        Ok(t)
    }

    fn difference(&self, current: &Tensor, last: &Tensor) -> Result<Tensor> {
        Ok((current - last)?)
    }
}
