use super::CnnConfig;
use crate::model::SubModel1;
use anyhow::{ensure, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{
    batch_norm, conv::Conv2dConfig, conv2d, linear, BatchNorm, Conv2d, Linear, Module, VarBuilder,
};

const KERNEL_SIZE: usize = 5;
const STRIDE: usize = 2;
const CHANNELS: [usize; 3] = [16, 32, 32];

/// Spatial size after a convolution without padding.
fn conv_size_out(size: usize) -> usize {
    (size - KERNEL_SIZE) / STRIDE + 1
}

#[allow(clippy::upper_case_acronyms)]
/// Convolutional neural network mapping screen differences to action values.
///
/// Three 5x5 convolutions with stride 2, each followed by batch normalization
/// and ReLU, then a linear layer. Batch normalization uses batch statistics in
/// training mode and running statistics otherwise.
pub struct Cnn {
    device: Device,
    convs: Vec<(Conv2d, BatchNorm)>,
    head: Linear,
}

impl Cnn {
    /// Input size of the linear head.
    fn head_input_dim(config: &CnnConfig) -> Result<usize> {
        let (mut h, mut w) = (config.height, config.width);
        for _ in CHANNELS.iter() {
            ensure!(
                h >= KERNEL_SIZE && w >= KERNEL_SIZE,
                "Input of size {}x{} is too small for the network",
                config.height,
                config.width
            );
            h = conv_size_out(h);
            w = conv_size_out(w);
        }
        Ok(h * w * CHANNELS[CHANNELS.len() - 1])
    }
}

impl SubModel1 for Cnn {
    type Config = CnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let head_input_dim = Self::head_input_dim(&config)?;
        let cfg = Conv2dConfig {
            stride: STRIDE,
            ..Default::default()
        };

        let mut convs = Vec::with_capacity(CHANNELS.len());
        let mut in_channels = config.in_channels;
        for (i, &out_channels) in CHANNELS.iter().enumerate() {
            let conv = conv2d(
                in_channels,
                out_channels,
                KERNEL_SIZE,
                cfg,
                vb.pp(format!("conv{}", i + 1)),
            )?;
            let bn = batch_norm(out_channels, 1e-5, vb.pp(format!("bn{}", i + 1)))?;
            convs.push((conv, bn));
            in_channels = out_channels;
        }
        let head = linear(head_input_dim, config.out_dim as _, vb.pp("head"))?;

        Ok(Self {
            device: vb.device().clone(),
            convs,
            head,
        })
    }

    fn forward_t(&self, x: &Self::Input, train: bool) -> Result<Tensor> {
        let mut xs = x.to_device(&self.device)?.to_dtype(DType::F32)?;
        for (conv, bn) in self.convs.iter() {
            xs = conv.forward(&xs)?.apply_t(bn, train)?.relu()?;
        }
        Ok(self.head.forward(&xs.flatten_from(1)?)?)
    }
}
