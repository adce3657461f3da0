//! CNN classifier architecture.
//!
//! A compact convolutional network sized for 32x32 RGB inputs. The model
//! factory owns the architecture choice only; weights are randomly
//! initialized per construction and the output class count is configurable.
//!
//! There is no train/eval mode flag on the model: gradient passes run the
//! module on an autodiff backend, while validation, evaluation, and serving
//! run the inner module (via `valid()` or direct construction), where dropout
//! is inert. Which pass is happening is always visible in the caller's types.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for the image classifier.
#[derive(Config, Debug)]
pub struct ImageClassifierConfig {
    /// Number of output classes
    #[config(default = "10")]
    pub num_classes: usize,

    /// Input image size (square)
    #[config(default = "32")]
    pub input_size: usize,

    /// Number of input channels (3 for RGB)
    #[config(default = "3")]
    pub in_channels: usize,

    /// Base number of convolutional filters
    #[config(default = "32")]
    pub base_filters: usize,

    /// Dropout rate in the classifier head
    #[config(default = "0.25")]
    pub dropout_rate: f64,
}

/// A CNN block with Conv2d, BatchNorm, ReLU, and optional MaxPool.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    relu: Relu,
    pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        with_pool: bool,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);

        let pool = if with_pool {
            Some(MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init())
        } else {
            None
        };

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);

        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// Image classifier CNN.
///
/// Architecture:
/// - 3 convolutional blocks with doubling filter counts, each halving the
///   spatial resolution (32 -> 16 -> 8 -> 4)
/// - global average pooling
/// - one hidden linear layer with dropout, then the classifier head
#[derive(Module, Debug)]
pub struct ImageClassifier<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    conv3: ConvBlock<B>,

    global_pool: AdaptiveAvgPool2d,

    fc1: Linear<B>,
    dropout: Dropout,
    fc2: Linear<B>,

    num_classes: usize,
}

impl<B: Backend> ImageClassifier<B> {
    /// Create a new classifier from configuration with freshly initialized
    /// weights.
    pub fn new(config: &ImageClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        let conv1 = ConvBlock::new(config.in_channels, base, 3, true, device);
        let conv2 = ConvBlock::new(base, base * 2, 3, true, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, 3, true, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let fc1 = LinearConfig::new(base * 4, base * 4).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let fc2 = LinearConfig::new(base * 4, config.num_classes).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            global_pool,
            fc1,
            dropout,
            fc2,
            num_classes: config.num_classes,
        }
    }

    /// Forward pass.
    ///
    /// # Arguments
    /// * `x` - Input tensor of shape [batch_size, channels, height, width]
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, num_classes]
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass with softmax-normalized outputs.
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Check that a stored record is compatible with `config` before it is
    /// installed. The recorder itself does not compare stored shapes against
    /// the target module, so without this check a checkpoint written for a
    /// different class count would load silently and fail much later.
    pub fn validate_record(
        config: &ImageClassifierConfig,
        record: &ImageClassifierRecord<B>,
    ) -> crate::error::Result<()> {
        let [fc2_in, fc2_out] = record.fc2.weight.val().dims();

        if fc2_out != config.num_classes {
            return Err(crate::error::Error::CheckpointMismatch(format!(
                "model expects {} classes, checkpoint holds {}",
                config.num_classes, fc2_out
            )));
        }

        let hidden = config.base_filters * 4;
        if fc2_in != hidden {
            return Err(crate::error::Error::CheckpointMismatch(format!(
                "model expects a hidden width of {}, checkpoint holds {}",
                hidden, fc2_in
            )));
        }

        Ok(())
    }
}
