use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    prelude::*,
};

/// Anything that maps an image batch `[batch, channels, height, width]`
/// to per-class scores `[batch, classes]`. Trainable classifiers are
/// also burn modules; that bound sits on the training code.
pub trait ImageClassifier<B: Backend> {
    fn classify(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct CnnConfig {
    pub num_classes: usize,
    #[config(default = 3)]
    pub channels: usize,
    #[config(default = 16)]
    pub filters: usize,
    #[config(default = 64)]
    pub hidden: usize,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl CnnConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Cnn<B> {
        let conv1 = Conv2dConfig::new([self.channels, self.filters], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        let conv2 = Conv2dConfig::new([self.filters, self.filters * 2], [3, 3])
            .with_padding(PaddingConfig2d::Same)
            .init(device);
        Cnn {
            conv1,
            conv2,
            pool:        MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1:         LinearConfig::new(self.filters * 2, self.hidden).init(device),
            fc2:         LinearConfig::new(self.hidden, self.num_classes).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
            activation:  Relu::new(),
        }
    }
}

/// Two conv blocks, global average pooling, and a two-layer head.
/// Global pooling makes the head independent of the input resolution.
#[derive(Module, Debug)]
pub struct Cnn<B: Backend> {
    pub conv1:       Conv2d<B>,
    pub conv2:       Conv2d<B>,
    pub pool:        MaxPool2d,
    pub global_pool: AdaptiveAvgPool2d,
    pub fc1:         Linear<B>,
    pub fc2:         Linear<B>,
    pub dropout:     Dropout,
    pub activation:  Relu,
}

impl<B: Backend> Cnn<B> {
    /// images: [batch, channels, h, w] → scores: [batch, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        let x = self.activation.forward(self.conv1.forward(images));
        let x = self.pool.forward(x);
        let x = self.activation.forward(self.conv2.forward(x));
        let x = self.global_pool.forward(x); // [batch, filters*2, 1, 1]

        let [_, features, _, _] = x.dims();
        let x = x.reshape([batch_size, features]);

        let x = self.dropout.forward(self.activation.forward(self.fc1.forward(x)));
        self.fc2.forward(x)
    }
}

impl<B: Backend> ImageClassifier<B> for Cnn<B> {
    fn classify(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        self.forward(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_output_shape_follows_class_count() {
        let device = Default::default();
        let model: Cnn<NdArray> = CnnConfig::new(5).init(&device);
        let images = Tensor::<NdArray, 4>::zeros([2, 3, 8, 8], &device);
        assert_eq!(model.classify(images).dims(), [2, 5]);
    }

    #[test]
    fn test_parameter_count_depends_on_classes() {
        let device = Default::default();
        let two: Cnn<NdArray>   = CnnConfig::new(2).init(&device);
        let three: Cnn<NdArray> = CnnConfig::new(3).init(&device);
        // fc2 gains one row of `hidden` weights plus one bias
        assert_eq!(three.num_params() - two.num_params(), 64 + 1);
    }
}
