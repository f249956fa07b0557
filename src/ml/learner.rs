// ============================================================
// Layer 5 — Learner
// ============================================================
// Owns everything one training run needs on the burn side and
// exposes it to the epoch driver through EpochRunner:
//
//   model          autodiff module, replaced after every step
//   optimizer      fresh at construction (never restored)
//   train_loader   AutodiffBackend batches, shuffled
//   test_loader    InnerBackend batches, fixed order
//   loss           one CrossEntropyLossConfig, built once per backend
//
// Reference: Burn Book §5 (Custom Training Loop)

use std::sync::Arc;

use anyhow::Result;
use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    nn::loss::{CrossEntropyLoss, CrossEntropyLossConfig},
    optim::Optimizer,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::ImageBatch;
use crate::domain::{metrics::EpochMetrics, traits::EpochRunner};
use crate::infra::checkpoint::encode_weights;
use crate::ml::model::ImageClassifier;
use crate::ml::steps::{evaluate_step, train_step, Progress};

/// Run-wide knobs that do not change between epochs.
#[derive(Debug, Clone, Copy)]
pub struct LearnerSettings {
    pub lr:         f64,
    pub num_epochs: usize,
    pub log_every:  usize,
}

pub struct Learner<B, M, O>
where
    B: AutodiffBackend,
{
    model:        M,
    optim:        O,
    train_loader: Arc<dyn DataLoader<ImageBatch<B>>>,
    test_loader:  Arc<dyn DataLoader<ImageBatch<B::InnerBackend>>>,
    train_loss:   CrossEntropyLoss<B>,
    test_loss:    CrossEntropyLoss<B::InnerBackend>,
    settings:     LearnerSettings,
}

impl<B, M, O> Learner<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    pub fn new(
        model:        M,
        optim:        O,
        train_loader: Arc<dyn DataLoader<ImageBatch<B>>>,
        test_loader:  Arc<dyn DataLoader<ImageBatch<B::InnerBackend>>>,
        settings:     LearnerSettings,
        device:       &B::Device,
    ) -> Self {
        let loss_cfg = CrossEntropyLossConfig::new();
        Self {
            model,
            optim,
            train_loader,
            test_loader,
            train_loss: loss_cfg.init(device),
            test_loss:  loss_cfg.init(device),
            settings,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    fn progress(&self, phase: &'static str, epoch: usize) -> Progress {
        Progress {
            phase,
            epoch,
            num_epochs: self.settings.num_epochs,
            log_every:  self.settings.log_every,
        }
    }
}

impl<B, M, O> EpochRunner for Learner<B, M, O>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    M::InnerModule: ImageClassifier<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    fn train_epoch(&mut self, epoch: usize) -> Result<EpochMetrics> {
        let progress = self.progress("Train", epoch);
        train_step(
            &mut self.model,
            self.train_loader.as_ref(),
            &self.train_loss,
            &mut self.optim,
            self.settings.lr,
            progress,
        )
    }

    fn evaluate(&self, epoch: usize) -> Result<EpochMetrics> {
        // valid() drops the autodiff graph and switches dropout off
        let model = self.model.valid();
        evaluate_step(&model, self.test_loader.as_ref(), &self.test_loss, self.progress("Test", epoch))
    }

    fn snapshot(&self) -> Result<Vec<u8>> {
        encode_weights(&self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::{Autodiff, NdArray},
        module::Module,
        optim::SgdConfig,
    };

    use crate::data::{
        batcher::{build_test_loader, build_train_loader},
        dataset::{ImageDataset, ImageSample},
    };
    use crate::infra::checkpoint::decode_weights;
    use crate::ml::model::{Cnn, CnnConfig};

    type TestBackend = Autodiff<NdArray>;

    fn samples() -> Vec<ImageSample> {
        (0..6)
            .map(|i| ImageSample::new(vec![(i % 2) as f32; 3 * 8 * 8], [3, 8, 8], i % 2))
            .collect()
    }

    fn learner() -> Learner<TestBackend, Cnn<TestBackend>, impl Optimizer<Cnn<TestBackend>, TestBackend>> {
        let device = Default::default();
        let model: Cnn<TestBackend> = CnnConfig::new(2).init(&device);
        let optim = SgdConfig::new().init::<TestBackend, Cnn<TestBackend>>();
        Learner::new(
            model,
            optim,
            build_train_loader::<TestBackend>(ImageDataset::new(samples()), 4, 1, 1, device.clone()),
            build_test_loader::<NdArray>(ImageDataset::new(samples()), 4, 1, device.clone()),
            LearnerSettings { lr: 0.05, num_epochs: 1, log_every: 1 },
            &device,
        )
    }

    #[test]
    fn test_evaluate_does_not_change_weights() {
        let learner = learner();
        let before  = learner.snapshot().unwrap();
        learner.evaluate(1).unwrap();
        assert_eq!(before, learner.snapshot().unwrap());
    }

    #[test]
    fn test_snapshot_restores_into_same_architecture() {
        let mut learner = learner();
        learner.train_epoch(1).unwrap();
        let bytes = learner.snapshot().unwrap();

        let device = Default::default();
        let fresh: Cnn<NdArray> = CnnConfig::new(2).init(&device);
        let restored = decode_weights(fresh, bytes, &device).unwrap();
        assert_eq!(restored.num_params(), learner.model().valid().num_params());
    }
}
