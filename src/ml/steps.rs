// ============================================================
// Layer 5 — Train Step / Evaluate Step
// ============================================================
// One pass over a data loader each.
//
//   train_step     autodiff model, forward → loss → backward →
//                  optimizer step; prediction = argmax(softmax)
//   evaluate_step  inner model from model.valid() (no graph,
//                  dropout off); prediction = argmax(scores)
//
// Both reduce every batch to (loss, correct, batch_len) and let
// MetricAccumulator do the averaging.
//
// Burn builds a fresh gradient set on every backward() call, so
// there is no explicit "zero the gradients" step.
//
// Reference: Burn Book §5 (Custom Training Loop)

use anyhow::Result;
use burn::{
    data::dataloader::DataLoader,
    module::AutodiffModule,
    nn::loss::CrossEntropyLoss,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::{activation::softmax, backend::AutodiffBackend, ElementConversion},
};

use crate::data::batcher::ImageBatch;
use crate::domain::metrics::{EpochMetrics, MetricAccumulator};
use crate::ml::model::ImageClassifier;

/// Where a pass stands, for progress lines only.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub phase:      &'static str,
    pub epoch:      usize,
    pub num_epochs: usize,
    /// Log a running line every `log_every` batches (0 = never)
    pub log_every:  usize,
}

impl Progress {
    fn report(&self, acc: &MetricAccumulator) {
        let batch = acc.batches();
        tracing::debug!(
            "[{} Epoch = {}/{}] batch {} loss={:.4} acc={:.4}",
            self.phase, self.epoch, self.num_epochs, batch,
            acc.running_loss(), acc.running_accuracy(),
        );
        if self.log_every > 0 && batch % self.log_every == 0 {
            tracing::info!(
                "[{} Epoch = {}/{}] batch {:>4} | {}_Loss={:.4} | {}_Acc={:.4}",
                self.phase, self.epoch, self.num_epochs, batch,
                self.phase, acc.running_loss(),
                self.phase, acc.running_accuracy(),
            );
        }
    }
}

/// Full pass over `loader` with one optimizer step per batch.
/// `model` is replaced in place by the updated module.
pub fn train_step<B, M, O>(
    model:    &mut M,
    loader:   &dyn DataLoader<ImageBatch<B>>,
    loss_fn:  &CrossEntropyLoss<B>,
    optim:    &mut O,
    lr:       f64,
    progress: Progress,
) -> Result<EpochMetrics>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + ImageClassifier<B>,
    O: Optimizer<M, B>,
{
    let mut acc = MetricAccumulator::new();

    for batch in loader.iter() {
        let batch_len = batch.labels.dims()[0];

        let scores = model.classify(batch.images);
        let loss   = loss_fn.forward(scores.clone(), batch.labels.clone());
        let loss_value: f64 = loss.clone().into_scalar().elem::<f64>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &*model);
        *model = optim.step(lr, model.clone(), grads);

        let predicted = softmax(scores, 1).argmax(1).reshape([batch_len]);
        let correct   = count_correct(predicted, batch.labels);

        acc.update(loss_value, correct, batch_len);
        progress.report(&acc);
    }

    acc.finish()
}

/// Full pass over `loader` without gradients. Takes the inner model
/// returned by `AutodiffModule::valid()`, so nothing here can touch
/// the trained parameters.
pub fn evaluate_step<B, M>(
    model:    &M,
    loader:   &dyn DataLoader<ImageBatch<B>>,
    loss_fn:  &CrossEntropyLoss<B>,
    progress: Progress,
) -> Result<EpochMetrics>
where
    B: Backend,
    M: ImageClassifier<B>,
{
    let mut acc = MetricAccumulator::new();

    for batch in loader.iter() {
        let batch_len = batch.labels.dims()[0];

        let scores = model.classify(batch.images);
        let loss_value: f64 = loss_fn
            .forward(scores.clone(), batch.labels.clone())
            .into_scalar()
            .elem::<f64>();

        // softmax is monotonic, argmax of the raw scores is the same class
        let predicted = scores.argmax(1).reshape([batch_len]);
        let correct   = count_correct(predicted, batch.labels);

        acc.update(loss_value, correct, batch_len);
        progress.report(&acc);
    }

    acc.finish()
}

fn count_correct<B: Backend>(predicted: Tensor<B, 1, Int>, labels: Tensor<B, 1, Int>) -> usize {
    let correct: i64 = predicted
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}
