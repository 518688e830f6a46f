use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::nn::loss::CrossEntropyLossConfig;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::prelude::*;
use burn::tensor::activation::softmax;
use tracing::debug;

type TrainBackend = Autodiff<NdArray>;
type InferBackend = NdArray;

/// Columns whose spread falls below this keep a unit scale.
const MIN_SCALE: f64 = 1e-6;

/// Hyper-parameters for the gradient-descent fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    pub iterations: usize,
    pub l2_penalty: f64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            iterations: 500,
            l2_penalty: 1e-3,
        }
    }
}

/// Multinomial logistic regression over standardized features.
///
/// A single linear layer trained with softmax cross-entropy and full-batch SGD from zero
/// weights, so the same inputs always produce the same parameters. Parameters are kept as
/// plain vectors (class-major weights) so they can be persisted and rebuilt as tensors.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftmaxClassifier {
    pub(crate) means: Vec<f64>,
    pub(crate) scales: Vec<f64>,
    pub(crate) weights: Vec<Vec<f64>>,
    pub(crate) biases: Vec<f64>,
}

impl SoftmaxClassifier {
    /// `rows` must all have the same width and `labels[i] < class_count`.
    pub fn fit(
        rows: &[Vec<f64>],
        labels: &[usize],
        class_count: usize,
        options: TrainingOptions,
    ) -> Result<Self, ClassifierError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || width == 0 {
            return Ok(Self::prior_only(labels, class_count, width));
        }

        let device = NdArrayDevice::default();
        let features = matrix::<TrainBackend, _>(
            rows.iter().flatten().copied(),
            [rows.len(), width],
            &device,
        );
        let means = features.clone().mean_dim(0);
        let spread = features.clone().var_bias(0).sqrt();
        let scales = spread.clone().mask_fill(spread.lower_elem(MIN_SCALE), 1.0);
        let standardized = (features - means.clone()) / scales.clone();

        let mut layer: Linear<TrainBackend> = LinearConfig::new(width, class_count)
            .with_initializer(Initializer::Zeros)
            .init(&device);

        if class_count >= 2 {
            let targets = Tensor::<TrainBackend, 1, Int>::from_data(
                TensorData::new(
                    labels.iter().map(|&label| label as i64).collect::<Vec<_>>(),
                    [labels.len()],
                ),
                &device,
            );
            let loss_fn = CrossEntropyLossConfig::new().init(&device);
            let mut optim = SgdConfig::new()
                .with_weight_decay(Some(WeightDecayConfig::new(options.l2_penalty as f32)))
                .init();
            // Step size bounded by the Lipschitz constant of the standardized softmax loss.
            let learning_rate = 1.0 / (width as f64 + 1.0);

            for iteration in 0..options.iterations {
                let logits = layer.forward(standardized.clone());
                let loss = loss_fn.forward(logits, targets.clone());
                if iteration + 1 == options.iterations {
                    debug!(loss = loss.clone().into_scalar().elem::<f64>(), "final training loss");
                }
                let grads = GradientsParams::from_grads(loss.backward(), &layer);
                layer = optim.step(learning_rate, layer, grads);
            }
        }

        // Linear stores weights feature-major as [width, classes].
        let flat = read(layer.weight.val())?;
        let weights = (0..class_count)
            .map(|class| {
                (0..width)
                    .map(|feature| flat[feature * class_count + class])
                    .collect()
            })
            .collect();
        let biases = match &layer.bias {
            Some(bias) => read(bias.val())?,
            None => vec![0.0; class_count],
        };

        Ok(Self {
            means: read(means)?,
            scales: read(scales)?,
            weights,
            biases,
        })
    }

    /// Without feature columns the best a softmax can do is the log class prior.
    fn prior_only(labels: &[usize], class_count: usize, width: usize) -> Self {
        let mut counts = vec![0usize; class_count];
        for &label in labels {
            if let Some(count) = counts.get_mut(label) {
                *count += 1;
            }
        }
        let total = labels.len().max(1) as f64;
        let biases = counts
            .into_iter()
            .map(|count| {
                if labels.is_empty() {
                    0.0
                } else {
                    (count.max(1) as f64 / total).ln()
                }
            })
            .collect();

        Self {
            means: vec![0.0; width],
            scales: vec![1.0; width],
            weights: vec![vec![0.0; width]; class_count],
            biases,
        }
    }

    pub fn class_count(&self) -> usize {
        self.biases.len()
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub fn probabilities(&self, raw: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        let device = NdArrayDevice::default();
        let width = self.width();
        let classes = self.class_count();
        let biases = matrix::<InferBackend, _>(self.biases.iter().copied(), [1, classes], &device);

        let logits = if width == 0 {
            biases
        } else {
            let input = matrix::<InferBackend, _>(raw.iter().copied(), [1, width], &device);
            let means = matrix::<InferBackend, _>(self.means.iter().copied(), [1, width], &device);
            let scales = matrix::<InferBackend, _>(self.scales.iter().copied(), [1, width], &device);
            let weights = matrix::<InferBackend, _>(
                (0..width).flat_map(|feature| self.weights.iter().map(move |row| row[feature])),
                [width, classes],
                &device,
            );
            ((input - means) / scales).matmul(weights) + biases
        };

        read(softmax(logits, 1))
    }

    /// Arg-max class and its probability; ties resolve to the lowest class id.
    pub fn predict(&self, raw: &[f64]) -> Result<(usize, f64), ClassifierError> {
        let probabilities = self.probabilities(raw)?;
        let mut best = (0, f64::NEG_INFINITY);
        for (class, probability) in probabilities.into_iter().enumerate() {
            if probability > best.1 {
                best = (class, probability);
            }
        }
        Ok(best)
    }
}

fn matrix<B, I>(values: I, shape: [usize; 2], device: &B::Device) -> Tensor<B, 2>
where
    B: Backend,
    I: IntoIterator<Item = f64>,
{
    let values: Vec<f32> = values.into_iter().map(|value| value as f32).collect();
    Tensor::from_data(TensorData::new(values, shape), device)
}

fn read<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f64>, ClassifierError> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map(|values| values.into_iter().map(f64::from).collect())
        .map_err(|err| ClassifierError::Readback(format!("{err:?}")))
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("failed to read classifier tensor: {0}")]
    Readback(String),
}
