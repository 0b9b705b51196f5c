//! Feed-forward multi-layer perceptron inference.
//!
//! The network topology is fixed after construction: weights and biases
//! are loaded once (typically from a JSON descriptor) and are read-only
//! during inference. There is no training path.

use crate::error::ConfigError;
use log::debug;
use serde::{Deserialize, Serialize};
use wide::f32x8;

/// The flat weight and bias storage of an [`Mlp`], together with its shape
/// descriptor.
///
/// Layouts are row-major over the destination dimension:
/// - `weight_input`: `[hidden_size][input_size]`
/// - `weight_hidden`: `[num_layers - 2][hidden_size][hidden_size]`
/// - `weight_output`: `[output_size][hidden_size]`
///
/// `num_layers` counts the input and output layers, so the minimum of `2`
/// means no hidden-to-hidden stages at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpParameters {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub num_layers: usize,

    pub weight_input: Vec<f32>,
    pub bias_input: Vec<f32>,

    pub weight_hidden: Vec<f32>,
    pub bias_hidden: Vec<f32>,

    pub weight_output: Vec<f32>,
    pub bias_output: Vec<f32>,
}

impl MlpParameters {
    /// Creates a zero-initialized parameter set for the given shape.
    ///
    /// # Errors
    ///
    /// Returns an error if any size is zero or `num_layers < 2`.
    pub fn zeroed(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        num_layers: usize,
    ) -> Result<Self, ConfigError> {
        let params = Self {
            input_size,
            hidden_size,
            output_size,
            num_layers,

            weight_input: vec![0.0; hidden_size * input_size],
            bias_input: vec![0.0; hidden_size],

            weight_hidden: vec![
                0.0;
                num_layers.saturating_sub(2)
                    * hidden_size
                    * hidden_size
            ],
            bias_hidden: vec![
                0.0;
                num_layers.saturating_sub(2) * hidden_size
            ],

            weight_output: vec![0.0; output_size * hidden_size],
            bias_output: vec![0.0; output_size],
        };

        params.validate()?;

        Ok(params)
    }

    /// Parses and validates a parameter set from its JSON descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the array lengths do
    /// not match the shape descriptor.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::MalformedParameters(e.to_string()))?;

        params.validate()?;

        debug!(
            "loaded mlp parameters: {}-{}x{}-{}",
            params.input_size,
            params.hidden_size,
            params.num_layers.saturating_sub(2),
            params.output_size
        );

        Ok(params)
    }

    /// Checks the shape descriptor and every array length against it.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first mismatch found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_layers < 2 {
            return Err(ConfigError::InvalidNetworkShape(format!(
                "num_layers must be at least 2, got {}",
                self.num_layers
            )));
        }
        if self.input_size == 0 || self.hidden_size == 0 || self.output_size == 0
        {
            return Err(ConfigError::InvalidNetworkShape(
                "layer sizes must be at least 1".to_string(),
            ));
        }

        let hidden_layers = self.num_layers - 2;
        let expectations = [
            ("weight_input", self.weight_input.len(), self.hidden_size * self.input_size),
            ("bias_input", self.bias_input.len(), self.hidden_size),
            ("weight_hidden", self.weight_hidden.len(), hidden_layers * self.hidden_size * self.hidden_size),
            ("bias_hidden", self.bias_hidden.len(), hidden_layers * self.hidden_size),
            ("weight_output", self.weight_output.len(), self.output_size * self.hidden_size),
            ("bias_output", self.bias_output.len(), self.output_size),
        ];

        for (name, len, expected) in expectations {
            if len != expected {
                return Err(ConfigError::InvalidNetworkShape(format!(
                    "{name} holds {len} values, expected {expected}"
                )));
            }
        }

        Ok(())
    }

    fn hidden_layers(&self) -> usize {
        self.num_layers - 2
    }
}

/// A fixed-topology fully connected feed-forward network with ReLU
/// activations on the input and hidden layers, and none on the output
/// layer.
///
/// Scratch storage is allocated once at construction; inference performs
/// no allocation.
#[derive(Debug, Clone)]
pub struct Mlp {
    params: MlpParameters,

    // scratch activations, swapped between layers
    x: Vec<f32>,
    y: Vec<f32>,
}

impl Mlp {
    /// Creates a new `Mlp` from a validated parameter set.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter shapes are inconsistent.
    pub fn new(params: MlpParameters) -> Result<Self, ConfigError> {
        params.validate()?;

        let hidden = params.hidden_size;

        Ok(Self {
            params,
            x: vec![0.0; hidden],
            y: vec![0.0; hidden],
        })
    }

    /// Returns the network's parameter set.
    #[must_use]
    pub fn parameters(&self) -> &MlpParameters {
        &self.params
    }

    /// Runs `num_frames` input vectors through the network.
    ///
    /// Buffers are flat and frame-major: `input` holds
    /// `num_frames * input_size` values and `output` must hold
    /// `num_frames * output_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if either buffer length disagrees with the shape
    /// descriptor.
    pub fn forward(
        &mut self,
        output: &mut [f32],
        input: &[f32],
        num_frames: usize,
    ) -> Result<(), ConfigError> {
        let p = &self.params;

        if input.len() != num_frames * p.input_size {
            return Err(ConfigError::BufferSizeMismatch {
                expected: num_frames * p.input_size,
                got: input.len(),
            });
        }
        if output.len() != num_frames * p.output_size {
            return Err(ConfigError::BufferSizeMismatch {
                expected: num_frames * p.output_size,
                got: output.len(),
            });
        }

        for n in 0..num_frames {
            let in_vec = &input[n * p.input_size..(n + 1) * p.input_size];

            // input layer
            for i in 0..p.hidden_size {
                let row = &p.weight_input
                    [i * p.input_size..(i + 1) * p.input_size];
                self.y[i] = dot(row, in_vec) + p.bias_input[i];
            }
            relu(&mut self.y);

            // hidden layers
            for l in 0..p.hidden_layers() {
                std::mem::swap(&mut self.x, &mut self.y);

                let wbase = l * p.hidden_size * p.hidden_size;
                let bbase = l * p.hidden_size;

                for i in 0..p.hidden_size {
                    let row = &p.weight_hidden[wbase + i * p.hidden_size
                        ..wbase + (i + 1) * p.hidden_size];
                    self.y[i] = dot(row, &self.x) + p.bias_hidden[bbase + i];
                }
                relu(&mut self.y);
            }

            // output layer, no activation
            let out_vec =
                &mut output[n * p.output_size..(n + 1) * p.output_size];
            for (i, out) in out_vec.iter_mut().enumerate() {
                let row = &p.weight_output
                    [i * p.hidden_size..(i + 1) * p.hidden_size];
                *out = dot(row, &self.y) + p.bias_output[i];
            }
        }

        Ok(())
    }
}

/// SIMD inner product over two equal-length slices.
#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut acc = f32x8::splat(0.0);
    let mut chunks_a = a.chunks_exact(8);
    let mut chunks_b = b.chunks_exact(8);

    for (ca, cb) in (&mut chunks_a).zip(&mut chunks_b) {
        let va = f32x8::from(<[f32; 8]>::try_from(ca).unwrap());
        let vb = f32x8::from(<[f32; 8]>::try_from(cb).unwrap());
        acc = va.mul_add(vb, acc);
    }

    let mut sum = acc.reduce_add();
    for (ra, rb) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        sum = ra.mul_add(*rb, sum);
    }

    sum
}

#[inline]
fn relu(values: &mut [f32]) {
    for v in values {
        *v = v.max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_network_outputs_zeros() {
        let params = MlpParameters::zeroed(3, 4, 2, 4).unwrap();
        let mut mlp = Mlp::new(params).unwrap();

        let input = [1.0, -2.0, 3.0, 0.5, 0.0, -1.0];
        let mut output = [9.0; 4];
        mlp.forward(&mut output, &input, 2).unwrap();

        assert_eq!(output, [0.0; 4]);
    }

    #[test]
    fn minimal_network_matches_hand_computation() {
        // 2-in, 2-hidden, 2-out, no hidden-to-hidden layers
        let mut params = MlpParameters::zeroed(2, 2, 2, 2).unwrap();
        // identity input weights
        params.weight_input = vec![1.0, 0.0, 0.0, 1.0];
        params.bias_input = vec![0.0, 0.5];
        // output layer swaps the two activations
        params.weight_output = vec![0.0, 1.0, 1.0, 0.0];
        params.bias_output = vec![-1.0, 0.0];

        let mut mlp = Mlp::new(params).unwrap();

        // y = relu([2.0, -3.0 + 0.5]) = [2.0, 0.0]
        // out = [y[1] - 1.0, y[0]] = [-1.0, 2.0]
        let mut output = [0.0; 2];
        mlp.forward(&mut output, &[2.0, -3.0], 1).unwrap();

        assert_eq!(output, [-1.0, 2.0]);
    }

    #[test]
    fn hidden_layers_are_applied() {
        // 1-in, 1-hidden-unit, 1-out, one hidden-to-hidden layer
        let mut params = MlpParameters::zeroed(1, 1, 1, 3).unwrap();
        params.weight_input = vec![2.0];
        params.weight_hidden = vec![3.0];
        params.weight_output = vec![5.0];

        let mut mlp = Mlp::new(params).unwrap();

        let mut output = [0.0];
        mlp.forward(&mut output, &[1.0], 1).unwrap();

        // 1 * 2 -> relu -> * 3 -> relu -> * 5
        assert_eq!(output, [30.0]);

        // negative activations are rectified away at the input layer
        mlp.forward(&mut output, &[-1.0], 1).unwrap();
        assert_eq!(output, [0.0]);
    }

    #[test]
    fn wide_rows_exercise_the_simd_path() {
        // hidden size 17: two full SIMD chunks plus a remainder
        let hidden = 17;
        let mut params = MlpParameters::zeroed(hidden, hidden, 1, 2).unwrap();

        // input layer: identity; output row: all ones
        for i in 0..hidden {
            params.weight_input[i * hidden + i] = 1.0;
        }
        params.weight_output = vec![1.0; hidden];

        let mut mlp = Mlp::new(params).unwrap();

        let input: Vec<f32> = (0..hidden).map(|i| i as f32).collect();
        let mut output = [0.0];
        mlp.forward(&mut output, &input, 1).unwrap();

        // sum of 0..=16
        assert_eq!(output, [136.0]);
    }

    #[test]
    fn shape_mismatches_are_rejected() {
        assert!(matches!(
            MlpParameters::zeroed(1, 1, 1, 1),
            Err(ConfigError::InvalidNetworkShape(_))
        ));
        assert!(matches!(
            MlpParameters::zeroed(0, 1, 1, 2),
            Err(ConfigError::InvalidNetworkShape(_))
        ));

        let mut params = MlpParameters::zeroed(2, 3, 1, 2).unwrap();
        params.weight_input.pop();
        assert!(matches!(
            Mlp::new(params),
            Err(ConfigError::InvalidNetworkShape(_))
        ));
    }

    #[test]
    fn forward_checks_buffer_lengths() {
        let params = MlpParameters::zeroed(2, 2, 1, 2).unwrap();
        let mut mlp = Mlp::new(params).unwrap();

        let mut output = [0.0; 2];
        assert_eq!(
            mlp.forward(&mut output, &[0.0; 3], 2),
            Err(ConfigError::BufferSizeMismatch { expected: 4, got: 3 })
        );
    }

    #[test]
    fn parameters_round_trip_through_json() {
        let mut params = MlpParameters::zeroed(2, 2, 1, 3).unwrap();
        params.weight_input[0] = 0.25;
        params.bias_hidden[1] = -1.5;

        let json = serde_json::to_string(&params).unwrap();
        let loaded = MlpParameters::from_json(&json).unwrap();

        assert_eq!(loaded, params);
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            MlpParameters::from_json("{\"input_size\": 2"),
            Err(ConfigError::MalformedParameters(_))
        ));
    }
}
