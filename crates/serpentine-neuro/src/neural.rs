//! Feed-forward policy networks
//!
//! Simple two-layer network: input -> hidden (tanh) -> output (tanh), with a
//! bias per neuron. Weights come from a [`PolicyGenome`] in row-major order:
//! input->hidden matrix, hidden biases, hidden->output matrix, output biases.

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use serpentine_core::{Action, FEATURE_COUNT, Policy};

use crate::error::{EvolutionError, EvolutionResult};
use crate::genome::PolicyGenome;

/// Shape of a feed-forward network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLayout {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub output_dim: usize,
}

impl NetworkLayout {
    /// Layout matching the sensor vector and action set
    pub fn for_sensors(hidden_dim: usize) -> Self {
        Self {
            input_dim: FEATURE_COUNT,
            hidden_dim,
            output_dim: Action::COUNT,
        }
    }

    /// Total number of weights and biases
    pub fn weight_count(&self) -> usize {
        self.input_dim * self.hidden_dim
            + self.hidden_dim
            + self.hidden_dim * self.output_dim
            + self.output_dim
    }
}

impl Default for NetworkLayout {
    fn default() -> Self {
        Self::for_sensors(8)
    }
}

/// Network built from a genome, evaluated once per tick
#[derive(Debug, Clone)]
pub struct FeedForwardPolicy {
    genome_id: u64,
    layout: NetworkLayout,
    input_to_hidden: Array2<f32>,
    hidden_bias: Array1<f32>,
    hidden_to_output: Array2<f32>,
    output_bias: Array1<f32>,
}

impl FeedForwardPolicy {
    pub fn from_genome(genome: &PolicyGenome) -> EvolutionResult<Self> {
        let layout = genome.layout;
        let expected = layout.weight_count();
        if genome.weights.len() != expected {
            return Err(EvolutionError::GenomeShape {
                id: genome.id,
                expected,
                actual: genome.weights.len(),
            });
        }

        let (i, h, o) = (layout.input_dim, layout.hidden_dim, layout.output_dim);
        let mut rest = genome.weights.as_slice();
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };

        let shape_err = |_: ndarray::ShapeError| EvolutionError::GenomeShape {
            id: genome.id,
            expected,
            actual: genome.weights.len(),
        };
        let input_to_hidden = Array2::from_shape_vec((h, i), take(h * i)).map_err(shape_err)?;
        let hidden_bias = Array1::from_vec(take(h));
        let hidden_to_output = Array2::from_shape_vec((o, h), take(o * h)).map_err(shape_err)?;
        let output_bias = Array1::from_vec(take(o));

        Ok(Self {
            genome_id: genome.id,
            layout,
            input_to_hidden,
            hidden_bias,
            hidden_to_output,
            output_bias,
        })
    }

    /// Genome this network was built from
    pub fn genome_id(&self) -> u64 {
        self.genome_id
    }

    pub fn layout(&self) -> NetworkLayout {
        self.layout
    }

    /// Forward pass: features -> action scores
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let input = ArrayView1::from(input);
        let hidden = (self.input_to_hidden.dot(&input) + &self.hidden_bias).mapv(f32::tanh);
        let output = (self.hidden_to_output.dot(&hidden) + &self.output_bias).mapv(f32::tanh);
        output.to_vec()
    }
}

impl Policy for FeedForwardPolicy {
    fn input_arity(&self) -> usize {
        self.layout.input_dim
    }

    fn output_arity(&self) -> usize {
        self.layout.output_dim
    }

    fn evaluate(&self, features: &[f32]) -> Vec<f32> {
        self.forward(features)
    }
}
