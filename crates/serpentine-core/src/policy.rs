//! Interfaces to the external neuroevolution engine
//!
//! These traits decouple the simulation from how policies are represented
//! and how the next generation is produced.

/// Decision-making unit bound to one cohort member.
///
/// Evaluation must be a pure function of the features: the cohort calls it
/// once per tick and attributes no side effects to it.
pub trait Policy {
    /// Number of features the policy consumes
    fn input_arity(&self) -> usize;

    /// Number of action scores the policy produces
    fn output_arity(&self) -> usize;

    /// Map a feature vector to one score per action
    fn evaluate(&self, features: &[f32]) -> Vec<f32>;
}

impl<P: Policy + ?Sized> Policy for &P {
    fn input_arity(&self) -> usize {
        (**self).input_arity()
    }

    fn output_arity(&self) -> usize {
        (**self).output_arity()
    }

    fn evaluate(&self, features: &[f32]) -> Vec<f32> {
        (**self).evaluate(features)
    }
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn input_arity(&self) -> usize {
        (**self).input_arity()
    }

    fn output_arity(&self) -> usize {
        (**self).output_arity()
    }

    fn evaluate(&self, features: &[f32]) -> Vec<f32> {
        (**self).evaluate(features)
    }
}

/// Receiver for a member's final fitness, written exactly once on removal
pub trait FitnessSink {
    fn record(&mut self, fitness: f32);
}

impl FitnessSink for &mut f32 {
    fn record(&mut self, fitness: f32) {
        **self = fitness;
    }
}

/// Sink that discards fitness, for replays and previews
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardFitness;

impl FitnessSink for DiscardFitness {
    fn record(&mut self, _fitness: f32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant;

    impl Policy for Constant {
        fn input_arity(&self) -> usize {
            2
        }

        fn output_arity(&self) -> usize {
            3
        }

        fn evaluate(&self, _features: &[f32]) -> Vec<f32> {
            vec![0.0, 1.0, 0.0]
        }
    }

    #[test]
    fn test_policy_through_box_and_ref() {
        let boxed: Box<dyn Policy> = Box::new(Constant);
        assert_eq!(boxed.input_arity(), 2);
        assert_eq!((&boxed).evaluate(&[0.0, 0.0]), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_mut_f32_sink() {
        let mut fitness = 0.0;
        {
            let mut sink = &mut fitness;
            sink.record(4.0);
        }
        assert_eq!(fitness, 4.0);
    }
}
