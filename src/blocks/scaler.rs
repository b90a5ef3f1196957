use crate::ComplexSample;

/// Multiplies every sample by a constant.
#[derive(Copy, Clone, Debug)]
pub struct Scaler {
    gain: ComplexSample,
}

impl Scaler {
    pub fn new(gain: ComplexSample) -> Self {
        Self { gain }
    }

    pub fn process(&self, samples: &mut [ComplexSample]) {
        for sample in samples.iter_mut() {
            *sample *= self.gain;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unity_gain_passes_samples_through() {
        let input: Vec<ComplexSample> = (0..10)
            .map(|i| ComplexSample::new(i as f32 * 0.25 - 1.0, 0.5 - i as f32 * 0.125))
            .collect();
        let mut samples = input.clone();
        Scaler::new(ComplexSample::new(1.0, 0.0)).process(&mut samples);
        assert_eq!(samples, input);
    }

    #[test]
    fn complex_gain_rotates_and_scales() {
        let mut samples = vec![ComplexSample::new(1.0, 0.0), ComplexSample::new(0.0, 2.0)];
        Scaler::new(ComplexSample::new(0.0, 0.5)).process(&mut samples);
        assert_eq!(samples, vec![ComplexSample::new(0.0, 0.5), ComplexSample::new(-1.0, 0.0)]);
    }
}
