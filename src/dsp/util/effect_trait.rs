//! Trait for audio-processing types.

/// Generic trait for per-sample audio effects, allowing processors to be
/// composed behind dynamic dispatch.
pub trait Effect: dyn_clone::DynClone + Send + std::fmt::Debug {
    /// Optional method to process one stereo frame of audio.
    fn process_stereo(&mut self, in_l: f64, in_r: f64) -> (f64, f64) {
        (in_l, in_r)
    }

    /// Optional method to process a single sample of audio.
    fn process_mono(&mut self, input: f64, _channel_idx: usize) -> f64 {
        input
    }

    /// Required method to obtain the sample rate of the processor.
    fn get_sample_rate(&self) -> f64;

    /// Required method to obtain the name of the effect processor.
    fn get_identifier(&self) -> &str;
}

// This is used to allow `dyn Effect` trait objects to implement clone.
dyn_clone::clone_trait_object!(Effect);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{Comb, RingMod};

    #[test]
    fn effects_compose_behind_dynamic_dispatch() {
        let mut comb = Comb::new();
        comb.prepare(48000.0, 20.0, 2).unwrap();
        let mut ring_mod = RingMod::new();
        ring_mod.prepare(48000.0).unwrap();

        let mut chain: Vec<Box<dyn Effect>> =
            vec![Box::new(comb), Box::new(ring_mod)];
        let cloned = chain.clone();
        assert_eq!(cloned.len(), chain.len());

        let mut frame = (0.5, 0.5);
        for effect in &mut chain {
            frame = effect.process_stereo(frame.0, frame.1);
        }

        assert!(frame.0.is_finite() && frame.1.is_finite());
        assert_eq!(chain[0].get_identifier(), "comb");
        assert_eq!(chain[1].get_identifier(), "ring_mod");
    }
}
