//! Second-order-section designs from the
//! [Audio EQ Cookbook by Robert Bristow-Johnson](https://www.w3.org/TR/audio-eq-cookbook/).
//!
//! All functions return `[b0, b1, b2, a1, a2]`, normalized by a0 and ready
//! for [`Biquad::set_section_coeffs`](super::Biquad::set_section_coeffs).

use crate::dsp::filtering::biquad::COEFFS_PER_SECTION;
use std::f64::consts::TAU;

/// A section which leaves the input signal totally unaffected.
#[must_use]
pub fn identity() -> [f64; COEFFS_PER_SECTION] {
    [1.0, 0.0, 0.0, 0.0, 0.0]
}

/// A lowpass section with cutoff `freq` Hz and quality factor `q`.
#[must_use]
pub fn lowpass(freq: f64, q: f64, sample_rate: f64) -> [f64; COEFFS_PER_SECTION] {
    let (phi, alpha) = phi_alpha(freq, q, sample_rate);
    let cos_phi = phi.cos();

    let a0 = 1.0 + alpha;
    let b1 = (1.0 - cos_phi) / a0;
    let b0 = b1 * 0.5;

    [b0, b1, b0, (-2.0 * cos_phi) / a0, (1.0 - alpha) / a0]
}

/// A highpass section with cutoff `freq` Hz and quality factor `q`.
#[must_use]
pub fn highpass(freq: f64, q: f64, sample_rate: f64) -> [f64; COEFFS_PER_SECTION] {
    let (phi, alpha) = phi_alpha(freq, q, sample_rate);
    let cos_phi = phi.cos();

    let a0 = 1.0 + alpha;
    let b1 = (-(1.0 + cos_phi)) / a0;
    let b0 = -b1 * 0.5;

    [b0, b1, b0, (-2.0 * cos_phi) / a0, (1.0 - alpha) / a0]
}

/// A constant-0-dB-peak bandpass section centred on `freq` Hz.
#[must_use]
pub fn bandpass(freq: f64, q: f64, sample_rate: f64) -> [f64; COEFFS_PER_SECTION] {
    let (phi, alpha) = phi_alpha(freq, q, sample_rate);
    let cos_phi = phi.cos();

    let a0 = 1.0 + alpha;

    [
        alpha / a0,
        0.0,
        -alpha / a0,
        (-2.0 * cos_phi) / a0,
        (1.0 - alpha) / a0,
    ]
}

/// A peaking-EQ section centred on `freq` Hz with `gain_db` of boost or cut.
#[must_use]
pub fn peak(
    freq: f64,
    q: f64,
    gain_db: f64,
    sample_rate: f64,
) -> [f64; COEFFS_PER_SECTION] {
    let (phi, alpha) = phi_alpha(freq, q, sample_rate);
    let cos_phi = phi.cos();
    let amp = 10.0f64.powf(gain_db / 40.0);

    let a0 = 1.0 + alpha / amp;

    [
        alpha.mul_add(amp, 1.0) / a0,
        (-2.0 * cos_phi) / a0,
        alpha.mul_add(-amp, 1.0) / a0,
        (-2.0 * cos_phi) / a0,
        (1.0 - alpha / amp) / a0,
    ]
}

fn phi_alpha(freq: f64, q: f64, sample_rate: f64) -> (f64, f64) {
    debug_assert!(
        freq.is_sign_positive()
            && q.is_sign_positive()
            && freq <= sample_rate / 2.0
    );

    let phi = TAU * (freq / sample_rate);
    let alpha = phi.sin() / (2.0 * q);

    (phi, alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::within_tolerance;

    /// DC gain of a section: H(1) = (b0 + b1 + b2) / (1 + a1 + a2).
    fn dc_gain(c: &[f64; COEFFS_PER_SECTION]) -> f64 {
        (c[0] + c[1] + c[2]) / (1.0 + c[3] + c[4])
    }

    #[test]
    fn lowpass_passes_dc_at_unity() {
        let c = lowpass(1000.0, std::f64::consts::FRAC_1_SQRT_2, 48000.0);
        assert!(within_tolerance(dc_gain(&c), 1.0, 1e-9));
    }

    #[test]
    fn highpass_blocks_dc() {
        let c = highpass(1000.0, std::f64::consts::FRAC_1_SQRT_2, 48000.0);
        assert!(within_tolerance(dc_gain(&c), 0.0, 1e-9));
    }

    #[test]
    fn bandpass_blocks_dc() {
        let c = bandpass(1000.0, 1.0, 48000.0);
        assert!(within_tolerance(dc_gain(&c), 0.0, 1e-9));
    }

    #[test]
    fn peak_with_zero_gain_has_unity_transfer() {
        // numerator and denominator polynomials coincide: H(z) = 1
        let [b0, b1, b2, a1, a2] = peak(1000.0, 1.0, 0.0, 48000.0);

        assert!(within_tolerance(b0, 1.0, 1e-12));
        assert!(within_tolerance(b1, a1, 1e-12));
        assert!(within_tolerance(b2, a2, 1e-12));
    }

    #[test]
    fn identity_section_is_flat() {
        assert!(within_tolerance(dc_gain(&identity()), 1.0, f64::EPSILON));
    }
}
