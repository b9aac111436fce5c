//! Zero-phase Butterworth band-pass filtering.
//!
//! The filter is designed as an analog Butterworth low-pass prototype,
//! transformed to a band-pass, and mapped to the z-plane with the bilinear
//! transform (cutoffs pre-warped). It is realized as cascaded second-order
//! sections and run forward then backward over the whole buffer, so the
//! output has no net time shift relative to the input.

use super::WaveformBuffer;
use crate::constants::filter::{DEFAULT_HIGH_HZ, DEFAULT_LOW_HZ, DEFAULT_ORDER, MAX_ORDER};
use crate::error::{Error, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Imaginary parts below this are treated as real poles when pairing.
const REAL_POLE_TOLERANCE: f64 = 1e-12;

/// Band-pass cutoffs and prototype order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Lower cutoff in Hz.
    pub low_hz: f64,
    /// Upper cutoff in Hz.
    pub high_hz: f64,
    /// Butterworth prototype order; the band-pass has twice as many poles.
    pub order: u32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            low_hz: DEFAULT_LOW_HZ,
            high_hz: DEFAULT_HIGH_HZ,
            order: DEFAULT_ORDER,
        }
    }
}

impl FilterSpec {
    /// Check the invariants that do not depend on the sample rate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilterSpec`] (with `sample_rate` 0) if the
    /// order is out of range or the cutoffs are not `0 < low < high`.
    pub fn validate_cutoffs(&self) -> Result<()> {
        self.check(None)
    }

    /// Check `0 < low_hz < high_hz < sample_rate / 2` and the order range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilterSpec`] describing the violated invariant.
    pub fn validate(&self, sample_rate: u32) -> Result<()> {
        self.check(Some(sample_rate))
    }

    fn check(&self, sample_rate: Option<u32>) -> Result<()> {
        let fail = |reason: String| Error::InvalidFilterSpec {
            low_hz: self.low_hz,
            high_hz: self.high_hz,
            order: self.order,
            sample_rate: sample_rate.unwrap_or(0),
            reason,
        };

        if self.order == 0 || self.order > MAX_ORDER {
            return Err(fail(format!("order must be between 1 and {MAX_ORDER}")));
        }
        if !self.low_hz.is_finite() || self.low_hz <= 0.0 {
            return Err(fail("low_hz must be greater than 0".to_string()));
        }
        if !self.high_hz.is_finite() || self.high_hz <= self.low_hz {
            return Err(fail("high_hz must be greater than low_hz".to_string()));
        }
        if let Some(rate) = sample_rate {
            let nyquist = f64::from(rate) / 2.0;
            if self.high_hz >= nyquist {
                return Err(fail(format!(
                    "high_hz must be below the Nyquist frequency ({nyquist} Hz)"
                )));
            }
        }
        Ok(())
    }
}

/// One second-order section, `a[0]` normalized to 1.
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b: [f64; 3],
    a: [f64; 3],
}

impl Biquad {
    fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = self.b[0] + z1 * self.b[1] + z2 * self.b[2];
        let den = self.a[0] + z1 * self.a[1] + z2 * self.a[2];
        num / den
    }

    /// Steady-state transposed direct-form II state for a unit step input.
    fn step_state(&self) -> [f64; 2] {
        let a_sum = self.a.iter().sum::<f64>();
        let dc = if a_sum.abs() > f64::EPSILON {
            self.b.iter().sum::<f64>() / a_sum
        } else {
            0.0
        };
        let z1 = self.b[2] - self.a[2] * dc;
        let z0 = self.b[1] - self.a[1] * dc + z1;
        [z0, z1]
    }

    fn dc_gain(&self) -> f64 {
        let a_sum = self.a.iter().sum::<f64>();
        if a_sum.abs() > f64::EPSILON {
            self.b.iter().sum::<f64>() / a_sum
        } else {
            0.0
        }
    }
}

/// A designed Butterworth band-pass for one sample rate.
#[derive(Debug, Clone)]
pub struct BandpassFilter {
    sections: Vec<Biquad>,
    sample_rate: u32,
}

impl BandpassFilter {
    /// Design the filter described by `spec` for `sample_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilterSpec`] when the cutoffs are not
    /// strictly ordered below Nyquist or the order is out of range.
    pub fn design(spec: &FilterSpec, sample_rate: u32) -> Result<Self> {
        spec.validate(sample_rate)?;

        let fs = f64::from(sample_rate);
        let warp = |hz: f64| 2.0 * fs * (PI * hz / fs).tan();
        let w_low = warp(spec.low_hz);
        let w_high = warp(spec.high_hz);
        let bandwidth = w_high - w_low;
        let w_center = (w_low * w_high).sqrt();

        let order = spec.order;
        let mut poles = Vec::with_capacity(2 * order as usize);
        for k in 0..order {
            let theta = PI * f64::from(2 * k + order + 1) / f64::from(2 * order);
            let prototype = Complex64::from_polar(1.0, theta);

            // Low-pass to band-pass: each prototype pole splits in two
            let half = prototype * (bandwidth / 2.0);
            let disc = (half * half - w_center * w_center).sqrt();
            for s in [half + disc, half - disc] {
                poles.push((2.0 * fs + s) / (2.0 * fs - s));
            }
        }

        let omega_center = 2.0 * (w_center / (2.0 * fs)).atan();
        let sections = pair_poles(&poles)
            .into_iter()
            .map(|(p1, p2)| {
                let mut section = Biquad {
                    // One zero at z = 1 and one at z = -1 per section
                    b: [1.0, 0.0, -1.0],
                    a: [1.0, -(p1 + p2).re, (p1 * p2).re],
                };
                let gain = section.response(omega_center).norm();
                if gain > 0.0 {
                    for b in &mut section.b {
                        *b /= gain;
                    }
                }
                section
            })
            .collect();

        Ok(Self {
            sections,
            sample_rate,
        })
    }

    /// Sample rate the filter was designed for.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of second-order sections (equal to the prototype order).
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Magnitude of the single-pass frequency response at `hz`.
    #[must_use]
    pub fn magnitude_at(&self, hz: f64) -> f64 {
        let omega = 2.0 * PI * hz / f64::from(self.sample_rate);
        self.sections
            .iter()
            .map(|s| s.response(omega))
            .fold(Complex64::new(1.0, 0.0), |acc, h| acc * h)
            .norm()
    }

    /// Largest pole radius across all sections; below 1.0 for a stable filter.
    #[must_use]
    pub fn max_pole_radius(&self) -> f64 {
        self.sections
            .iter()
            .flat_map(|s| {
                let disc = Complex64::new(s.a[1] * s.a[1] - 4.0 * s.a[2], 0.0).sqrt();
                [(-s.a[1] + disc) / 2.0, (-s.a[1] - disc) / 2.0]
            })
            .map(Complex64::norm)
            .fold(0.0, f64::max)
    }

    /// Filter the whole buffer forward and backward (zero phase).
    ///
    /// Edges are extended by odd reflection and each pass starts from the
    /// steady state of its first input sample, which keeps start-up
    /// transients out of the signal.
    #[must_use]
    pub fn apply(&self, buffer: WaveformBuffer) -> WaveformBuffer {
        let sample_rate = buffer.sample_rate();
        let samples = buffer.into_samples();
        if samples.is_empty() || self.sections.is_empty() {
            return WaveformBuffer::new(samples, sample_rate);
        }

        let n = samples.len();
        let padlen = (3 * (2 * self.sections.len() + 1)).min(n - 1);
        let mut data = odd_extend(&samples, padlen);

        let zi = self.initial_states();

        let first = data[0];
        self.run(&mut data, &zi, first);
        data.reverse();
        let first = data[0];
        self.run(&mut data, &zi, first);
        data.reverse();

        #[allow(clippy::cast_possible_truncation)]
        let filtered = data[padlen..padlen + n].iter().map(|&y| y as f32).collect();
        WaveformBuffer::new(filtered, sample_rate)
    }

    /// Per-section step states, scaled by the DC gain of preceding sections.
    fn initial_states(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|section| {
                let [z0, z1] = section.step_state();
                let state = [z0 * scale, z1 * scale];
                scale *= section.dc_gain();
                state
            })
            .collect()
    }

    /// Run the cascade in place, transposed direct-form II.
    fn run(&self, data: &mut [f64], zi: &[[f64; 2]], x0: f64) {
        for (section, init) in self.sections.iter().zip(zi) {
            let [b0, b1, b2] = section.b;
            let [_, a1, a2] = section.a;
            let mut z0 = init[0] * x0;
            let mut z1 = init[1] * x0;
            for x in data.iter_mut() {
                let input = *x;
                let y = b0 * input + z0;
                z0 = b1 * input - a1 * y + z1;
                z1 = b2 * input - a2 * y;
                *x = y;
            }
        }
    }
}

/// Group poles into conjugate pairs, then pair any remaining real poles.
fn pair_poles(poles: &[Complex64]) -> Vec<(Complex64, Complex64)> {
    let mut pairs: Vec<(Complex64, Complex64)> = poles
        .iter()
        .filter(|p| p.im > REAL_POLE_TOLERANCE)
        .map(|p| (*p, p.conj()))
        .collect();

    let mut real: Vec<f64> = poles
        .iter()
        .filter(|p| p.im.abs() <= REAL_POLE_TOLERANCE)
        .map(|p| p.re)
        .collect();
    real.sort_by(f64::total_cmp);

    for chunk in real.chunks(2) {
        let p1 = Complex64::new(chunk[0], 0.0);
        let p2 = chunk.get(1).map_or(Complex64::new(0.0, 0.0), |&p| Complex64::new(p, 0.0));
        pairs.push((p1, p2));
    }

    pairs
}

/// Extend `x` by `padlen` samples on each side using odd reflection.
fn odd_extend(x: &[f32], padlen: usize) -> Vec<f64> {
    let n = x.len();
    let first = f64::from(x[0]);
    let last = f64::from(x[n - 1]);

    let mut out = Vec::with_capacity(n + 2 * padlen);
    out.extend((1..=padlen).rev().map(|i| 2.0 * first - f64::from(x[i])));
    out.extend(x.iter().map(|&s| f64::from(s)));
    out.extend((1..=padlen).map(|i| 2.0 * last - f64::from(x[n - 1 - i])));
    out
}

/// Design and apply a band-pass in one step.
///
/// # Errors
///
/// Returns [`Error::InvalidFilterSpec`] if `spec` is invalid for the
/// buffer's sample rate.
pub fn bandpass(buffer: WaveformBuffer, spec: &FilterSpec) -> Result<WaveformBuffer> {
    let filter = BandpassFilter::design(spec, buffer.sample_rate())?;
    Ok(filter.apply(buffer))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use super::*;

    fn spec(low_hz: f64, high_hz: f64) -> FilterSpec {
        FilterSpec {
            low_hz,
            high_hz,
            order: 4,
        }
    }

    #[test]
    fn test_design_rejects_high_cutoff_at_nyquist() {
        let result = BandpassFilter::design(&spec(2000.0, 11_025.0), 22_050);
        assert!(matches!(result, Err(Error::InvalidFilterSpec { .. })));
    }

    #[test]
    fn test_design_rejects_inverted_cutoffs() {
        assert!(BandpassFilter::design(&spec(5000.0, 3000.0), 44_100).is_err());
        assert!(BandpassFilter::design(&spec(3000.0, 3000.0), 44_100).is_err());
    }

    #[test]
    fn test_design_rejects_non_positive_low_cutoff() {
        assert!(BandpassFilter::design(&spec(0.0, 3000.0), 44_100).is_err());
        assert!(BandpassFilter::design(&spec(-10.0, 3000.0), 44_100).is_err());
    }

    #[test]
    fn test_design_rejects_bad_order() {
        let mut s = spec(2000.0, 8000.0);
        s.order = 0;
        assert!(BandpassFilter::design(&s, 44_100).is_err());
        s.order = MAX_ORDER + 1;
        assert!(s.validate_cutoffs().is_err());
    }

    #[test]
    fn test_section_count_matches_order() {
        for order in 1..=6 {
            let s = FilterSpec {
                low_hz: 2000.0,
                high_hz: 10_000.0,
                order,
            };
            let filter = BandpassFilter::design(&s, 44_100).unwrap();
            assert_eq!(filter.section_count(), order as usize);
        }
    }

    #[test]
    fn test_filter_is_stable() {
        let filter = BandpassFilter::design(&spec(2500.0, 9000.0), 22_050).unwrap();
        assert!(filter.max_pole_radius() < 1.0);
    }

    #[test]
    fn test_unity_gain_at_center_and_half_power_at_edges() {
        let filter = BandpassFilter::design(&spec(2000.0, 10_000.0), 44_100).unwrap();

        // Centre of the pre-warped band maps back to this frequency
        let fs = 44_100.0_f64;
        let warp = |hz: f64| 2.0 * fs * (PI * hz / fs).tan();
        let w0 = (warp(2000.0) * warp(10_000.0)).sqrt();
        let center_hz = (w0 / (2.0 * fs)).atan() * fs / PI;

        assert!((filter.magnitude_at(center_hz) - 1.0).abs() < 1e-6);
        let half_power = 1.0 / 2.0_f64.sqrt();
        assert!((filter.magnitude_at(2000.0) - half_power).abs() < 1e-3);
        assert!((filter.magnitude_at(10_000.0) - half_power).abs() < 1e-3);
    }

    #[test]
    fn test_stopband_is_attenuated() {
        let filter = BandpassFilter::design(&spec(2000.0, 10_000.0), 44_100).unwrap();
        assert!(filter.magnitude_at(100.0) < 1e-3);
        assert!(filter.magnitude_at(20_000.0) < 1e-2);
    }

    #[test]
    fn test_impulse_peak_stays_aligned() {
        let mut samples = vec![0.0f32; 4001];
        samples[2000] = 1.0;
        let filtered = bandpass(WaveformBuffer::new(samples, 44_100), &spec(2000.0, 10_000.0))
            .unwrap();

        let peak_index = filtered
            .samples()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_index, 2000);
        assert_eq!(filtered.len(), 4001);
    }

    #[test]
    fn test_output_is_symmetric_around_impulse() {
        let mut samples = vec![0.0f32; 4001];
        samples[2000] = 1.0;
        let filtered = bandpass(WaveformBuffer::new(samples, 22_050), &spec(2500.0, 9000.0))
            .unwrap();
        let y = filtered.samples();
        for offset in 1..50 {
            assert!((y[2000 - offset] - y[2000 + offset]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_passband_tone_survives_and_dc_is_removed() {
        let sr = 44_100u32;
        let tone: Vec<f32> = (0..sr)
            .map(|i| 0.5 * (2.0 * PI * 5000.0 * f64::from(i) / f64::from(sr)).sin() as f32)
            .collect();
        let out = bandpass(WaveformBuffer::new(tone, sr), &spec(2000.0, 10_000.0)).unwrap();
        let mid = &out.samples()[10_000..30_000];
        let peak = mid.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 0.5).abs() < 0.02);

        let dc = vec![0.5f32; 8000];
        let out = bandpass(WaveformBuffer::new(dc, sr), &spec(2000.0, 10_000.0)).unwrap();
        assert!(out.samples()[4000].abs() < 1e-3);
    }

    #[test]
    fn test_empty_and_single_sample_buffers() {
        let out = bandpass(WaveformBuffer::new(Vec::new(), 44_100), &spec(2000.0, 10_000.0))
            .unwrap();
        assert!(out.is_empty());

        let out = bandpass(WaveformBuffer::new(vec![0.3], 44_100), &spec(2000.0, 10_000.0))
            .unwrap();
        assert_eq!(out.len(), 1);
    }
}
