use std::f64::consts::PI;

use crate::audio::Stereo;
use crate::engine::Device;

/// Second-order low-pass (RBJ cookbook coefficients), one state pair per
/// channel. The master chain runs every mixed block through one of these.
pub struct LowPass {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: Stereo,
    x2: Stereo,
    y1: Stereo,
    y2: Stereo,
}

impl LowPass {
    pub fn new(cutoff_hz: f64, sample_rate: f64) -> Self {
        const Q: f64 = std::f64::consts::FRAC_1_SQRT_2; // Butterworth

        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let alpha = w0.sin() / (2.0 * Q);
        let cos_w0 = w0.cos();

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: Stereo::ZERO,
            x2: Stereo::ZERO,
            y1: Stereo::ZERO,
            y2: Stereo::ZERO,
        }
    }
}

impl Device for LowPass {
    fn render(&mut self, buffer: &mut [Stereo]) {
        let (b0, b1, b2, a1, a2) = (
            self.b0 as f32,
            self.b1 as f32,
            self.b2 as f32,
            self.a1 as f32,
            self.a2 as f32,
        );
        for frame in buffer.iter_mut() {
            let x = *frame;
            let y = x * b0 + self.x1 * b1 + self.x2 * b2 - self.y1 * a1 - self.y2 * a2;
            self.x2 = self.x1;
            self.x1 = x;
            self.y2 = self.y1;
            self.y1 = y;
            *frame = y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc() {
        let mut filter = LowPass::new(1000.0, 44100.0);
        let mut buf = vec![Stereo::splat(1.0); 4096];
        filter.render(&mut buf);
        let settled = buf.last().unwrap().channel(0);
        assert!((settled - 1.0).abs() < 1e-3, "expected ~1.0, got {settled}");
    }

    #[test]
    fn attenuates_high_frequencies() {
        let mut filter = LowPass::new(1000.0, 44100.0);
        let mut buf: Vec<Stereo> = (0..4410)
            .map(|i| {
                let t = i as f64 / 44100.0;
                Stereo::splat((2.0 * PI * 15_000.0 * t).sin() as f32)
            })
            .collect();
        filter.render(&mut buf);
        let peak = buf[1000..]
            .iter()
            .map(|f| f.channel(0).abs())
            .fold(0.0f32, f32::max);
        assert!(peak < 0.02, "15kHz should be attenuated, peak was {peak}");
    }

    #[test]
    fn output_stays_finite() {
        let mut filter = LowPass::new(1000.0, 44100.0);
        let mut buf: Vec<Stereo> = (0..8192)
            .map(|i| Stereo::splat(if i % 64 == 0 { 1.0 } else { 0.0 }))
            .collect();
        filter.render(&mut buf);
        assert!(buf.iter().all(|f| f.channel(0).is_finite()));
    }
}
