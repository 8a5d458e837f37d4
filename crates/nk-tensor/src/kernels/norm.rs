//! Inference-mode batch normalisation.

use super::check_len;
use crate::error::{Result, TensorError};

/// Variance epsilon used by both batchnorm variants.
pub const BATCHNORM_EPS: f32 = 1e-5;

#[inline]
fn normalize(x: f32, gamma: f32, beta: f32, mean: f32, var: f32) -> f32 {
    gamma * (x - mean) / (var + BATCHNORM_EPS).sqrt() + beta
}

/// Element-wise batchnorm: every statistic buffer has the length of `x`.
pub fn batchnorm2d(
    x: &[f32],
    gamma: &[f32],
    beta: &[f32],
    mean: &[f32],
    var: &[f32],
    y: &mut [f32],
) -> Result<()> {
    let n = x.len();
    check_len("batchnorm2d", "gamma", n, gamma.len())?;
    check_len("batchnorm2d", "beta", n, beta.len())?;
    check_len("batchnorm2d", "mean", n, mean.len())?;
    check_len("batchnorm2d", "var", n, var.len())?;
    check_len("batchnorm2d", "y", n, y.len())?;
    for i in 0..n {
        y[i] = normalize(x[i], gamma[i], beta[i], mean[i], var[i]);
    }
    Ok(())
}

/// Per-channel batchnorm over NHWC data: the statistics have length
/// `channels` and broadcast over every pixel.
pub fn batchnorm2d_nhwc(
    x: &[f32],
    gamma: &[f32],
    beta: &[f32],
    mean: &[f32],
    var: &[f32],
    y: &mut [f32],
    channels: usize,
) -> Result<()> {
    check_len("batchnorm2d_nhwc", "gamma", channels, gamma.len())?;
    check_len("batchnorm2d_nhwc", "beta", channels, beta.len())?;
    check_len("batchnorm2d_nhwc", "mean", channels, mean.len())?;
    check_len("batchnorm2d_nhwc", "var", channels, var.len())?;
    check_len("batchnorm2d_nhwc", "y", x.len(), y.len())?;
    if x.is_empty() {
        return Ok(());
    }
    if channels == 0 || x.len() % channels != 0 {
        return Err(TensorError::InvalidParameter {
            op: "batchnorm2d_nhwc",
            reason: format!("input length {} is not a multiple of {channels} channels", x.len()),
        });
    }
    for (xs, ys) in x.chunks_exact(channels).zip(y.chunks_exact_mut(channels)) {
        for c in 0..channels {
            ys[c] = normalize(xs[c], gamma[c], beta[c], mean[c], var[c]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_batchnorm_flat() {
        let x = [1.0f32, 2.0, 3.0];
        let mut y = [0.0f32; 3];
        batchnorm2d(&x, &[2.0; 3], &[0.5; 3], &[2.0; 3], &[4.0; 3], &mut y).unwrap();
        let s = (4.0f32 + BATCHNORM_EPS).sqrt();
        assert_abs_diff_eq!(y[0], 2.0 * -1.0 / s + 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(y[1], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(y[2], 2.0 / s + 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_batchnorm_zero_variance_uses_eps() {
        let mut y = [0.0f32; 1];
        batchnorm2d(&[1.0], &[1.0], &[0.0], &[0.0], &[0.0], &mut y).unwrap();
        assert_abs_diff_eq!(y[0], 1.0 / BATCHNORM_EPS.sqrt(), epsilon = 1e-2);
        assert!(y[0].is_finite());
    }

    #[test]
    fn test_batchnorm_nhwc_channels() {
        // two pixels, two channels
        let x = [1.0f32, 10.0, 3.0, 30.0];
        let mut y = [0.0f32; 4];
        batchnorm2d_nhwc(&x, &[1.0, 1.0], &[0.0, 1.0], &[2.0, 20.0], &[1.0, 100.0], &mut y, 2).unwrap();
        assert_abs_diff_eq!(y[0], -1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y[1], 0.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y[2], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(y[3], 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_batchnorm_length_checks() {
        let mut y = [0.0f32; 3];
        assert!(batchnorm2d(&[0.0; 3], &[1.0; 2], &[0.0; 3], &[0.0; 3], &[1.0; 3], &mut y).is_err());
        assert!(batchnorm2d_nhwc(&[0.0; 3], &[1.0; 2], &[0.0; 2], &[0.0; 2], &[1.0; 2], &mut y, 2).is_err());
    }
}
