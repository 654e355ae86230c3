use std::cmp;

use crate::constants::psnr::LOG10_MULTIPLIER;
use ndarray::{s, ArrayView3};

/// Takes two `[3, H, W]` tensors with values in `[0, 1]` and
/// returns the err, y_err and pixel count of the pair.
///
/// Images of different sizes are compared over their overlapping top left area.
pub fn psnr_calculation(image1: ArrayView3<f32>, image2: ArrayView3<f32>) -> (f32, f32, f32) {
	let min_height = cmp::min(image1.shape()[1], image2.shape()[1]);
	let min_width = cmp::min(image1.shape()[2], image2.shape()[2]);

	let image1 = image1.slice(s![0..3, 0..min_height, 0..min_width]);
	let image2 = image2.slice(s![0..3, 0..min_height, 0..min_width]);

	let mut rgb_error = 0.0;
	let mut luma_error = 0.0;
	let mut pixel_count = 0.0f32;

	for y in 0..min_height {
		for x in 0..min_width {
			let r_diff = clamp_pixel(image1[(0, y, x)]) - clamp_pixel(image2[(0, y, x)]);
			let g_diff = clamp_pixel(image1[(1, y, x)]) - clamp_pixel(image2[(1, y, x)]);
			let b_diff = clamp_pixel(image1[(2, y, x)]) - clamp_pixel(image2[(2, y, x)]);

			// BT.601 luma coefficients
			let luma_diff = r_diff * 0.299 + g_diff * 0.587 + b_diff * 0.114;

			luma_error += luma_diff * luma_diff;
			rgb_error += (r_diff * r_diff + g_diff * g_diff + b_diff * b_diff) / 3.0;
			pixel_count += 1.0;
		}
	}

	(rgb_error, luma_error, pixel_count)
}

/// Mean squared error per channel value and the matching sRGB PSNR in dB.
///
/// Identical images give an infinite PSNR.
pub fn mse_and_psnr(image1: ArrayView3<f32>, image2: ArrayView3<f32>) -> (f32, f32) {
	let (err, _, pix) = psnr_calculation(image1, image2);
	let mse = err / pix;
	(mse, to_decibels(mse))
}

pub fn to_decibels(mse: f32) -> f32 {
	LOG10_MULTIPLIER * mse.log10()
}

fn clamp_pixel(value: f32) -> f32 {
	value.max(0.0).min(1.0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use ndarray::Array3;

	#[test]
	fn test_identical_images() {
		let image = Array3::from_elem((3, 4, 4), 0.3f32);
		let (mse, psnr) = mse_and_psnr(image.view(), image.view());
		assert_eq!(mse, 0.0);
		assert!(psnr.is_infinite());
	}

	#[test]
	fn test_known_error() {
		let a = Array3::zeros((3, 2, 2));
		let b = Array3::from_elem((3, 2, 2), 0.1f32);
		let (err, y_err, pix) = psnr_calculation(a.view(), b.view());
		assert_eq!(pix, 4.0);
		assert!((err / pix - 0.01).abs() < 1e-6);
		assert!((y_err / pix - 0.01).abs() < 1e-6);
		assert!((to_decibels(err / pix) - 20.0).abs() < 1e-3);
	}

	#[test]
	fn test_crops_to_overlap() {
		let a = Array3::zeros((3, 4, 6));
		let b = Array3::zeros((3, 2, 8));
		let (_, _, pix) = psnr_calculation(a.view(), b.view());
		assert_eq!(pix, 12.0);
	}
}
