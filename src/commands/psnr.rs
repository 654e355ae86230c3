use crate::error::{ReflectionError, Result};
use crate::image_io::{image_to_tensor, ImageIo, PngImageIo};
use crate::psnr::{psnr_calculation, to_decibels};
use clap::ArgMatches;
use std::path::Path;

pub fn psnr(app_m: &ArgMatches) -> Result<()> {
	let image1_path = app_m
		.value_of("IMAGE1")
		.ok_or_else(|| ReflectionError::InvalidParameter("No IMAGE1 file given".to_string()))?;
	let image2_path = app_m
		.value_of("IMAGE2")
		.ok_or_else(|| ReflectionError::InvalidParameter("No IMAGE2 file given".to_string()))?;

	let image1 = image_to_tensor(&PngImageIo.decode(Path::new(image1_path))?)?;
	let image2 = image_to_tensor(&PngImageIo.decode(Path::new(image2_path))?)?;

	if image1.shape() != image2.shape() {
		println!("Image shapes will be cropped to the top left areas which overlap");
	}

	let (err, y_err, pix) = psnr_calculation(image1.view(), image2.view());

	println!(
		"sRGB PSNR: {}\tLuma PSNR:{}",
		to_decibels(err / pix),
		to_decibels(y_err / pix)
	);

	Ok(())
}
