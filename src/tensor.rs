//! Conversions between the `ndarray` tensors of the data pipeline and the
//! `candle` tensors the networks run on.

use crate::error::{ReflectionError, Result};
use candle::{Device, Tensor};
use ndarray::{Array4, ArrayD, IxDyn};

pub fn from_array4(array: &Array4<f32>, device: &Device) -> Result<Tensor> {
	let data: Vec<f32> = array.iter().cloned().collect();
	Ok(Tensor::from_vec(data, array.dim(), device)?)
}

pub fn to_array4(tensor: &Tensor) -> Result<Array4<f32>> {
	let dims = tensor.dims4()?;
	let data = tensor.flatten_all()?.to_vec1::<f32>()?;
	Ok(Array4::from_shape_vec(dims, data)?)
}

pub fn from_array_dyn(array: &ArrayD<f32>, device: &Device) -> Result<Tensor> {
	let data: Vec<f32> = array.iter().cloned().collect();
	Ok(Tensor::from_vec(data, array.shape(), device)?)
}

pub fn to_array_dyn(tensor: &Tensor) -> Result<ArrayD<f32>> {
	let data = tensor.flatten_all()?.to_vec1::<f32>()?;
	ArrayD::from_shape_vec(IxDyn(tensor.dims()), data).map_err(ReflectionError::from)
}

/// Reads a rank-0 loss.
pub fn scalar(tensor: &Tensor) -> Result<f32> {
	Ok(tensor.to_dtype(candle::DType::F32)?.to_scalar::<f32>()?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_array_layout_survives_conversion() {
		let array = Array4::from_shape_fn((2, 3, 4, 5), |(n, c, h, w)| (n * 1000 + c * 100 + h * 10 + w) as f32);
		let tensor = from_array4(&array, &Device::Cpu).unwrap();
		assert_eq!(tensor.dims(), &[2, 3, 4, 5]);
		let value = tensor.get(1).unwrap().get(2).unwrap().get(3).unwrap().get(4).unwrap();
		assert_eq!(value.to_scalar::<f32>().unwrap(), 1234.0);
		assert_eq!(to_array4(&tensor).unwrap(), array);
	}

	#[test]
	fn test_non_standard_layout_is_copied_in_logical_order() {
		let array = Array4::from_shape_fn((1, 2, 2, 3), |(_, c, h, w)| (c * 100 + h * 10 + w) as f32);
		let transposed = array.clone().reversed_axes();
		let tensor = from_array4(&transposed, &Device::Cpu).unwrap();
		assert_eq!(to_array4(&tensor).unwrap(), transposed);
	}

	#[test]
	fn test_rank_mismatch_is_an_error() {
		let tensor = Tensor::zeros((2, 3), candle::DType::F32, &Device::Cpu).unwrap();
		assert!(to_array4(&tensor).is_err());
		assert_eq!(to_array_dyn(&tensor).unwrap().shape(), &[2, 3]);
	}
}
