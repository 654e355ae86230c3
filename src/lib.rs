extern crate alumina;
extern crate candle;
extern crate candle_nn;
extern crate clap;
extern crate image;
extern crate rand;
extern crate ndarray;
#[macro_use]
extern crate serde_derive;
extern crate bincode;
extern crate byteorder;
extern crate serde;
extern crate xz2;

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_file;
pub mod constants;
pub mod device;
pub mod error;
pub mod image_io;
pub mod inference;
pub mod logging;
pub mod network;
pub mod psnr;
pub mod tensor;
pub mod training;
pub mod transform;
pub mod utils;
pub mod validation;

use std::{io::Read, num::FpCategory};

use bincode::{deserialize, serialize};
use byteorder::{BigEndian, ByteOrder};
use ndarray::ArrayD;
use xz2::read::{XzDecoder, XzEncoder};

pub use crate::device::{ComputeBackend, ComputeContext};
pub use crate::error::{ReflectionError, Result};
pub use crate::network::{EncoderDecoder, Mode, Stage};

use crate::constants::quantization::{QUANTIZE_MASK_HIGH, QUANTIZE_MASK_LOW};

/// The parameters, normalization buffers and topology of one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDescription {
	pub stage: Stage,
	pub base_width: u32,
	pub batch_norm: bool,
	pub parameters: Vec<ArrayD<f32>>,
	pub buffers: Vec<ArrayD<f32>>,
}

/// Decompresses and deserialises a NetworkDescription from the checkpoint byte format.
pub fn network_from_bytes(data: &[u8]) -> Result<NetworkDescription> {
	let decompressed = XzDecoder::new(data)
		.bytes()
		.collect::<::std::result::Result<Vec<_>, _>>()
		.map_err(|e| ReflectionError::Serialization(format!("Checkpoint decompression failed: {}", e)))?;
	let unshuffled = unshuffle(&decompressed, 4);
	deserialize(&unshuffled)
		.map_err(|e| ReflectionError::Serialization(format!("NetworkDescription decoding failed: {}", e)))
}

/// Serialises and compresses the NetworkDescription into the checkpoint byte format.
/// If quantise = true, then the least significant 12 bits are zeroed to improve compression.
pub fn network_to_bytes(mut desc: NetworkDescription, quantise: bool) -> Result<Vec<u8>> {
	for arr in desc.parameters.iter_mut().chain(desc.buffers.iter_mut()) {
		for e in arr.iter_mut() {
			if quantise {
				if let FpCategory::Subnormal = e.classify() {
					*e = 0.0;
				}
				let mut bytes = [0; 4];
				BigEndian::write_f32(&mut bytes, *e);
				bytes[2] &= QUANTIZE_MASK_HIGH;
				bytes[3] &= QUANTIZE_MASK_LOW;
				*e = BigEndian::read_f32(&bytes);
			}
		}
	}

	let serialized: Vec<u8> = serialize(&desc)
		.map_err(|e| ReflectionError::Serialization(format!("NetworkDescription encoding failed: {}", e)))?;
	let shuffled = shuffle(&serialized, 4);
	XzEncoder::new(shuffled.as_slice(), 7)
		.bytes()
		.collect::<::std::result::Result<Vec<_>, _>>()
		.map_err(|e| ReflectionError::Serialization(format!("Checkpoint compression failed: {}", e)))
}

/// Shuffle f32 bytes so that all first bytes are contiguous etc
/// Improves compression of floating point data
fn shuffle(data: &[u8], stride: usize) -> Vec<u8> {
	let mut vec = Vec::with_capacity(data.len());
	for offset in 0..stride {
		for i in 0..(data.len() + stride - 1 - offset) / stride {
			vec.push(data[offset + i * stride])
		}
	}
	debug_assert_eq!(vec.len(), data.len());
	vec
}

/// Inverts `shuffle()`
fn unshuffle(data: &[u8], stride: usize) -> Vec<u8> {
	let mut vec = vec![0; data.len()];
	let mut inc = 0;
	for offset in 0..stride {
		for i in 0..(data.len() + stride - 1 - offset) / stride {
			vec[offset + i * stride] = data[inc];
			inc += 1;
		}
	}
	debug_assert_eq!(inc, data.len());
	vec
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_shuffle_round_trip() {
		for len in 0..11 {
			let data: Vec<u8> = (0..len as u8).collect();
			assert_eq!(unshuffle(&shuffle(&data, 4), 4), data);
		}
	}

	#[test]
	fn test_quantise_zeroes_low_bits() {
		let desc = NetworkDescription {
			stage: Stage::Refinement,
			base_width: 1,
			batch_norm: false,
			parameters: vec![ArrayD::from_elem(ndarray::IxDyn(&[2]), 0.123_456_79)],
			buffers: Vec::new(),
		};
		let bytes = network_to_bytes(desc, true).unwrap();
		let decoded = network_from_bytes(&bytes).unwrap();
		let value = decoded.parameters[0].as_slice().unwrap()[0];
		assert_eq!(value.to_bits() & 0xFFF, 0);
		assert!((value - 0.123_456_79).abs() < 1e-3);
	}

	#[test]
	fn test_subnormals_kept_unless_quantised() {
		let tiny = f32::from_bits(1);
		assert_eq!(tiny.classify(), FpCategory::Subnormal);
		let desc = NetworkDescription {
			stage: Stage::Coarse,
			base_width: 1,
			batch_norm: false,
			parameters: vec![ArrayD::from_elem(ndarray::IxDyn(&[3]), tiny)],
			buffers: Vec::new(),
		};

		let exact = network_from_bytes(&network_to_bytes(desc.clone(), false).unwrap()).unwrap();
		assert!(exact.parameters[0].iter().all(|v| v.to_bits() == tiny.to_bits()));

		let quantised = network_from_bytes(&network_to_bytes(desc, true).unwrap()).unwrap();
		assert!(quantised.parameters[0].iter().all(|v| *v == 0.0));
	}
}
