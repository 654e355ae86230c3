use dereflect_rust::ReflectionError;
use std::io;
use std::path::PathBuf;

#[test]
fn test_error_display() {
    let error = ReflectionError::Configuration("counts differ".into());
    assert_eq!(format!("{}", error), "Configuration error: counts differ");

    let error = ReflectionError::IndexOutOfRange { index: 7, length: 4 };
    assert_eq!(format!("{}", error), "Index 7 out of range for dataset of length 4");

    let error = ReflectionError::FileNotFound(PathBuf::from("/missing/dir"));
    assert_eq!(format!("{}", error), "File not found: /missing/dir");

    let error = ReflectionError::Gradient("loss does not reach the network".into());
    assert_eq!(format!("{}", error), "Gradient error: loss does not reach the network");
}

#[test]
fn test_error_from_tensor_op() {
    let a = candle::Tensor::zeros((2, 3), candle::DType::F32, &candle::Device::Cpu).unwrap();
    let b = candle::Tensor::zeros((4, 5), candle::DType::F32, &candle::Device::Cpu).unwrap();
    let error: ReflectionError = a.add(&b).unwrap_err().into();
    match error {
        ReflectionError::Tensor(_) => assert!(format!("{}", error).starts_with("Tensor error:")),
        other => panic!("Expected Tensor error, got {:?}", other),
    }
}

#[test]
fn test_error_from_io() {
    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
    let error: ReflectionError = io_error.into();
    match error {
        ReflectionError::Io(_) => {}
        other => panic!("Expected IO error, got {:?}", other),
    }
}

#[test]
fn test_error_from_parse() {
    let error: ReflectionError = "abc".parse::<usize>().unwrap_err().into();
    assert!(format!("{}", error).starts_with("Parse error: Failed to parse integer"));

    let error: ReflectionError = "abc".parse::<f32>().unwrap_err().into();
    assert!(format!("{}", error).starts_with("Parse error: Failed to parse float"));
}

#[test]
fn test_error_from_shape() {
    let shape_error = ndarray::Array2::<f32>::from_shape_vec((2, 2), vec![0.0; 3]).unwrap_err();
    let error: ReflectionError = shape_error.into();
    match error {
        ReflectionError::Shape(_) => {}
        other => panic!("Expected Shape error, got {:?}", other),
    }
}

#[test]
fn test_decode_error_names_path() {
    let source = match image::open("/definitely/not/here.png") {
        Err(e) => e,
        Ok(_) => panic!("Opening a missing file should fail"),
    };
    let error = ReflectionError::Decode {
        path: PathBuf::from("bad.png"),
        source,
    };
    assert!(format!("{}", error).starts_with("Could not decode bad.png"));
    assert!(std::error::Error::source(&error).is_some());
}
