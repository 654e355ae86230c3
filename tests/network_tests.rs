use dereflect_rust::config::NetworkConfig;
use dereflect_rust::tensor::to_array4;
use dereflect_rust::{ComputeContext, EncoderDecoder, Mode, ReflectionError, Stage};
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn config(width: usize, batch_norm: bool, seed: u64) -> NetworkConfig {
    NetworkConfig::builder()
        .base_width(width)
        .batch_norm(batch_norm)
        .seed(seed)
        .build()
}

fn random_input(n: usize, size: usize, seed: u64) -> Array4<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array4::from_shape_fn((n, 3, size, size), |_| rng.gen_range(-1.0f32..1.0))
}

#[test]
fn test_full_size_output_shape_and_range() {
    let ctx = ComputeContext::cpu().unwrap();
    let coarse = EncoderDecoder::coarse(&ctx, config(8, true, 1)).unwrap();
    let refine = EncoderDecoder::refinement(&ctx, config(8, false, 1)).unwrap();
    let input = ctx.tensor(&random_input(2, 256, 11)).unwrap();

    let fake = to_array4(&coarse.forward(&input).unwrap().detach()).unwrap();
    assert_eq!(fake.dim(), (2, 3, 256, 256));
    assert!(fake.iter().all(|v| *v >= -1.0 && *v <= 1.0));

    let refined = refine.predict(&fake).unwrap();
    assert_eq!(refined.dim(), (2, 3, 256, 256));
    assert!(refined.iter().all(|v| *v >= -1.0 && *v <= 1.0));
}

#[test]
fn test_same_seed_gives_same_network() {
    let ctx = ComputeContext::cpu().unwrap();
    let a = EncoderDecoder::coarse(&ctx, config(4, true, 7)).unwrap();
    let b = EncoderDecoder::coarse(&ctx, config(4, true, 7)).unwrap();
    let c = EncoderDecoder::coarse(&ctx, config(4, true, 8)).unwrap();

    let input = random_input(1, 8, 3);
    assert_eq!(a.predict(&input).unwrap(), b.predict(&input).unwrap());
    assert_ne!(a.parameter_values().unwrap()[0], c.parameter_values().unwrap()[0]);
}

#[test]
fn test_stages_have_independent_parameters() {
    let ctx = ComputeContext::cpu().unwrap();
    let coarse = EncoderDecoder::coarse(&ctx, config(4, true, 7)).unwrap();
    let refine = EncoderDecoder::refinement(&ctx, config(4, false, 7)).unwrap();

    assert_ne!(coarse.id(), refine.id());
    let (coarse, refine) = (coarse.parameter_values().unwrap(), refine.parameter_values().unwrap());
    assert_eq!(coarse[0].shape(), refine[0].shape());
    assert_ne!(coarse[0], refine[0]);
}

#[test]
fn test_evaluation_mode_keeps_running_statistics() {
    let ctx = ComputeContext::cpu().unwrap();
    let mut net = EncoderDecoder::coarse(&ctx, config(4, true, 2)).unwrap();
    assert_eq!(net.mode(), Mode::Train);

    let initial = net.buffers().unwrap();
    net.forward(&ctx.tensor(&random_input(2, 8, 1)).unwrap()).unwrap();
    let trained = net.buffers().unwrap();
    assert_ne!(initial, trained);

    net.eval();
    assert_eq!(net.mode(), Mode::Eval);
    net.forward(&ctx.tensor(&random_input(2, 8, 2)).unwrap()).unwrap();
    net.predict(&random_input(1, 8, 3)).unwrap();
    assert_eq!(trained, net.buffers().unwrap());

    net.train();
    net.forward(&ctx.tensor(&random_input(2, 8, 4)).unwrap()).unwrap();
    assert_ne!(trained, net.buffers().unwrap());
}

#[test]
fn test_rejects_wrong_channel_count() {
    let ctx = ComputeContext::cpu().unwrap();
    let net = EncoderDecoder::refinement(&ctx, config(4, false, 0)).unwrap();
    let input = Array4::<f32>::zeros((1, 4, 8, 8));
    match net.predict(&input) {
        Err(ReflectionError::Shape(msg)) => assert!(msg.contains("channels")),
        other => panic!("Expected Shape error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_rejects_tensor_of_wrong_rank() {
    let ctx = ComputeContext::cpu().unwrap();
    let net = EncoderDecoder::coarse(&ctx, config(4, true, 0)).unwrap();
    let flat = candle::Tensor::zeros((3, 8, 8), candle::DType::F32, ctx.device()).unwrap();
    match net.infer(&flat) {
        Err(ReflectionError::Shape(_)) => {}
        other => panic!("Expected Shape error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_stage_display() {
    assert_eq!(Stage::Coarse.to_string(), "coarse");
    assert_eq!(Stage::Refinement.to_string(), "refinement");
}
