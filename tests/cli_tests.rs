
use std::process::Command;
use tempfile::TempDir;
use test_helpers::*;

fn dereflect() -> Command {
    Command::new(env!("CARGO_BIN_EXE_dereflect"))
}

#[test]
fn test_cli_help() {
    let output = dereflect().arg("--help").output().expect("Failed to execute command");
    assert_command_success(&output, "dereflect --help");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_contains(&stdout, "remove reflections", "top level help");
    for subcommand in &["train", "infer", "psnr", "generate-config"] {
        assert_contains(&stdout, subcommand, "subcommand list");
    }
}

#[test]
fn test_subcommand_help() {
    let expectations = [
        ("train", "REFLECTED_FOLDER"),
        ("infer", "CHECKPOINT_FOLDER"),
        ("psnr", "PSNR"),
        ("generate-config", "--format"),
    ];
    for (subcommand, needle) in &expectations {
        let output = dereflect()
            .args(&[*subcommand, "--help"])
            .output()
            .expect("Failed to execute command");
        assert_command_success(&output, subcommand);
        assert_contains(&String::from_utf8_lossy(&output.stdout), needle, subcommand);
    }
}

#[test]
fn test_invalid_command() {
    let output = dereflect().arg("invalid_command").output().expect("Failed to execute command");
    assert_command_failure(&output, "dereflect invalid_command");
}

#[test]
fn test_train_rejects_mismatched_folders() {
    let dir = TempDir::new().unwrap();
    let (reflected, clear) = paired_dirs(dir.path(), 2, 3, 8);
    let out = dir.path().join("out");

    let output = dereflect()
        .arg("train")
        .arg(&reflected)
        .arg(&clear)
        .arg(&out)
        .args(&["--size", "8", "--epochs", "1"])
        .output()
        .expect("Failed to execute command");
    assert_command_failure(&output, "train with mismatched folders");
    assert_contains(&String::from_utf8_lossy(&output.stderr), "Configuration error", "train stderr");
}

#[test]
fn test_train_then_infer() {
    let dir = TempDir::new().unwrap();
    let (reflected, clear) = paired_dirs(dir.path(), 2, 2, 8);
    let checkpoints = dir.path().join("checkpoints");

    let output = dereflect()
        .arg("train")
        .arg(&reflected)
        .arg(&clear)
        .arg(&checkpoints)
        .args(&["--size", "8", "--epochs", "1", "--batch_size", "2", "--width", "4", "--threads", "1"])
        .output()
        .expect("Failed to execute command");
    assert_command_success(&output, "train");
    assert!(checkpoints.join("coarse.ckpt").is_file());
    assert!(checkpoints.join("refine.ckpt").is_file());
    assert!(checkpoints.join("training_report.json").is_file());

    let results = dir.path().join("results");
    let output = dereflect()
        .arg("infer")
        .arg(reflected.join("000.png"))
        .arg(&checkpoints)
        .arg(&results)
        .arg("--compare")
        .arg("--reference")
        .arg(clear.join("000.png"))
        .args(&["--size", "8"])
        .output()
        .expect("Failed to execute command");
    assert_command_success(&output, "infer");
    for name in &["input.png", "coarse.png", "refined.png", "comparison.png"] {
        assert!(results.join(name).is_file(), "{} missing", name);
    }
    assert_contains(&String::from_utf8_lossy(&output.stdout), "refined", "quality report");
}

#[test]
fn test_generate_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let output = dereflect()
        .arg("generate-config")
        .arg(&path)
        .arg("--example")
        .output()
        .expect("Failed to execute command");
    assert_command_success(&output, "generate-config");
    assert!(path.is_file());

    let output = dereflect()
        .arg("generate-config")
        .arg(&path)
        .output()
        .expect("Failed to execute command");
    assert_command_failure(&output, "generate-config without --force");
}

#[test]
fn test_psnr_command() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    write_solid_png(&a, 8, 8, [100, 100, 100]);
    write_solid_png(&b, 8, 8, [110, 110, 110]);

    let output = dereflect().arg("psnr").arg(&a).arg(&b).output().expect("Failed to execute command");
    assert_command_success(&output, "psnr");
    assert_contains(&String::from_utf8_lossy(&output.stdout), "sRGB PSNR", "psnr output");
}
