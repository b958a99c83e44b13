//! Integration tests for ballast-config: files on disk through to processed audio.

use ballast_config::{
    BandConfig, ChainConfig, CompressorConfig, ConfigError, FileOperation, GainConfig,
    LinkwitzRileyConfig, MixConfig, MixRuleConfig, StageConfig, ValidationError,
};
use ballast_core::AudioBuffer;
use tempfile::TempDir;

fn glue() -> ChainConfig {
    ChainConfig::new("Glue")
        .with_spec(48000.0, 128, 2)
        .with_stage(StageConfig::LinkwitzRiley(LinkwitzRileyConfig {
            cutoff_hz: 120.0,
            band: BandConfig::Highpass,
            bypassed: false,
        }))
        .with_stage(StageConfig::Compressor(CompressorConfig {
            threshold_db: -24.0,
            ratio: 4.0,
            attack_ms: 3.0,
            release_ms: 80.0,
            bypassed: false,
        }))
        .with_stage(StageConfig::Gain(GainConfig {
            gain_db: 6.0,
            ramp_seconds: 0.01,
            bypassed: false,
        }))
        .with_mix(MixConfig {
            rule: MixRuleConfig::Sin3dB,
            wet: 0.5,
            wet_latency_samples: 0.0,
        })
}

#[test]
fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("glue.toml");

    let config = glue();
    config.save(&path).unwrap();
    assert!(path.exists());

    let loaded = ChainConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn load_missing_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.toml");
    let err = ChainConfig::load(&path).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::File {
            operation: FileOperation::Read,
            ..
        }
    ));
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn load_malformed_file_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "name = \"x\"\n[[stages]]\ntype = \"gain\"\ngain_db = \"loud\"\n").unwrap();
    let err = ChainConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert_eq!(err.path(), Some(path.as_path()));
    assert!(err.to_string().contains("bad.toml"), "got: {err}");
}

#[test]
fn build_rejects_invalid_chain_with_every_problem() {
    let mut config = glue();
    config.stages.push(StageConfig::LinkwitzRiley(LinkwitzRileyConfig {
        cutoff_hz: 30000.0,
        ..Default::default()
    }));
    if let Some(mix) = config.mix.as_mut() {
        mix.wet = -0.1;
    }

    match config.build::<f32>() {
        Err(ConfigError::Invalid {
            name,
            source: ValidationError::Multiple(errors),
        }) => {
            assert_eq!(name, "Glue");
            assert_eq!(errors.len(), 2);
        }
        other => panic!("expected multiple validation errors, got {other:?}"),
    }
}

#[test]
fn built_chain_processes_blocks_of_any_size() {
    let mut chain = glue().build::<f32>().unwrap();
    assert_eq!(chain.name(), "Glue");
    assert_eq!(chain.stage_types(), vec!["linkwitz_riley", "compressor", "gain"]);

    let total = 128 * 6;
    let input = AudioBuffer::from_fn(2, total, |ch, i| (i as f32 * 0.031 + ch as f32).sin() * 0.8);

    let mut start = 0;
    for len in [128, 1, 37, 128, 90, 128].into_iter().cycle() {
        if start >= total {
            break;
        }
        let len = len.min(total - start);
        let mut block = AudioBuffer::from_fn(2, len, |ch, i| input.channel(ch)[start + i]);
        chain.process(block.as_block());
        for ch in 0..2 {
            assert!(block.channel(ch).iter().all(|s| s.is_finite() && s.abs() < 4.0));
        }
        start += len;
    }
}

#[test]
fn toml_file_builds_at_both_precisions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chain.toml");
    std::fs::write(
        &path,
        r#"
name = "From Disk"
sample_rate = 44100.0
maximum_block_size = 64
num_channels = 1

[[stages]]
type = "bias"
bias = 0.5

[[stages]]
type = "ballistics"
attack_ms = 0.0
level = "rms"
"#,
    )
    .unwrap();

    let config = ChainConfig::load(&path).unwrap();

    let mut single = config.build::<f32>().unwrap();
    let mut buffer = AudioBuffer::new(1, 64);
    single.process(buffer.as_block());
    assert!((buffer.channel(0)[0] - 0.5).abs() < 1e-6);

    let mut double = config.build::<f64>().unwrap();
    let mut buffer = AudioBuffer::new(1, 64);
    double.process(buffer.as_block());
    assert!((buffer.channel(0)[63] - 0.5).abs() < 1e-12);
}
