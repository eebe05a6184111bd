//! File round trips through the analyze, pitch and synth commands.

use std::fs;
use std::path::Path;

use cepstra_cli::audio_io::{read_mono_wav, write_mono_wav};
use cepstra_cli::commands::analyze::{self, AnalyzeOptions};
use cepstra_cli::commands::pitch::{self, PitchOptions};
use cepstra_cli::commands::synth::{self, SynthOptions};
use cepstra_cli::commands::{CepstrumFile, PitchTrack};
use cepstra_cli::config::PipelineConfig;
use cepstra_dsp::PitchOutput;

const SAMPLE_RATE: u32 = 16000;

fn write_sawtooth(path: &Path, f0: f64, len: usize) {
    let samples: Vec<f64> = (0..len)
        .map(|n| 0.5 * (2.0 * ((f0 * n as f64 / SAMPLE_RATE as f64) % 1.0) - 1.0))
        .collect();
    write_mono_wav(path, &samples, SAMPLE_RATE).unwrap();
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_analyze_pitch_synth_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.wav");
    let mcep_json = dir.path().join("mcep.json");
    let f0_json = dir.path().join("f0.json");
    let output = dir.path().join("output.wav");
    write_sawtooth(&input, 200.0, 8000);

    let config = PipelineConfig::default();

    analyze::run(
        path_str(&input),
        Some(path_str(&mcep_json)),
        &config,
        &AnalyzeOptions {
            order: Some(16),
            ..AnalyzeOptions::default()
        },
    )
    .unwrap();

    let cepstrum: CepstrumFile =
        serde_json::from_str(&fs::read_to_string(&mcep_json).unwrap()).unwrap();
    assert_eq!(cepstrum.sample_rate, SAMPLE_RATE);
    assert_eq!(cepstrum.order, 16);
    assert_eq!(cepstrum.frames.len(), 101);
    assert!(cepstrum.frames.iter().all(|f| f.coefficients.len() == 17));
    assert_eq!(cepstrum.source_hash.len(), 64);

    pitch::run(
        path_str(&input),
        Some(path_str(&f0_json)),
        &config,
        &PitchOptions::default(),
    )
    .unwrap();
    let track: PitchTrack =
        serde_json::from_str(&fs::read_to_string(&f0_json).unwrap()).unwrap();
    assert_eq!(track.output, PitchOutput::Frequency);
    assert_eq!(track.values.len(), 101);
    let near = track
        .values
        .iter()
        .filter(|&&f| (f - 200.0).abs() < 4.0)
        .count();
    assert!(near >= 90, "{:?}", track.values);

    synth::run(
        path_str(&mcep_json),
        path_str(&f0_json),
        path_str(&output),
        &config,
        &SynthOptions::default(),
    )
    .unwrap();
    let audio = read_mono_wav(&output).unwrap();
    assert_eq!(audio.sample_rate, SAMPLE_RATE);
    assert_eq!(audio.samples.len(), 8000);
    assert!(audio.samples.iter().any(|&s| s != 0.0));
}

#[test]
fn test_synth_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.wav");
    let mcep_json = dir.path().join("mcep.json");
    let f0_json = dir.path().join("f0.json");
    write_sawtooth(&input, 150.0, 4000);

    let config = PipelineConfig::from_json(r#"{"estimator": {"order": 12}}"#).unwrap();
    analyze::run(
        path_str(&input),
        Some(path_str(&mcep_json)),
        &config,
        &AnalyzeOptions::default(),
    )
    .unwrap();
    pitch::run(
        path_str(&input),
        Some(path_str(&f0_json)),
        &config,
        &PitchOptions {
            format: Some("period".to_string()),
            ..PitchOptions::default()
        },
    )
    .unwrap();

    let render = |name: &str, options: &SynthOptions| {
        let out = dir.path().join(name);
        synth::run(
            path_str(&mcep_json),
            path_str(&f0_json),
            path_str(&out),
            &config,
            options,
        )
        .unwrap();
        fs::read(out).unwrap()
    };

    let first = render("a.wav", &SynthOptions::default());
    let second = render("b.wav", &SynthOptions::default());
    assert_eq!(first, second);

    let transposed = render(
        "c.wav",
        &SynthOptions {
            transposed: true,
            ..SynthOptions::default()
        },
    );
    assert_eq!(first.len(), transposed.len());
}

#[test]
fn test_stereo_input_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("stereo.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&input, spec).unwrap();
    for n in 0..1600 {
        writer.write_sample((n % 100) as i16).unwrap();
    }
    writer.finalize().unwrap();

    let err = analyze::run(
        path_str(&input),
        None,
        &PipelineConfig::default(),
        &AnalyzeOptions::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("only mono"), "{}", err);
}

#[test]
fn test_invalid_overrides_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.wav");
    write_sawtooth(&input, 200.0, 1600);

    let err = analyze::run(
        path_str(&input),
        None,
        &PipelineConfig::default(),
        &AnalyzeOptions {
            order: Some(200),
            ..AnalyzeOptions::default()
        },
    )
    .unwrap_err();
    assert!(err.to_string().contains("invalid order"), "{}", err);
}
