//! Tests for SWIPE' pitch estimation.

use pretty_assertions::assert_eq;

use super::*;

fn sawtooth(f0: f64, sample_rate: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|n| 2.0 * ((f0 * n as f64 / sample_rate) % 1.0) - 1.0)
        .collect()
}

fn fraction_within(track: &[f64], target: f64, tolerance: f64) -> f64 {
    let hits = track
        .iter()
        .filter(|&&f| ((f - target) / target).abs() < tolerance)
        .count();
    hits as f64 / track.len() as f64
}

#[test]
fn test_silence_is_unvoiced() {
    let config = PitchConfig::new(16000);
    let track = swipe(&[0.0; 1600], &config).unwrap();
    assert_eq!(track.len(), 21);
    assert!(track.iter().all(|&f| f == 0.0));

    let config = PitchConfig {
        output: PitchOutput::LogFrequency,
        ..PitchConfig::new(16000)
    };
    let track = swipe(&[0.0; 1600], &config).unwrap();
    assert!(track.iter().all(|&f| f == UNVOICED_LOG_F0));
}

#[test]
fn test_sawtooth_200hz() {
    let signal = sawtooth(200.0, 16000.0, 8000);
    let track = swipe(&signal, &PitchConfig::new(16000)).unwrap();
    assert_eq!(track.len(), 101);
    let fraction = fraction_within(&track, 200.0, 0.02);
    assert!(fraction >= 0.9, "only {:.0}% of frames near 200 Hz", fraction * 100.0);
}

#[test]
fn test_sawtooth_120hz() {
    let signal = sawtooth(120.0, 16000.0, 8000);
    let track = swipe(&signal, &PitchConfig::new(16000)).unwrap();
    assert!(fraction_within(&track, 120.0, 0.02) >= 0.9);
}

#[test]
fn test_output_encodings() {
    let signal = sawtooth(200.0, 16000.0, 4000);
    let base = PitchConfig::new(16000);
    let hz = swipe(&signal, &base).unwrap();
    let period = swipe(
        &signal,
        &PitchConfig {
            output: PitchOutput::Period,
            ..base.clone()
        },
    )
    .unwrap();
    let log = swipe(
        &signal,
        &PitchConfig {
            output: PitchOutput::LogFrequency,
            ..base
        },
    )
    .unwrap();

    for ((f, p), l) in hz.iter().zip(&period).zip(&log) {
        if *f > 0.0 {
            assert!((p - 16000.0 / f).abs() < 1e-9);
            assert!((l - f.ln()).abs() < 1e-12);
        } else {
            assert_eq!(*p, 0.0);
            assert_eq!(*l, UNVOICED_LOG_F0);
        }
    }
}

#[test]
fn test_frame_count() {
    let config = PitchConfig::new(16000);
    for len in [1, 79, 80, 81, 400] {
        let track = swipe(&vec![0.0; len], &config).unwrap();
        assert_eq!(track.len(), len / 80 + 1);
    }
    assert_eq!(swipe(&[], &config).unwrap(), vec![0.0]);
}

#[test]
fn test_ceiling_above_nyquist_is_clamped() {
    let config = PitchConfig {
        frame_shift: 40,
        max_hz: 5000.0,
        ..PitchConfig::new(8000)
    };
    let signal = sawtooth(200.0, 8000.0, 2000);
    let track = swipe(&signal, &config).unwrap();
    assert_eq!(track.len(), 51);
    assert!(fraction_within(&track, 200.0, 0.02) >= 0.9);
}

#[test]
fn test_threshold_one_is_always_unvoiced() {
    let config = PitchConfig {
        voicing_threshold: 1.0,
        ..PitchConfig::new(16000)
    };
    let track = swipe(&sawtooth(200.0, 16000.0, 2000), &config).unwrap();
    assert!(track.iter().all(|&f| f == 0.0));
}

#[test]
fn test_config_validation() {
    let ok = PitchConfig::new(16000);
    assert!(ok.validate().is_ok());

    let cases = [
        PitchConfig {
            sample_rate: 0,
            ..ok.clone()
        },
        PitchConfig {
            frame_shift: 0,
            ..ok.clone()
        },
        PitchConfig {
            min_hz: 0.0,
            ..ok.clone()
        },
        PitchConfig {
            max_hz: 40.0,
            ..ok.clone()
        },
        PitchConfig {
            voicing_threshold: 1.5,
            ..ok.clone()
        },
    ];
    for config in cases {
        assert!(
            matches!(config.validate(), Err(DspError::InvalidParameter { .. })),
            "{:?}",
            config
        );
    }

    let narrow = PitchConfig {
        min_hz: 100.0,
        max_hz: 101.0,
        ..ok
    };
    let err = swipe(&[0.0; 100], &narrow).unwrap_err();
    assert!(err.to_string().contains("too narrow"), "{}", err);
}

#[test]
fn test_config_serde_defaults() {
    let config: PitchConfig = serde_json::from_str(r#"{"sample_rate": 48000}"#).unwrap();
    assert_eq!(config.sample_rate, 48000);
    assert_eq!(config.frame_shift, 80);
    assert_eq!(config.min_hz, 50.0);
    assert_eq!(config.max_hz, 800.0);
    assert_eq!(config.output, PitchOutput::Frequency);

    let config: PitchConfig = serde_json::from_str(r#"{"output": "log_frequency"}"#).unwrap();
    assert_eq!(config.output, PitchOutput::LogFrequency);
    assert!(serde_json::from_str::<PitchConfig>(r#"{"rate": 1}"#).is_err());
}

#[test]
fn test_erb_conversions_invert() {
    for hz in [12.5, 100.0, 1000.0, 8000.0] {
        assert!((erb_to_hz(hz_to_erb(hz)) - hz).abs() < 1e-9 * hz);
    }
}

#[test]
fn test_grid_window_sizes() {
    let grid = Grid::new(16000.0, 50.0, 800.0).unwrap();
    assert_eq!(grid.windows, vec![2048, 1024, 512, 256, 128]);
    assert_eq!(grid.pitches.len(), 384);
    assert!((grid.pitches[0] - 50.0).abs() < 1e-9);
    assert_eq!(grid.harmonics[..5], [1, 2, 3, 5, 7]);

    // every candidate is scored by at least one window
    let mut covered = vec![false; grid.pitches.len()];
    for n in 0..grid.windows.len() {
        let (lo, hi) = grid.band(n);
        covered[lo..hi].iter_mut().for_each(|c| *c = true);
    }
    assert!(covered.iter().all(|&c| c));
}
