//! Mono WAV input and 16-bit PCM output.

use std::path::Path;

use anyhow::{bail, Context, Result};

/// A decoded mono signal.
#[derive(Debug, Clone, PartialEq)]
pub struct MonoAudio {
    /// Samples scaled to [-1, 1].
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// Result of writing a WAV file.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenWav {
    /// BLAKE3 hash of the little-endian PCM data.
    pub pcm_hash: String,
    /// Samples clipped to full scale.
    pub clipped: usize,
}

/// Reads a mono WAV file.
///
/// Integer PCM of 8 to 32 bits is scaled by `2^(bits - 1)`; float data is
/// read as is. Files with more than one channel are rejected.
pub fn read_mono_wav(path: &Path) -> Result<MonoAudio> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        bail!(
            "{} has {} channels; only mono input is supported",
            path.display(),
            spec.channels
        );
    }

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>(),
    }
    .with_context(|| format!("Failed to decode samples from {}", path.display()))?;

    Ok(MonoAudio {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Converts samples to 16-bit PCM, clipping to [-1, 1].
///
/// Returns the PCM values and the number of clipped samples.
pub fn samples_to_pcm16(samples: &[f64]) -> (Vec<i16>, usize) {
    let mut clipped = 0;
    let pcm = samples
        .iter()
        .map(|&s| {
            if s.abs() > 1.0 {
                clipped += 1;
            }
            (s.clamp(-1.0, 1.0) * 32767.0).round() as i16
        })
        .collect();
    (pcm, clipped)
}

/// BLAKE3 hash of 16-bit PCM in little-endian byte order.
pub fn pcm_hash(pcm: &[i16]) -> String {
    let bytes: Vec<u8> = pcm.iter().flat_map(|v| v.to_le_bytes()).collect();
    blake3::hash(&bytes).to_hex().to_string()
}

/// Writes samples as a mono 16-bit WAV file.
pub fn write_mono_wav(path: &Path, samples: &[f64], sample_rate: u32) -> Result<WrittenWav> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let (pcm, clipped) = samples_to_pcm16(samples);

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for &v in &pcm {
        writer.write_sample(v)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;

    Ok(WrittenWav {
        pcm_hash: pcm_hash(&pcm),
        clipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pcm16_conversion_clips() {
        let (pcm, clipped) = samples_to_pcm16(&[0.0, 0.5, -1.0, 1.5, -2.0]);
        assert_eq!(pcm, vec![0, 16384, -32767, 32767, -32767]);
        assert_eq!(clipped, 2);
    }

    #[test]
    fn test_pcm_hash_is_stable() {
        let a = pcm_hash(&[1, 2, 3]);
        assert_eq!(a, pcm_hash(&[1, 2, 3]));
        assert_ne!(a, pcm_hash(&[1, 2, 4]));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_wav_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f64> = (0..100).map(|n| 0.5 * (n as f64 * 0.1).sin()).collect();

        let written = write_mono_wav(&path, &samples, 8000).unwrap();
        assert_eq!(written.clipped, 0);

        let audio = read_mono_wav(&path).unwrap();
        assert_eq!(audio.sample_rate, 8000);
        assert_eq!(audio.samples.len(), 100);
        for (got, want) in audio.samples.iter().zip(&samples) {
            assert!((got - want).abs() < 1e-4);
        }
    }

    #[test]
    fn test_stereo_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..8 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let err = read_mono_wav(&path).unwrap_err();
        assert!(err.to_string().contains("only mono"), "{}", err);
    }
}
