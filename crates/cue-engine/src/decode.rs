//! Audio file decoding (decode-at-load)
//!
//! WAV goes through hound; everything else is probed and decoded with
//! symphonia (FLAC, MP3, OGG Vorbis, AAC/ALAC, AIFF). Sources are
//! downmixed to stereo f32 at their native sample rate; rate conversion
//! happens in the mixer's per-voice cursor stepping.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::{EngineError, EngineResult};

// ═══════════════════════════════════════════════════════════════════════════════
// DECODED AUDIO
// ═══════════════════════════════════════════════════════════════════════════════

/// Fully decoded source audio: interleaved stereo f32 at the source rate.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved L/R samples
    samples: Vec<f32>,
    /// Source sample rate in Hz
    sample_rate: u32,
}

impl DecodedAudio {
    /// Build from deinterleaved per-channel data. Mono is duplicated to
    /// both sides; sources with more than two channels keep the first two.
    pub(crate) fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        let samples = match channels.len() {
            0 => Vec::new(),
            1 => {
                let mut out = Vec::with_capacity(channels[0].len() * 2);
                for &s in &channels[0] {
                    out.push(s);
                    out.push(s);
                }
                out
            }
            _ => {
                let frames = channels[0].len().min(channels[1].len());
                let mut out = Vec::with_capacity(frames * 2);
                for i in 0..frames {
                    out.push(channels[0][i]);
                    out.push(channels[1][i]);
                }
                out
            }
        };
        Self {
            samples,
            sample_rate,
        }
    }

    /// Build from interleaved data with the given channel count.
    pub(crate) fn from_interleaved(
        interleaved: Vec<f32>,
        num_channels: usize,
        sample_rate: u32,
    ) -> Self {
        let samples = match num_channels {
            0 => Vec::new(),
            1 => {
                let mut out = Vec::with_capacity(interleaved.len() * 2);
                for &s in &interleaved {
                    out.push(s);
                    out.push(s);
                }
                out
            }
            2 => interleaved,
            n => {
                let frames = interleaved.len() / n;
                let mut out = Vec::with_capacity(frames * 2);
                for i in 0..frames {
                    out.push(interleaved[i * n]);
                    out.push(interleaved[i * n + 1]);
                }
                out
            }
        };
        Self {
            samples,
            sample_rate,
        }
    }

    /// Total number of stereo frames.
    pub fn frames(&self) -> u64 {
        (self.samples.len() / 2) as u64
    }

    /// Source sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    #[inline]
    pub(crate) fn frame(&self, index: usize) -> (f32, f32) {
        (self.samples[index * 2], self.samples[index * 2 + 1])
    }

    /// Linear-interpolated sample at a fractional frame cursor.
    /// The cursor must be strictly less than [`DecodedAudio::frames`].
    #[inline]
    pub(crate) fn sample_at(&self, cursor: f64) -> (f32, f32) {
        let frames = (self.samples.len() / 2).max(1);
        let i = (cursor as usize).min(frames - 1);
        let next = if i + 1 < frames { i + 1 } else { i };
        let frac = (cursor - i as f64) as f32;
        let (l0, r0) = self.frame(i);
        let (l1, r1) = self.frame(next);
        (l0 + (l1 - l0) * frac, r0 + (r1 - r0) * frac)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE DECODING
// ═══════════════════════════════════════════════════════════════════════════════

/// Fully decode the asset at `path`.
pub fn decode_file(path: &Path) -> EngineResult<DecodedAudio> {
    if !path.is_file() {
        return Err(EngineError::FileNotFound(path.to_path_buf()));
    }

    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav") || e.eq_ignore_ascii_case("wave"))
        .unwrap_or(false);

    let decoded = if is_wav {
        decode_wav(path)?
    } else {
        decode_with_symphonia(path)?
    };

    if decoded.frames() == 0 {
        return Err(EngineError::InvalidFile(path.to_path_buf()));
    }

    log::debug!(
        "decoded '{}': {} frames @ {} Hz ({:.2}s)",
        path.display(),
        decoded.frames(),
        decoded.sample_rate(),
        decoded.duration()
    );
    Ok(decoded)
}

/// WAV fast path via hound.
fn decode_wav(path: &Path) -> EngineResult<DecodedAudio> {
    let decode_err = |reason: String| EngineError::DecodeError {
        path: path.to_path_buf(),
        reason,
    };

    let reader = hound::WavReader::open(path).map_err(|e| decode_err(e.to_string()))?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    if num_channels == 0 {
        return Err(EngineError::InvalidFile(path.to_path_buf()));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| decode_err(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| decode_err(e.to_string()))?
        }
    };

    Ok(DecodedAudio::from_interleaved(
        interleaved,
        num_channels,
        spec.sample_rate,
    ))
}

/// Everything else: probe the container and decode packet by packet.
fn decode_with_symphonia(path: &Path) -> EngineResult<DecodedAudio> {
    let decode_err = |reason: String| EngineError::DecodeError {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|_| EngineError::FileNotFound(path.to_path_buf()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err(e.to_string()))?;

    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| EngineError::InvalidFile(path.to_path_buf()))?;

    let track_id = track.id;
    let num_channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(e.to_string()))?;

    let mut channels: Vec<Vec<f32>> = vec![Vec::new(); num_channels];

    loop {
        match format_reader.next_packet() {
            Ok(packet) => {
                if packet.track_id() != track_id {
                    continue;
                }
                match decoder.decode(&packet) {
                    Ok(decoded) => copy_audio_buffer(&decoded, &mut channels),
                    // Skip over corrupt packets; keep whatever decodes
                    Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
                    Err(e) => return Err(decode_err(e.to_string())),
                }
            }
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_err(e.to_string())),
        }
    }

    Ok(DecodedAudio::from_channels(channels, sample_rate))
}

/// Append a decoded symphonia buffer onto per-channel f32 vectors.
fn copy_audio_buffer(buffer: &AudioBufferRef, output: &mut [Vec<f32>]) {
    let present = buffer.spec().channels.count();
    match buffer {
        AudioBufferRef::F32(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(buf.chan(ch).iter().copied());
            }
        }
        AudioBufferRef::F64(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(buf.chan(ch).iter().map(|&s| s as f32));
            }
        }
        AudioBufferRef::S8(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(buf.chan(ch).iter().map(|&s| s as f32 / 128.0));
            }
        }
        AudioBufferRef::S16(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(buf.chan(ch).iter().map(|&s| s as f32 / 32768.0));
            }
        }
        AudioBufferRef::S24(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(buf.chan(ch).iter().map(|s| s.0 as f32 / 8_388_608.0));
            }
        }
        AudioBufferRef::S32(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(buf.chan(ch).iter().map(|&s| s as f32 / 2_147_483_648.0));
            }
        }
        AudioBufferRef::U8(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(buf.chan(ch).iter().map(|&s| (s as f32 - 128.0) / 128.0));
            }
        }
        AudioBufferRef::U16(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(buf.chan(ch).iter().map(|&s| (s as f32 - 32768.0) / 32768.0));
            }
        }
        AudioBufferRef::U24(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(
                    buf.chan(ch)
                        .iter()
                        .map(|s| (s.0 as f32 - 8_388_608.0) / 8_388_608.0),
                );
            }
        }
        AudioBufferRef::U32(buf) => {
            for (ch, out_ch) in output.iter_mut().enumerate().take(present) {
                out_ch.extend(
                    buf.chan(ch)
                        .iter()
                        .map(|&s| (s as f64 / 2_147_483_648.0 - 1.0) as f32),
                );
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn write_wav_i16(path: &Path, channels: u16, sample_rate: u32, frames: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in frames {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav_i16(&path, 2, 44_100, &[16384, -16384, 8192, -8192]);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.frames(), 2);
        assert_eq!(audio.sample_rate(), 44_100);

        let (l, r) = audio.frame(0);
        assert_relative_eq!(l, 0.5, epsilon = 1e-3);
        assert_relative_eq!(r, -0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_decode_mono_wav_duplicates_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav_i16(&path, 1, 22_050, &[16384, 0, -16384]);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.frames(), 3);
        assert_eq!(audio.sample_rate(), 22_050);

        let (l, r) = audio.frame(0);
        assert_relative_eq!(l, r);
        assert_relative_eq!(l, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_file(Path::new("/definitely/not/here.wav")).unwrap_err();
        assert!(matches!(err, EngineError::FileNotFound(_)));
    }

    #[test]
    fn test_decode_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"this is not a wav file at all").unwrap();

        let err = decode_file(&path).unwrap_err();
        assert!(matches!(err, EngineError::DecodeError { .. }));
    }

    #[test]
    fn test_from_channels_downmix_keeps_first_two() {
        let audio = DecodedAudio::from_channels(
            vec![vec![0.1, 0.2], vec![0.3, 0.4], vec![0.9, 0.9]],
            48_000,
        );
        assert_eq!(audio.frames(), 2);
        let (l, r) = audio.frame(1);
        assert_relative_eq!(l, 0.2);
        assert_relative_eq!(r, 0.4);
    }

    #[test]
    fn test_sample_at_interpolates() {
        let audio = DecodedAudio::from_channels(vec![vec![0.0, 1.0]], 48_000);
        let (l, r) = audio.sample_at(0.5);
        assert_relative_eq!(l, 0.5);
        assert_relative_eq!(r, 0.5);
    }
}
