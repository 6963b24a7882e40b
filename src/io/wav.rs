use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::core::types::{AudioBuffer, Sample};
use crate::error::MorphError;

/// Reads a WAV file from a byte slice.
///
/// Integer PCM of 8 to 32 bits and 32-bit float are accepted and converted to
/// `f32` in [-1, 1).
pub fn read_wav(data: &[u8]) -> Result<AudioBuffer, MorphError> {
    decode(WavReader::new(Cursor::new(data))?)
}

/// Reads a WAV file from disk.
pub fn read_wav_file(path: impl AsRef<Path>) -> Result<AudioBuffer, MorphError> {
    decode(WavReader::open(path)?)
}

fn decode<R: Read>(reader: WavReader<R>) -> Result<AudioBuffer, MorphError> {
    let spec = reader.spec();
    let samples: Vec<Sample> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
        (SampleFormat::Int, bits @ 1..=32) => {
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(MorphError::InvalidFormat(format!(
                "unsupported WAV format: {:?}, {} bits",
                format, bits
            )))
        }
    };
    AudioBuffer::new(samples, spec.channels, spec.sample_rate)
}

/// Encodes an audio buffer as 16-bit PCM WAV.
pub fn write_wav_16bit(buffer: &AudioBuffer) -> Result<Vec<u8>, MorphError> {
    let mut cursor = Cursor::new(Vec::new());
    encode(&mut cursor, buffer, false)?;
    Ok(cursor.into_inner())
}

/// Encodes an audio buffer as 32-bit float WAV.
pub fn write_wav_float(buffer: &AudioBuffer) -> Result<Vec<u8>, MorphError> {
    let mut cursor = Cursor::new(Vec::new());
    encode(&mut cursor, buffer, true)?;
    Ok(cursor.into_inner())
}

/// Writes a WAV file to disk (16-bit PCM).
pub fn write_wav_file_16bit(path: impl AsRef<Path>, buffer: &AudioBuffer) -> Result<(), MorphError> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    encode(file, buffer, false)
}

/// Writes a WAV file to disk (32-bit float).
pub fn write_wav_file_float(path: impl AsRef<Path>, buffer: &AudioBuffer) -> Result<(), MorphError> {
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    encode(file, buffer, true)
}

fn encode<W: Write + Seek>(sink: W, buffer: &AudioBuffer, float: bool) -> Result<(), MorphError> {
    let spec = WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: if float { 32 } else { 16 },
        sample_format: if float {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let mut writer = WavWriter::new(sink, spec)?;
    if float {
        for &sample in &buffer.data {
            writer.write_sample(sample)?;
        }
    } else {
        for &sample in &buffer.data {
            writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_roundtrip_16bit() {
        let original = AudioBuffer::new(vec![0.0, 0.5, -0.5, 1.0, -1.0], 1, 44100).unwrap();
        let wav_data = write_wav_16bit(&original).unwrap();
        let decoded = read_wav(&wav_data).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.data.len(), 5);
        // 16-bit has quantization error
        for (d, o) in decoded.data.iter().zip(original.data.iter()) {
            assert!((d - o).abs() < 0.001, "{} vs {}", d, o);
        }
    }

    #[test]
    fn test_wav_roundtrip_float() {
        let original =
            AudioBuffer::new(vec![0.1, -0.2, 0.3, -0.4, 0.5, -0.6], 2, 48000).unwrap();
        let wav_data = write_wav_float(&original).unwrap();
        let decoded = read_wav(&wav_data).unwrap();
        assert_eq!(decoded.sample_rate, 48000);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.num_frames(), 3);
        assert_eq!(decoded.data, original.data);
    }

    #[test]
    fn test_wav_24bit_input() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(4_194_304i32).unwrap();
            writer.write_sample(-8_388_608i32).unwrap();
            writer.finalize().unwrap();
        }
        let decoded = read_wav(cursor.get_ref()).unwrap();
        assert_eq!(decoded.data, vec![0.5, -1.0]);
    }

    #[test]
    fn test_wav_invalid_data() {
        assert!(matches!(read_wav(&[]), Err(MorphError::Io(_) | MorphError::InvalidFormat(_))));
        assert!(read_wav(b"NOT_RIFF_HEADER_AT_ALL______________________").is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_wav_file("/nonexistent/dir/input.wav").unwrap_err();
        assert!(matches!(err, MorphError::Io(_)));
    }
}
