//! In-process joining used when ffmpeg cannot run. Blocking I/O; call from
//! `spawn_blocking`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use hound::{SampleFormat, WavReader, WavWriter};

use super::ConcatError;

const ID3V2_HEADER_LEN: usize = 10;
const ID3V1_TAG_LEN: usize = 128;

/// Sample-exact WAV join with `pause` of silence between segments.
///
/// All segments must share the first segment's channel count, sample rate
/// and sample format.
pub fn splice_wav(inputs: &[PathBuf], output: &Path, pause: Duration) -> Result<(), ConcatError> {
    let Some(first) = inputs.first() else {
        return Err(ConcatError::NoInput);
    };
    let spec = WavReader::open(first)?.spec();
    let pause_frames = spec.sample_rate as u64 * pause.as_millis() as u64 / 1000;

    let mut writer = WavWriter::create(output, spec)?;
    for (i, path) in inputs.iter().enumerate() {
        let mut reader = WavReader::open(path)?;
        if reader.spec() != spec {
            return Err(ConcatError::SpliceFailed(format!(
                "{} has format {:?}, expected {:?}",
                path.display(),
                reader.spec(),
                spec
            )));
        }

        if i > 0 {
            for _ in 0..pause_frames * spec.channels as u64 {
                match spec.sample_format {
                    SampleFormat::Float => writer.write_sample(0.0f32)?,
                    SampleFormat::Int => writer.write_sample(0i32)?,
                }
            }
        }

        match spec.sample_format {
            SampleFormat::Float => {
                for sample in reader.samples::<f32>() {
                    writer.write_sample(sample?)?;
                }
            }
            SampleFormat::Int => {
                for sample in reader.samples::<i32>() {
                    writer.write_sample(sample?)?;
                }
            }
        }
    }
    writer.finalize()?;
    Ok(())
}

/// Byte-level MP3 join without re-encoding.
///
/// Leading ID3v2 tags are kept only on the first segment and trailing ID3v1
/// tags only on the last, so decoders see one continuous frame stream.
pub fn splice_mp3(inputs: &[PathBuf], output: &Path) -> Result<(), ConcatError> {
    if inputs.is_empty() {
        return Err(ConcatError::NoInput);
    }

    let mut out = BufWriter::new(File::create(output)?);
    let last = inputs.len() - 1;
    for (i, path) in inputs.iter().enumerate() {
        let bytes = fs::read(path)?;
        let mut body = bytes.as_slice();
        if i > 0 {
            body = strip_id3v2(body);
        }
        if i < last {
            body = strip_id3v1(body);
        }
        out.write_all(body)?;
    }
    out.flush()?;
    Ok(())
}

/// Copy only the first segment.
pub fn copy_first(inputs: &[PathBuf], output: &Path) -> Result<(), ConcatError> {
    let first = inputs.first().ok_or(ConcatError::NoInput)?;
    fs::copy(first, output)?;
    Ok(())
}

fn strip_id3v2(bytes: &[u8]) -> &[u8] {
    if bytes.len() < ID3V2_HEADER_LEN || !bytes.starts_with(b"ID3") {
        return bytes;
    }
    // Tag size is a 28-bit syncsafe integer excluding header and footer
    let size = bytes[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | (*b & 0x7f) as usize);
    let footer = if bytes[5] & 0x10 != 0 { ID3V2_HEADER_LEN } else { 0 };
    let end = ID3V2_HEADER_LEN + size + footer;
    bytes.get(end..).unwrap_or(&[])
}

fn strip_id3v1(bytes: &[u8]) -> &[u8] {
    if bytes.len() >= ID3V1_TAG_LEN && bytes[bytes.len() - ID3V1_TAG_LEN..].starts_with(b"TAG") {
        &bytes[..bytes.len() - ID3V1_TAG_LEN]
    } else {
        bytes
    }
}
