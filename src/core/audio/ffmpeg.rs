//! ffmpeg invocation: availability probe, argument builders and a
//! timeout-bounded runner.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::ConcatError;
use crate::core::tts::AudioFormat;

/// Longest stderr excerpt kept in `ToolFailed` errors.
const MAX_STDERR: usize = 1000;

/// Handle on an ffmpeg executable.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    path: PathBuf,
    probe_timeout: Duration,
    run_timeout: Duration,
}

impl Ffmpeg {
    pub fn new(path: impl Into<PathBuf>, probe_timeout: Duration, run_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            probe_timeout,
            run_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `ffmpeg -version` with the probe timeout.
    pub async fn is_available(&self) -> bool {
        let child = Command::new(&self.path)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let Ok(mut child) = child else {
            return false;
        };

        match tokio::time::timeout(self.probe_timeout, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            _ => false,
        }
    }

    /// Run ffmpeg with `args`, bounded by the run timeout.
    pub async fn run(&self, args: &[OsString]) -> Result<(), ConcatError> {
        debug!(ffmpeg = %self.path.display(), args = ?args, "Running ffmpeg");

        let child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true) // Ensure process is killed when the timeout drops it
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConcatError::ToolUnavailable(self.path.display().to_string())
                } else {
                    ConcatError::Io(e)
                }
            })?;

        let output = tokio::time::timeout(self.run_timeout, child.wait_with_output())
            .await
            .map_err(|_| ConcatError::Timeout(self.run_timeout.as_secs()))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let start = stderr.len().saturating_sub(MAX_STDERR);
            let start = (start..stderr.len())
                .find(|&i| stderr.is_char_boundary(i))
                .unwrap_or(stderr.len());
            return Err(ConcatError::ToolFailed {
                code: output.status.code(),
                stderr: stderr[start..].trim().to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Argument builders
// =============================================================================

/// Encoder and whether a bitrate applies, per output format.
pub fn codec_for(format: AudioFormat) -> (&'static str, bool) {
    match format {
        AudioFormat::Mp3 => ("libmp3lame", true),
        AudioFormat::Wav => ("pcm_s16le", false),
        AudioFormat::Flac => ("flac", false),
        AudioFormat::Ogg => ("libopus", true),
    }
}

fn encode_args(format: AudioFormat, bitrate: &str, sample_rate: u32) -> Vec<OsString> {
    let (codec, lossy) = codec_for(format);
    let mut args: Vec<OsString> = vec!["-c:a".into(), codec.into()];
    if lossy {
        args.extend(["-b:a".into(), bitrate.into()]);
    }
    args.extend(["-ar".into(), sample_rate.to_string().into()]);
    args
}

/// Generate `duration` of mono silence.
pub fn silence_args(
    output: &Path,
    duration: Duration,
    format: AudioFormat,
    bitrate: &str,
    sample_rate: u32,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-f".into(),
        "lavfi".into(),
        "-i".into(),
        format!("anullsrc=channel_layout=mono:sample_rate={sample_rate}").into(),
        "-t".into(),
        format!("{:.3}", duration.as_secs_f64()).into(),
    ];
    args.extend(encode_args(format, bitrate, sample_rate));
    args.push(output.into());
    args
}

/// Concatenate the files listed in a concat-demuxer manifest.
pub fn concat_args(
    manifest: &Path,
    output: &Path,
    format: AudioFormat,
    bitrate: &str,
    sample_rate: u32,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        manifest.into(),
    ];
    args.extend(encode_args(format, bitrate, sample_rate));
    args.push(output.into());
    args
}

/// Join `inputs` with a chain of `acrossfade` filters.
pub fn crossfade_args(
    inputs: &[PathBuf],
    output: &Path,
    duration: Duration,
    format: AudioFormat,
    bitrate: &str,
    sample_rate: u32,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into()];
    for input in inputs {
        args.extend(["-i".into(), input.into()]);
    }

    let secs = format!("{:.3}", duration.as_secs_f64());
    let mut filter = String::new();
    let mut previous = "[0:a]".to_string();
    for i in 1..inputs.len() {
        let label = format!("[x{i}]");
        if !filter.is_empty() {
            filter.push(';');
        }
        filter.push_str(&format!(
            "{previous}[{i}:a]acrossfade=d={secs}:c1=tri:c2=tri{label}"
        ));
        previous = label;
    }

    args.extend([
        "-filter_complex".into(),
        filter.into(),
        "-map".into(),
        previous.into(),
    ]);
    args.extend(encode_args(format, bitrate, sample_rate));
    args.push(output.into());
    args
}

/// Concat-demuxer manifest listing `files` in order.
pub fn manifest(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| format!("file '{}'\n", f.display().to_string().replace('\'', r"'\''")))
        .collect()
}
