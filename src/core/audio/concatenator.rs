use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::ffmpeg::{self, Ffmpeg};
use super::splice;
use super::{ConcatError, ConcatMethod, ConcatOptions, ConcatOutcome, ConcatStatus};
use crate::config::{AudioSettings, PipelineConfig};
use crate::core::tts::AudioFormat;

/// Seconds of audio per MiB at 128 kbps.
const SECONDS_PER_MIB: f64 = 60.0;
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

struct Joined {
    method: ConcatMethod,
    status: ConcatStatus,
    segments_processed: usize,
    warning: Option<String>,
}

impl Joined {
    fn complete(method: ConcatMethod, segments_processed: usize) -> Self {
        Self {
            method,
            status: ConcatStatus::Complete,
            segments_processed,
            warning: None,
        }
    }
}

/// Joins ordered audio segments into a single file.
///
/// Scratch files (manifest, silence clip) live in a directory unique to each
/// `concatenate` call under `scratch_dir` and are removed when the call
/// returns, whatever the outcome.
#[derive(Debug)]
pub struct AudioConcatenator {
    ffmpeg: Ffmpeg,
    ffmpeg_available: OnceCell<bool>,
    pause: Duration,
    crossfade: Duration,
    target_bitrate: String,
    target_sample_rate: u32,
    scratch_dir: PathBuf,
}

impl AudioConcatenator {
    pub fn new(settings: &AudioSettings, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: Ffmpeg::new(
                settings.ffmpeg_path.clone(),
                Duration::from_secs(settings.probe_timeout_seconds),
                Duration::from_secs(settings.ffmpeg_timeout_seconds),
            ),
            ffmpeg_available: OnceCell::new(),
            pause: Duration::from_millis(settings.pause_ms),
            crossfade: Duration::from_millis(settings.crossfade_ms),
            target_bitrate: settings.target_bitrate.clone(),
            target_sample_rate: settings.target_sample_rate,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.audio, config.scratch_dir.clone())
    }

    /// Whether ffmpeg answered the version probe. Probed once per concatenator.
    pub async fn ffmpeg_available(&self) -> bool {
        *self
            .ffmpeg_available
            .get_or_init(|| async {
                let available = self.ffmpeg.is_available().await;
                if available {
                    debug!(ffmpeg = %self.ffmpeg.path().display(), "ffmpeg available");
                } else {
                    warn!(ffmpeg = %self.ffmpeg.path().display(), "ffmpeg not available, concatenation will splice in-process");
                }
                available
            })
            .await
    }

    /// Join `segments` in order into `destination`.
    ///
    /// The output must exist and be non-empty, otherwise `EmptyOutput` is
    /// returned whichever path produced it.
    pub async fn concatenate(
        &self,
        segments: &[PathBuf],
        destination: &Path,
        options: ConcatOptions,
    ) -> Result<ConcatOutcome, ConcatError> {
        let Some(first) = segments.first() else {
            return Err(ConcatError::NoInput);
        };

        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let joined = if segments.len() == 1 {
            tokio::fs::copy(first, destination).await?;
            Joined::complete(ConcatMethod::SingleFileCopy, 1)
        } else if self.ffmpeg_available().await {
            match self.join_with_ffmpeg(segments, destination, options).await {
                Ok(()) => Joined::complete(ConcatMethod::Ffmpeg, segments.len()),
                Err(e) => {
                    warn!(error = %e, segments = segments.len(), "ffmpeg concatenation failed, splicing in-process");
                    let mut joined = self.splice(segments, destination, options).await?;
                    let note = format!("ffmpeg failed: {e}");
                    joined.warning = Some(match joined.warning {
                        Some(w) => format!("{note}; {w}"),
                        None => note,
                    });
                    joined
                }
            }
        } else {
            self.splice(segments, destination, options).await?
        };

        let size_bytes = match tokio::fs::metadata(destination).await {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => return Err(ConcatError::EmptyOutput(destination.to_path_buf())),
        };

        if let Some(warning) = &joined.warning {
            warn!(output = %destination.display(), "{warning}");
        }
        info!(
            output = %destination.display(),
            method = %joined.method,
            segments = joined.segments_processed,
            size_bytes,
            "Audio concatenated"
        );

        Ok(ConcatOutcome {
            output: destination.to_path_buf(),
            method: joined.method,
            status: joined.status,
            segments_processed: joined.segments_processed,
            size_bytes,
            warning: joined.warning,
        })
    }

    /// Approximate playing time of the joined output in seconds.
    ///
    /// Assumes roughly one MiB per minute of audio plus one pause between
    /// consecutive segments. Unreadable files count as empty.
    pub fn estimate_duration(&self, segments: &[PathBuf]) -> f64 {
        let audio: f64 = segments
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len() as f64 / BYTES_PER_MIB * SECONDS_PER_MIB)
            .sum();
        let pauses = segments.len().saturating_sub(1) as f64 * self.pause.as_secs_f64();
        audio + pauses
    }

    async fn join_with_ffmpeg(
        &self,
        segments: &[PathBuf],
        destination: &Path,
        options: ConcatOptions,
    ) -> Result<(), ConcatError> {
        let output_format = output_format(segments, destination);

        if options.crossfade && !options.add_pauses && !self.crossfade.is_zero() {
            let args = ffmpeg::crossfade_args(
                segments,
                destination,
                self.crossfade,
                output_format,
                &self.target_bitrate,
                self.target_sample_rate,
            );
            return self.ffmpeg.run(&args).await;
        }

        let scratch = self.scratch().await?;
        let mut files = Vec::with_capacity(segments.len() * 2);

        if options.add_pauses && !self.pause.is_zero() {
            let segment_format = AudioFormat::from_path(&segments[0]).unwrap_or_default();
            let silence = scratch
                .path()
                .join(format!("silence.{}", segment_format.extension()));
            let args = ffmpeg::silence_args(
                &silence,
                self.pause,
                segment_format,
                &self.target_bitrate,
                self.target_sample_rate,
            );
            self.ffmpeg.run(&args).await?;

            for (i, segment) in segments.iter().enumerate() {
                if i > 0 {
                    files.push(silence.clone());
                }
                files.push(std::path::absolute(segment)?);
            }
        } else {
            for segment in segments {
                files.push(std::path::absolute(segment)?);
            }
        }

        let list = scratch.path().join("concat_list.txt");
        tokio::fs::write(&list, ffmpeg::manifest(&files)).await?;

        let args = ffmpeg::concat_args(
            &list,
            destination,
            output_format,
            &self.target_bitrate,
            self.target_sample_rate,
        );
        self.ffmpeg.run(&args).await
    }

    async fn splice(
        &self,
        segments: &[PathBuf],
        destination: &Path,
        options: ConcatOptions,
    ) -> Result<Joined, ConcatError> {
        let format = output_format(segments, destination);
        let uniform = segments
            .iter()
            .all(|s| AudioFormat::from_path(s) == Some(format));
        let pause = if options.add_pauses {
            self.pause
        } else {
            Duration::ZERO
        };
        let segments = segments.to_vec();
        let destination = destination.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let n = segments.len();
            match format {
                AudioFormat::Wav if uniform => {
                    splice::splice_wav(&segments, &destination, pause)?;
                    Ok(Joined::complete(ConcatMethod::StreamSplice, n))
                }
                AudioFormat::Mp3 if uniform => {
                    splice::splice_mp3(&segments, &destination)?;
                    let mut joined = Joined::complete(ConcatMethod::StreamSplice, n);
                    if !pause.is_zero() {
                        joined.warning =
                            Some("Pauses not inserted: MP3 segments spliced without re-encoding".to_string());
                    }
                    Ok(joined)
                }
                _ => {
                    splice::copy_first(&segments, &destination)?;
                    Ok(Joined {
                        method: ConcatMethod::FirstSegmentOnly,
                        status: ConcatStatus::Partial,
                        segments_processed: 1,
                        warning: Some(format!(
                            "Only the first of {n} segments was copied: {format} segments cannot be joined without ffmpeg"
                        )),
                    })
                }
            }
        })
        .await
        .map_err(|e| ConcatError::SpliceFailed(e.to_string()))?
    }

    async fn scratch(&self) -> Result<tempfile::TempDir, ConcatError> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        Ok(tempfile::Builder::new()
            .prefix("concat_")
            .tempdir_in(&self.scratch_dir)?)
    }
}

/// Format of the joined file: the destination's extension, else the first segment's.
fn output_format(segments: &[PathBuf], destination: &Path) -> AudioFormat {
    AudioFormat::from_path(destination)
        .or_else(|| segments.first().and_then(|s| AudioFormat::from_path(s)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn concatenator(scratch: &Path) -> AudioConcatenator {
        let settings = AudioSettings {
            ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
            ..Default::default()
        };
        AudioConcatenator::new(&settings, scratch)
    }

    #[test]
    fn test_output_format() {
        let segs = vec![PathBuf::from("a.wav")];
        assert_eq!(output_format(&segs, Path::new("out.mp3")), AudioFormat::Mp3);
        assert_eq!(output_format(&segs, Path::new("out")), AudioFormat::Wav);
        assert_eq!(output_format(&[], Path::new("out")), AudioFormat::Mp3);
    }

    #[test]
    fn test_estimate_duration() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.mp3");
        std::fs::write(&a, vec![0u8; 1024 * 1024]).unwrap();
        std::fs::write(&b, vec![0u8; 512 * 1024]).unwrap();

        let c = concatenator(dir.path());
        let estimate = c.estimate_duration(&[a, b]);
        assert!((estimate - (60.0 + 30.0 + 0.2)).abs() < 1e-9);
        assert_eq!(c.estimate_duration(&[]), 0.0);
    }

    #[tokio::test]
    async fn test_no_input() {
        let dir = TempDir::new().unwrap();
        let result = concatenator(dir.path())
            .concatenate(&[], &dir.path().join("out.mp3"), ConcatOptions::default())
            .await;
        assert!(matches!(result, Err(ConcatError::NoInput)));
    }

    #[tokio::test]
    async fn test_unsupported_format_is_partial() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.flac");
        let b = dir.path().join("b.flac");
        std::fs::write(&a, b"fLaC-first").unwrap();
        std::fs::write(&b, b"fLaC-second").unwrap();

        let out = dir.path().join("out.flac");
        let outcome = concatenator(dir.path())
            .concatenate(&[a, b], &out, ConcatOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.method, ConcatMethod::FirstSegmentOnly);
        assert_eq!(outcome.status, ConcatStatus::Partial);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.segments_processed, 1);
        assert!(outcome.warning.unwrap().contains("first of 2"));
        assert_eq!(std::fs::read(&out).unwrap(), b"fLaC-first");
    }

    #[tokio::test]
    async fn test_empty_output_is_error() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.mp3");
        std::fs::write(&a, b"").unwrap();
        std::fs::write(&b, b"").unwrap();

        let result = concatenator(dir.path())
            .concatenate(&[a, b], &dir.path().join("out.mp3"), ConcatOptions::default())
            .await;
        assert!(matches!(result, Err(ConcatError::EmptyOutput(_))));
    }

    #[tokio::test]
    async fn test_mp3_splice_warns_about_pauses() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.mp3");
        let b = dir.path().join("b.mp3");
        std::fs::write(&a, [0xFF, 0xFB, 0x01]).unwrap();
        std::fs::write(&b, [0xFF, 0xFB, 0x02]).unwrap();

        let out = dir.path().join("nested").join("out.mp3");
        let outcome = concatenator(dir.path())
            .concatenate(&[a, b], &out, ConcatOptions::default())
            .await
            .unwrap();

        assert_eq!(outcome.method, ConcatMethod::StreamSplice);
        assert!(outcome.is_complete());
        assert_eq!(outcome.size_bytes, 6);
        assert!(outcome.warning.unwrap().contains("Pauses not inserted"));

        let no_pauses = ConcatOptions {
            add_pauses: false,
            crossfade: false,
        };
        let outcome = concatenator(dir.path())
            .concatenate(
                &[dir.path().join("a.mp3"), dir.path().join("b.mp3")],
                &out,
                no_pauses,
            )
            .await
            .unwrap();
        assert!(outcome.warning.is_none());
    }
}
