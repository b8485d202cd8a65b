//! Performance benchmarks for longform-tts
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use longform_tts::config::AudioSettings;
use longform_tts::{
    AudioConcatenator, ChunkingStats, ConcatOptions, EpisodeSegmenter, ProviderKind, VoiceConfig,
    chunk_for_provider, chunk_text, normalize,
};

const PARAGRAPH: &str = "The keeper climbed the spiral stairs at dusk, as he had every night \
for thirty years. Mr. Hale never missed an evening; the lamp was lit at 6:45 p.m. sharp! \
Below, the sea argued with the rocks, and the gulls wheeled over the harbor.";

/// Story text of roughly `chars` characters, split into paragraphs.
fn story(chars: usize) -> String {
    let mut text = String::with_capacity(chars + PARAGRAPH.len());
    let mut n = 0;
    while text.len() < chars {
        if n > 0 {
            text.push_str(if n % 12 == 0 { "\n\n---\n\n" } else { "\n\n" });
        }
        text.push_str(PARAGRAPH);
        n += 1;
    }
    text
}

/// Benchmark chunking at provider-sized budgets
fn bench_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");
    group.measurement_time(Duration::from_secs(5));

    for size in [4_000usize, 40_000, 400_000] {
        let text = story(size);
        group.throughput(Throughput::Bytes(text.len() as u64));

        group.bench_with_input(BenchmarkId::new("google_4000", size), &text, |b, text| {
            b.iter(|| chunk_text(black_box(text), 4000, 0));
        });

        group.bench_with_input(BenchmarkId::new("with_overlap", size), &text, |b, text| {
            b.iter(|| chunk_text(black_box(text), 4000, 200));
        });

        group.bench_with_input(BenchmarkId::new("openai_default", size), &text, |b, text| {
            b.iter(|| chunk_for_provider(black_box(text), ProviderKind::OpenAI));
        });
    }

    // Tight budgets produce many chunks and exercise sentence splitting
    let text = story(40_000);
    group.bench_function("tight_budget_300", |b| {
        b.iter(|| chunk_text(black_box(&text), 300, 0));
    });

    group.finish();
}

/// Benchmark whitespace normalization and chunk statistics
fn bench_text_preparation(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_preparation");

    let messy = story(100_000).replace(". ", ".   \t ").replace("\n\n", "\r\n\r\n\r\n");
    group.throughput(Throughput::Bytes(messy.len() as u64));
    group.bench_function("normalize", |b| {
        b.iter(|| normalize(black_box(&messy)));
    });

    let chunks = chunk_text(&story(100_000), 4000, 0);
    group.bench_function("stats", |b| {
        b.iter(|| ChunkingStats::from_chunks(black_box(&chunks)));
    });

    group.finish();
}

/// Benchmark episode segmentation of a novel-length manuscript
fn bench_episodes(c: &mut Criterion) {
    let mut group = c.benchmark_group("episodes");

    let segmenter = EpisodeSegmenter::default();
    let voice = VoiceConfig::new(ProviderKind::Google, "en-US-Neural2-J");

    for size in [50_000usize, 500_000] {
        let text = story(size);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("target_20min", size), &text, |b, text| {
            b.iter(|| segmenter.split_into_episodes(black_box(text), 20.0, &voice));
        });
    }

    group.finish();
}

fn wav_segment(samples: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 24000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("wav writer");
    for i in 0..samples {
        writer
            .write_sample(((i % 200) as i16 - 100) * 50)
            .expect("sample");
    }
    writer.finalize().expect("finalize");
    cursor.into_inner()
}

/// Benchmark in-process WAV splicing (no ffmpeg)
fn bench_wav_splice(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let dir = tempfile::TempDir::new().expect("temp dir");

    let segments: Vec<PathBuf> = (0..10)
        .map(|i| {
            let path = dir.path().join(format!("segment_{i}.wav"));
            std::fs::write(&path, wav_segment(24000 * 5)).expect("write segment");
            path
        })
        .collect();

    let settings = AudioSettings {
        ffmpeg_path: PathBuf::from("/nonexistent/ffmpeg"),
        ..Default::default()
    };
    let concatenator = AudioConcatenator::new(&settings, dir.path());
    let output = dir.path().join("joined.wav");

    let mut group = c.benchmark_group("concatenation");
    group.sample_size(20);
    group.bench_function("wav_splice_10x5s", |b| {
        b.to_async(&runtime).iter(|| async {
            concatenator
                .concatenate(&segments, &output, ConcatOptions::default())
                .await
                .expect("splice")
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_chunking,
    bench_text_preparation,
    bench_episodes,
    bench_wav_splice,
);

criterion_main!(benches);
