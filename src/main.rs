use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;

use longform_tts::{
    AudioFormat, AudioPipeline, ChunkingStats, ConcatOptions, EpisodeSegmenter, JobId,
    PipelineConfig, ProviderKind, ProviderRegistry, VoiceConfig, chunk_text,
    core::tts::{default_voice, voice_catalog},
};

/// Long-form narration synthesis
#[derive(Parser, Debug)]
#[command(name = "longform-tts")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize a text file into one audio file
    Synthesize {
        /// Text file to narrate ("-" reads stdin)
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Audio file to write; its extension selects the format
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Provider (google, openai); defaults to the configured provider
        #[arg(short = 'p', long = "provider")]
        provider: Option<String>,

        /// Voice id or narrator alias; defaults to the provider's default voice
        #[arg(short = 'v', long = "voice")]
        voice: Option<String>,

        #[arg(long = "speed", default_value_t = 1.0)]
        speed: f32,

        /// OpenAI model override (tts-1, tts-1-hd, gpt-4o-mini-tts)
        #[arg(long = "model")]
        model: Option<String>,

        #[arg(long = "job-id")]
        job_id: Option<String>,

        /// Join chunks without silence between them
        #[arg(long = "no-pauses")]
        no_pauses: bool,

        /// Crossfade chunks (only without pauses)
        #[arg(long = "crossfade")]
        crossfade: bool,
    },

    /// Print the chunks a text would be split into
    Chunk {
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Character budget; defaults to the provider's limit
        #[arg(long = "max-chars")]
        max_chars: Option<usize>,

        #[arg(short = 'p', long = "provider")]
        provider: Option<String>,

        #[arg(long = "overlap", default_value_t = 0)]
        overlap: usize,

        /// Print statistics instead of the chunks
        #[arg(long = "stats")]
        stats: bool,
    },

    /// Split a text into episodes of a target duration
    Episodes {
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        #[arg(short = 't', long = "target-minutes", default_value_t = 10.0)]
        target_minutes: f64,

        #[arg(long = "speed", default_value_t = 1.0)]
        speed: f32,
    },

    /// List voices
    Voices {
        /// Only this provider
        #[arg(short = 'p', long = "provider")]
        provider: Option<String>,
    },

    /// Estimate the cost of a text on every configured provider
    Estimate {
        #[arg(short = 'i', long = "input")]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = if let Some(config_path) = &cli.config {
        info!("Loading configuration from {}", config_path.display());
        PipelineConfig::from_file(config_path).map_err(|e| anyhow!(e.to_string()))?
    } else {
        PipelineConfig::from_env().map_err(|e| anyhow!(e.to_string()))?
    };

    match cli.command {
        Commands::Synthesize {
            input,
            output,
            provider,
            voice,
            speed,
            model,
            job_id,
            no_pauses,
            crossfade,
        } => {
            let text = read_input(&input)?;
            let kind = resolve_provider(provider.as_deref(), &config)?;

            let mut voice_config =
                VoiceConfig::new(kind, voice.unwrap_or_else(|| default_voice(kind).to_string()));
            voice_config.speed = speed;
            voice_config.audio_format = AudioFormat::from_path(&output).unwrap_or_default();
            if let Some(model) = model {
                voice_config
                    .extra_params
                    .insert("model".to_string(), serde_json::Value::String(model));
            }

            let pipeline = AudioPipeline::new(ProviderRegistry::from_config(&config), &config)
                .with_concat_options(ConcatOptions {
                    add_pauses: !no_pauses,
                    crossfade,
                });

            let result = pipeline
                .generate_audio(&text, &voice_config, &output, job_id.map(JobId::new))
                .await;
            println!("{}", serde_json::to_string_pretty(&result)?);

            if !result.success {
                anyhow::bail!(
                    "Synthesis failed: {}",
                    result.error_message.unwrap_or_default()
                );
            }
        }

        Commands::Chunk {
            input,
            max_chars,
            provider,
            overlap,
            stats,
        } => {
            let text = read_input(&input)?;
            let kind = resolve_provider(provider.as_deref(), &config)?;
            let max_chars = max_chars.unwrap_or_else(|| kind.default_max_characters());

            let chunks = chunk_text(&text, max_chars, overlap);
            if stats {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ChunkingStats::from_chunks(&chunks))?
                );
            } else {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            }
        }

        Commands::Episodes {
            input,
            target_minutes,
            speed,
        } => {
            let text = read_input(&input)?;
            let kind = config.default_provider;
            let mut voice_config = VoiceConfig::new(kind, default_voice(kind));
            voice_config.speed = speed;

            let episodes = EpisodeSegmenter::new(config.words_per_minute).split_into_episodes(
                &text,
                target_minutes,
                &voice_config,
            );
            println!("{}", serde_json::to_string_pretty(&episodes)?);
        }

        Commands::Voices { provider } => {
            let kinds = match provider.as_deref() {
                Some(name) => vec![name.parse::<ProviderKind>()?],
                None => ProviderKind::all().to_vec(),
            };
            for kind in kinds {
                println!("{kind}:");
                for voice in voice_catalog(kind) {
                    println!("  {voice}");
                }
            }
        }

        Commands::Estimate { input } => {
            let text = read_input(&input)?;
            let pipeline = AudioPipeline::new(ProviderRegistry::from_config(&config), &config);
            let costs = pipeline.estimate_costs_all_providers(&text);
            if costs.is_empty() {
                anyhow::bail!("No provider configured; set OPENAI_API_KEY or GOOGLE_TTS_API_KEY");
            }
            println!("{}", serde_json::to_string_pretty(&costs)?);
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn resolve_provider(name: Option<&str>, config: &PipelineConfig) -> anyhow::Result<ProviderKind> {
    match name {
        Some(name) => Ok(name.parse::<ProviderKind>()?),
        None => Ok(config.default_provider),
    }
}
