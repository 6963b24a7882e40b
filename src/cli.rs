use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use spectral_morph::core::preset::{read_preset_json, write_preset_json};
use spectral_morph::io::wav::{read_wav_file, write_wav_file_16bit, write_wav_file_float};
use spectral_morph::{AudioBuffer, BlendLaw, MorphError, MorphParams, Quality, SpectralMorpher};

/// Morph two WAV files in the frequency domain.
#[derive(Parser, Debug)]
#[command(name = "spectral-morph", version, about)]
struct Args {
    /// Primary input (its layout and sample rate are kept)
    #[arg(value_name = "PRIMARY")]
    primary: PathBuf,

    /// Secondary input, remapped to the primary's channel count
    #[arg(value_name = "SECONDARY")]
    secondary: PathBuf,

    /// Output WAV file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Morph amount: 0 = primary, 1 = secondary
    #[arg(short, long)]
    amount: Option<f32>,

    /// Formant preservation strength in [0, 1]
    #[arg(long)]
    preserve_formants: Option<f32>,

    /// Phase smoothing in [0, 1]
    #[arg(long)]
    smoothing: Option<f32>,

    /// Blend law
    #[arg(short, long, value_enum)]
    law: Option<LawArg>,

    /// Transform length
    #[arg(short, long, value_enum)]
    quality: Option<QualityArg>,

    /// Load parameters from a JSON preset (flags override it)
    #[arg(long, value_name = "FILE")]
    preset: Option<PathBuf>,

    /// Save the effective parameters as a JSON preset
    #[arg(long, value_name = "FILE")]
    save_preset: Option<PathBuf>,

    /// Loop the secondary instead of padding it with silence
    #[arg(long)]
    loop_secondary: bool,

    /// Frames per processing block
    #[arg(long, default_value_t = 512)]
    block_size: usize,

    /// Write 32-bit float instead of 16-bit PCM
    #[arg(long)]
    float: bool,

    /// Verbose logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LawArg {
    Linear,
    MagnitudeOnly,
    Logarithmic,
    Formant,
}

impl From<LawArg> for BlendLaw {
    fn from(arg: LawArg) -> Self {
        match arg {
            LawArg::Linear => BlendLaw::Linear,
            LawArg::MagnitudeOnly => BlendLaw::MagnitudeOnly,
            LawArg::Logarithmic => BlendLaw::Logarithmic,
            LawArg::Formant => BlendLaw::Formant,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum QualityArg {
    Fast,
    Normal,
    High,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Fast => Quality::Fast,
            QualityArg::Normal => Quality::Normal,
            QualityArg::High => Quality::HighQuality,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_params(args: &Args) -> Result<MorphParams, MorphError> {
    let mut params = match &args.preset {
        Some(path) => read_preset_json(path)?,
        None => MorphParams::default(),
    };
    if let Some(amount) = args.amount {
        params = params.with_morph_amount(amount);
    }
    if let Some(strength) = args.preserve_formants {
        params = params.with_preserve_formants(strength);
    }
    if let Some(smoothing) = args.smoothing {
        params = params.with_smoothing(smoothing);
    }
    if let Some(law) = args.law {
        params = params.with_blend_law(law.into());
    }
    if let Some(quality) = args.quality {
        params = params.with_quality(quality.into());
    }
    params.validate()?;
    Ok(params)
}

fn run(args: &Args) -> Result<(), MorphError> {
    let params = resolve_params(args)?;
    if let Some(path) = &args.save_preset {
        write_preset_json(path, &params)?;
        log::info!("preset saved to {}", path.display());
    }

    let primary = read_wav_file(&args.primary)?;
    let secondary = read_wav_file(&args.secondary)?;
    if primary.sample_rate != secondary.sample_rate {
        return Err(MorphError::InvalidFormat(format!(
            "sample rate mismatch: {} Hz vs {} Hz",
            primary.sample_rate, secondary.sample_rate
        )));
    }
    let secondary = secondary.with_channel_count(primary.channels)?;
    log::info!(
        "{}: {} frames, {} ch, {} Hz ({:.2}s)",
        args.primary.display(),
        primary.num_frames(),
        primary.channels,
        primary.sample_rate,
        primary.duration_secs()
    );
    log::info!("parameters: {}", params);

    let data = render(&primary, &secondary, params, args.loop_secondary, args.block_size)?;
    let output = AudioBuffer::new(data, primary.channels, primary.sample_rate)?;

    if args.float {
        write_wav_file_float(&args.output, &output)?;
    } else {
        write_wav_file_16bit(&args.output, &output)?;
    }
    log::info!("written to {}", args.output.display());
    Ok(())
}

/// Streams both files through the engine block by block and compensates the
/// latency so the output lines up with the primary.
fn render(
    primary: &AudioBuffer,
    secondary: &AudioBuffer,
    params: MorphParams,
    loop_secondary: bool,
    block_frames: usize,
) -> Result<Vec<f32>, MorphError> {
    let channels = primary.channels as usize;
    let mut morpher = SpectralMorpher::new(primary.config(), params)?;
    if loop_secondary {
        morpher.set_looped_buffer(secondary.data.clone())?;
    }

    let latency = morpher.latency_samples() * channels;
    let total = primary.data.len() + latency;
    let block = block_frames.max(1) * channels;
    log::debug!(
        "streaming {} frames in blocks of {}, latency {} samples",
        total / channels,
        block / channels,
        latency / channels
    );

    let mut output = vec![0.0; total];
    let mut input = vec![0.0; block];
    let mut side = vec![0.0; block];
    let mut pos = 0;
    while pos < total {
        let len = block.min(total - pos);
        copy_padded(&primary.data, pos, &mut input[..len]);
        let out = &mut output[pos..pos + len];
        if loop_secondary {
            morpher.process_block(&input[..len], None, out)?;
        } else {
            copy_padded(&secondary.data, pos, &mut side[..len]);
            morpher.process_block(&input[..len], Some(&side[..len]), out)?;
        }
        pos += len;
    }

    output.drain(..latency);
    Ok(output)
}

/// Copies `src[pos..]` into `dst`, zero-filling past the end of `src`.
fn copy_padded(src: &[f32], pos: usize, dst: &mut [f32]) {
    let available = src.len().saturating_sub(pos).min(dst.len());
    if available > 0 {
        dst[..available].copy_from_slice(&src[pos..pos + available]);
    }
    dst[available..].fill(0.0);
}
