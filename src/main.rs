use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use hamdrm::transmission::receiver::{DecoderConfig, DrmReceiver};
use hamdrm::transmission::sender::{DrmSender, EncoderConfig};
use hamdrm::utils::logging::init_logging;
use hamdrm::{Error, Result};

/// HAMDRM digital-SSTV modem
#[derive(Parser)]
#[command(name = "hamdrm")]
#[command(about = "DRM digital-SSTV modem: payload bytes <-> OFDM audio")]
struct Args {
    /// Enable the modem's debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Encode a payload file into a WAV transmission
    Encode {
        /// Payload file (an already-compressed image)
        input: PathBuf,
        /// Output WAV path
        output: PathBuf,
        /// MIME type announced in the SDC
        #[arg(long, default_value = "image/jpeg")]
        mime: String,
    },
    /// Decode a WAV transmission back into the payload
    Decode {
        /// Input WAV path (any rate/width hound can read)
        input: PathBuf,
        /// Output payload path
        output: PathBuf,
        /// Print the diagnostics record as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Encode { input, output, mime } => {
            let payload = fs::read(&input)?;
            let sender = DrmSender::new(EncoderConfig { mime });
            let wav = sender.encode(&payload)?;
            fs::write(&output, &wav)?;
            info!("wrote {} ({} bytes)", output.display(), wav.len());
        }
        Command::Decode { input, output, json } => {
            let (samples, sample_rate) = read_wav_file(&input)?;
            let receiver = DrmReceiver::new(DecoderConfig {
                sample_rate_in: sample_rate,
            });
            let result = receiver.decode_samples(&samples)?;

            if json {
                let rendered = serde_json::to_string_pretty(&result.diagnostics)
                    .expect("diagnostics serialise");
                println!("{rendered}");
            } else {
                let d = &result.diagnostics;
                info!(
                    "mode {} {}, rate {}, SNR {:.1} dB, {} frame(s), {} segment error(s), {:.0} ms",
                    d.mode,
                    d.spectrum_occupancy,
                    d.fec_rate,
                    d.snr_db,
                    d.frames_decoded,
                    d.segment_errors,
                    d.decode_duration_ms
                );
                if let (Some(mime), Some(len)) = (&result.mime, result.announced_len) {
                    info!("service announced {} byte(s) of {}", len, mime);
                }
            }

            match result.payload {
                Some(payload) => {
                    fs::write(&output, &payload)?;
                    info!("wrote {} ({} bytes)", output.display(), payload.len());
                }
                None => {
                    warn!("no payload recovered");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Read any WAV file via hound, reducing multi-channel audio to its
/// first channel and normalising integer widths to [-1, 1].
fn read_wav_file(path: &Path) -> Result<(Vec<f64>, u32)> {
    let reader = hound::WavReader::open(path)
        .map_err(|err| Error::InputMalformed(err.to_string()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(channels)
            .map(|sample| {
                sample
                    .map(|value| value as f64)
                    .map_err(|err| Error::InputMalformed(err.to_string()))
            })
            .collect::<Result<_>>()?,
        hound::SampleFormat::Int => {
            let amplitude = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f64;
            reader
                .into_samples::<i32>()
                .step_by(channels)
                .map(|sample| {
                    sample
                        .map(|value| value as f64 / amplitude)
                        .map_err(|err| Error::InputMalformed(err.to_string()))
                })
                .collect::<Result<_>>()?
        }
    };

    Ok((samples, spec.sample_rate))
}
