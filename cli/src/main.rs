use clap::{Parser, Subcommand};
use hound::WavSpec;
use iqsynth_cli::server::{self, AppState};
use iqsynth_cli::{load_signal_set, parse_hz};
use iqsynth_core::device::SimulatedDevice;
use iqsynth_core::iqfile::{load_iq, save_iq};
use iqsynth_core::sink::SpectrumFrame;
use iqsynth_core::spectrum::{power_spectrum, purity_check, Window};
use iqsynth_core::units::format_frequency;
use iqsynth_core::{
    CompositeBuffer, Compositor, Session, Snapshot, DEFAULT_CENTER_FREQUENCY_HZ,
    DEFAULT_LEVEL_DBM, DEFAULT_REFRESH_INTERVAL_S, DEFAULT_SAMPLE_RATE,
    DEFAULT_SPECTRUM_SINK_ADDR,
};
use std::fs::File;
use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iqsynth")]
#[command(about = "Composite I/Q waveform synthesizer for vector signal generators")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a signal set to a raw IQ or WAV file
    Render {
        /// JSON file with an array of signal descriptors
        #[arg(value_name = "CONFIG.JSON")]
        config: PathBuf,

        /// Output file (interleaved little-endian f32, or WAV with --wav)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Sample rate, e.g. 10MHz
        #[arg(short, long, value_parser = parse_hz, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,

        /// Duration in seconds (default: one sweep period, else 10 ms)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Write a 2-channel 32-bit float WAV (I left, Q right)
        #[arg(long)]
        wav: bool,

        /// Also send the composite to a spectrum display, e.g. 127.0.0.1:56789
        #[arg(long, value_name = "ADDR")]
        spectrum_sink: Option<String>,
    },

    /// Report peak frequency and I/Q purity of a raw IQ file
    Analyze {
        #[arg(value_name = "INPUT.IQ")]
        input: PathBuf,

        /// Sample rate the file was rendered at
        #[arg(short, long, value_parser = parse_hz, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,
    },

    /// Listen for spectrum frames and print each frame's peak
    Monitor {
        #[arg(short, long, default_value = DEFAULT_SPECTRUM_SINK_ADDR)]
        bind: String,
    },

    /// Run the HTTP control server against a simulated generator
    Serve {
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        bind: String,

        /// Initial signal set
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_parser = parse_hz, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: f64,

        /// RF center frequency, e.g. 1.23GHz
        #[arg(long, value_parser = parse_hz, default_value_t = DEFAULT_CENTER_FREQUENCY_HZ)]
        center_frequency: f64,

        /// Output level in dBm
        #[arg(long, default_value_t = DEFAULT_LEVEL_DBM, allow_negative_numbers = true)]
        level: f64,

        /// Seconds between background spectrum refreshes
        #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL_S)]
        refresh_interval: f64,

        /// Forward each refreshed composite to a spectrum display
        #[arg(long, value_name = "ADDR")]
        spectrum_sink: Option<String>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            config,
            output,
            sample_rate,
            duration,
            seed,
            wav,
            spectrum_sink,
        } => render_command(
            &config,
            &output,
            sample_rate,
            duration,
            seed,
            wav,
            spectrum_sink.as_deref(),
        )?,
        Commands::Analyze { input, sample_rate } => analyze_command(&input, sample_rate)?,
        Commands::Monitor { bind } => monitor_command(&bind)?,
        Commands::Serve {
            bind,
            config,
            sample_rate,
            center_frequency,
            level,
            refresh_interval,
            spectrum_sink,
        } => {
            let snapshot = Snapshot {
                center_frequency_hz: center_frequency,
                level_dbm: level,
                sample_rate,
                signals: match config {
                    Some(path) => load_signal_set(&path)?,
                    None => Default::default(),
                },
            };
            serve_command(&bind, snapshot, refresh_interval, spectrum_sink)?
        }
    }

    Ok(())
}

fn render_command(
    config_path: &Path,
    output_path: &Path,
    sample_rate: f64,
    duration: Option<f64>,
    seed: Option<u64>,
    wav: bool,
    spectrum_sink: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let signals = load_signal_set(config_path)?;
    println!("Loaded {} signals from {}", signals.len(), config_path.display());
    for (i, signal) in signals.iter().enumerate() {
        println!("  {}. {}", i + 1, signal);
    }

    let mut compositor = Compositor::new(sample_rate);
    if let Some(seed) = seed {
        compositor = compositor.with_seed(seed);
    }
    let buffer = compositor.render(&signals, duration)?;
    println!(
        "Rendered {} samples ({:.3} ms at {})",
        buffer.len(),
        buffer.duration_s() * 1e3,
        format_frequency(sample_rate)
    );

    if wav {
        write_wav(output_path, &buffer)?;
    } else {
        save_iq(output_path, buffer.samples())?;
    }
    println!("Wrote {}", output_path.display());

    if let Some(addr) = spectrum_sink {
        let mut stream = TcpStream::connect(addr)?;
        SpectrumFrame::Samples {
            sample_rate: buffer.sample_rate,
            samples: buffer.samples().to_vec(),
        }
        .write_to(&mut stream)?;
        println!("Sent {} samples to spectrum sink {}", buffer.len(), addr);
    }

    Ok(())
}

fn write_wav(path: &Path, buffer: &CompositeBuffer) -> Result<(), Box<dyn std::error::Error>> {
    let spec = WavSpec {
        channels: 2,
        sample_rate: buffer.sample_rate.round() as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let file = File::create(path)?;
    let mut writer = hound::WavWriter::new(file, spec)?;
    for s in buffer.samples() {
        writer.write_sample(s.re)?;
        writer.write_sample(s.im)?;
    }
    writer.finalize()?;
    Ok(())
}

fn analyze_command(input_path: &Path, sample_rate: f64) -> Result<(), Box<dyn std::error::Error>> {
    let samples = load_iq(input_path)?;
    println!("Read {} samples from {}", samples.len(), input_path.display());
    if samples.is_empty() {
        return Err("No samples to analyze".into());
    }

    let spectrum = power_spectrum(&samples, sample_rate, Window::Hann);
    if let Some((freq, power)) = spectrum.peak() {
        println!("Peak: {} offset, {:.1} dB", format_frequency(freq), power);
    }

    let report = purity_check(&samples);
    println!("Image rejection: {:.1} dB", report.image_rejection_db);
    println!("DC magnitude:    {:.6}", report.dc_magnitude);
    println!("Orthogonality:   {:.6}", report.orthogonality);
    Ok(())
}

fn monitor_command(bind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(bind)?;
    println!("Waiting for spectrum frames on {}", bind);

    for stream in listener.incoming() {
        let stream = stream?;
        let peer = stream.peer_addr()?;
        println!("Connection from {}", peer);
        let mut reader = BufReader::new(stream);

        loop {
            match SpectrumFrame::read_from(&mut reader) {
                Ok(SpectrumFrame::Samples {
                    sample_rate,
                    samples,
                }) => {
                    let spectrum = power_spectrum(&samples, sample_rate, Window::Hann);
                    match spectrum.peak() {
                        Some((freq, power)) => println!(
                            "{} samples @ {}: peak {} ({:.1} dB)",
                            samples.len(),
                            format_frequency(sample_rate),
                            format_frequency(freq),
                            power
                        ),
                        None => println!("Empty frame"),
                    }
                }
                Ok(SpectrumFrame::Shutdown) => {
                    println!("Shutdown requested by {}", peer);
                    return Ok(());
                }
                Err(e) => {
                    println!("Connection from {} closed: {}", peer, e);
                    break;
                }
            }
        }
    }

    Ok(())
}

fn serve_command(
    bind: &str,
    snapshot: Snapshot,
    refresh_interval: f64,
    spectrum_sink: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !refresh_interval.is_finite() || refresh_interval <= 0.0 {
        return Err(format!("Invalid refresh interval: {}", refresh_interval).into());
    }

    let session = Session::from_snapshot(snapshot)?;
    println!("Session holds {} signals", session.signals().len());

    let mut state = AppState::new(session, SimulatedDevice::open()?);
    if let Some(addr) = spectrum_sink {
        state = state.with_spectrum_sink(addr);
    }
    let state = Arc::new(state);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(bind).await?;
        server::run(listener, state, Duration::from_secs_f64(refresh_interval)).await
    })?;

    Ok(())
}
