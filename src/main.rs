use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use tetrapol_rs::multiblock::{RchConsumer, SegmentationReset, TpduConsumer};
use tetrapol_rs::tables::{DEFAULT_SCR_CONFIDENCE, SCR_DETECT};
use tetrapol_rs::types::DataFrame;
use tetrapol_rs::util::hex::encode_hex;
use tetrapol_rs::{init_logger, log_info, DecoderConfig, PhysCh, ProcessResult};

/// Decode a TETRAPOL downlink physical-channel bit stream.
#[derive(Parser)]
#[command(name = "tetrapol-decode")]
#[command(about = "Decode a raw hard-decision TETRAPOL downlink bit stream")]
struct Cli {
    /// Path to a raw hard-decision bit stream (one byte per bit, value 0 or 1);
    /// reads stdin if omitted.
    input: Option<PathBuf>,

    /// Path to a JSON decoder configuration (see [`tetrapol_rs::DecoderConfig`]);
    /// flags below override values it sets.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Force a fixed scrambling constant instead of blind detection (0..127).
    #[arg(long)]
    scr: Option<u8>,

    /// Confidence threshold (consecutive matching frames) before a blind SCR
    /// detection locks in.
    #[arg(long, default_value_t = DEFAULT_SCR_CONFIDENCE)]
    scr_confidence: u32,

    /// Bytes read from the input stream per chunk.
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,

    /// Increase diagnostic verbosity (repeatable: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct StdoutDriver;

impl TpduConsumer for StdoutDriver {
    fn on_tpdu(&mut self, data: &[u8], frame_no: i32) {
        println!("tpdu frame_no={frame_no} data={}", encode_hex(data));
    }
}

impl RchConsumer for StdoutDriver {
    fn on_rch(&mut self, frame: &DataFrame) {
        println!("rch frame_no={}", frame.frame_no);
    }
}

impl SegmentationReset for StdoutDriver {
    fn segmentation_reset(&mut self) {
        log::debug!("segmentation reset");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if std::env::var("RUST_LOG").is_err() {
        let level = match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", format!("tetrapol_rs={level}"));
    }
    init_logger();

    let mut input: Box<dyn Read> = match &cli.input {
        Some(path) => Box::new(
            std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(std::io::stdin()),
    };

    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            DecoderConfig::from_json(&text).context("parsing decoder config")?
        }
        None => DecoderConfig::default(),
    };
    if let Some(scr) = cli.scr {
        config.scr = Some(scr);
    }
    if cli.scr_confidence != DEFAULT_SCR_CONFIDENCE {
        config.scr_confidence = cli.scr_confidence;
    }
    config.validate().context("invalid decoder configuration")?;

    let mut phys_ch = PhysCh::new();
    phys_ch.set_scr(config.scr.map(i32::from).unwrap_or(SCR_DETECT));
    phys_ch.set_scr_confidence(config.scr_confidence);
    phys_ch.set_max_channel_errors(config.max_channel_errors);

    let mut driver = StdoutDriver;
    let mut chunk = vec![0u8; cli.chunk_size];

    loop {
        let n = input.read(&mut chunk).context("reading input stream")?;
        if n == 0 {
            break;
        }

        let mut offset = 0;
        while offset < n {
            offset += phys_ch.recv(&chunk[offset..n]);
            while phys_ch.process(&mut driver, &mut driver, &mut driver) != ProcessResult::NeedMoreData
            {
                // drain all complete frames (and resyncs) before reading more input
            }
        }
    }

    log_info("input stream exhausted");
    Ok(())
}
