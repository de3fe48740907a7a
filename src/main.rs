//! Terminal spectrum analyzer
//!
//! # Usage Examples
//!
//! ## SoapySDR (requires the `soapy` feature)
//! ```bash
//! retrogram --args driver=rtlsdr --freq 100.1M --rate 2.4M
//! ```
//!
//! ## IQ file playback
//! ```bash
//! retrogram --file samples.cs16 --freq 100.1M --rate 2M --peak-hold true
//! ```

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use retrogram::analyzer::{Analyzer, StreamOptions};
use retrogram::cli::{Args, BANNER};
use retrogram::device::SdrDevice;
use retrogram::error::Result;
use retrogram::iqfile::IqFileDevice;
use retrogram::logging::{self, ConsoleGate};
use retrogram::params::DisplayParameters;
use retrogram::spectrum::FftLogPower;
use retrogram::tui::{TerminalKeys, TerminalScreen};

fn main() -> ExitCode {
    // Help and version requests also end with a non-zero status.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    println!("{}", BANNER);
    println!();
    let gate = logging::init(args.verbose, args.log_file.as_deref())?;
    let params = args.into_parameters()?;
    let options = args.stream_options()?;

    match &args.file {
        Some(path) => {
            let device = IqFileDevice::open(path, params.sample_rate, params.frequency)?;
            display(device, params, options, &gate)
        }
        None => display(open_hardware(args, &params)?, params, options, &gate),
    }
}

#[cfg(feature = "soapy")]
fn open_hardware(
    args: &Args,
    params: &DisplayParameters,
) -> Result<retrogram::soapy::SoapyDevice> {
    retrogram::soapy::SoapyDevice::open(&retrogram::soapy::SoapyConfig {
        args: args.args.clone(),
        index: args.dev,
        sample_rate: params.sample_rate,
        center_freq: params.frequency,
    })
}

#[cfg(not(feature = "soapy"))]
fn open_hardware(
    _args: &Args,
    _params: &DisplayParameters,
) -> Result<IqFileDevice> {
    Err(retrogram::Error::device(
        "soapy feature not enabled. Rebuild with --features soapy or use --file",
    ))
}

fn display<D: SdrDevice>(
    device: D,
    params: DisplayParameters,
    options: StreamOptions,
    gate: &ConsoleGate,
) -> Result<()> {
    let transform = FftLogPower::new(options.bins);
    let screen = TerminalScreen::enter()?;
    let analyzer = Analyzer::new(
        device,
        transform,
        TerminalKeys::new(),
        screen,
        params,
        options,
    );

    gate.mute();
    // The terminal is restored when the analyzer is consumed.
    let summary = analyzer.run();
    gate.unmute();

    info!(
        "{} frames rendered, {} stream reads dropped",
        summary.frames_rendered,
        summary.stream.dropped()
    );

    println!();
    if let Some(event) = summary.last_event {
        println!("{}", event);
    }
    println!("Done!");
    println!();
    Ok(())
}
