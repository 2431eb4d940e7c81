mod args;
mod console;
mod deck;
mod replay;

use std::fs;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use tapcap_core::codec;
use tapcap_core::storage::cap_file;
use tapcap_core::{
    CancellationController, CapFileHeader, CapFileWriter, CaptureBuffer, CaptureConfig,
    CaptureError, CaptureOrchestrator, DeviceLink,
};

use crate::args::{Args, BufferArg};
use crate::console::ConsoleObserver;

fn main() -> ExitCode {
    let args = Args::parse();

    // tapcap info+ on stderr; --verbose is RUST_LOG's job here.
    env_logger::Builder::new()
        .filter_module("tapcap", log::LevelFilter::Info)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let cancel = Arc::new(CancellationController::new());
    let handler_cancel = Arc::clone(&cancel);
    if let Err(err) = ctrlc::set_handler(move || {
        eprintln!("\nAborting...");
        handler_cancel.trigger();
    }) {
        eprintln!("Error: could not install the Ctrl+C handler: {err}");
        return ExitCode::FAILURE;
    }

    match run(args, cancel) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CaptureError::UserAbort) => {
            eprintln!("Aborted.");
            ExitCode::from(130)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, cancel: Arc<CancellationController>) -> Result<(), CaptureError> {
    let config = CaptureConfig::new(
        args.profile.profile(),
        args.buffer.map(BufferArg::capacity),
        args.output,
    )?;

    if config.output.exists() && !confirm_overwrite()? {
        return Err(CaptureError::UserAbort);
    }

    println!("* Tape type: {}", config.profile);

    // The file is created before the hardware session so a bad output path
    // fails before the user threads a tape.
    let writer = CapFileWriter::create(&config.output)?;
    let result = capture_to(writer, &config, &cancel);
    if result.is_err() {
        // Leave no partial artifact behind.
        fs::remove_file(&config.output).ok();
    }
    result
}

fn capture_to(
    mut writer: CapFileWriter,
    config: &CaptureConfig,
    cancel: &Arc<CancellationController>,
) -> Result<(), CaptureError> {
    let link = deck::open_deck()?;
    let _deck = cancel.attach_deck(link.break_handle());

    let mut buffer = CaptureBuffer::with_capacity(config.capacity.bytes())?;
    let session =
        CaptureOrchestrator::with_observer(link, Arc::clone(cancel), Arc::new(ConsoleObserver));
    let report = session.run(&mut buffer)?;

    println!("Reading finished OK.");

    let header = CapFileHeader {
        precision_mhz: report.precision.get(),
        machine: config.profile.machine().id(),
        video: config.profile.video().id(),
        start_edge: report.diagnostics.first_edge.id(),
        signal_format: cap_file::SIGNAL_FORMAT_RELATIVE,
        signal_width: cap_file::SIGNAL_WIDTH_40BIT,
        start_offset: cap_file::DATA_START_OFFSET,
    };
    writer.write_header(&header, cap_file::DEFAULT_ANNOTATION)?;
    writer.write_stream(buffer.captured())?;
    let stats = writer.finish()?;

    let seconds = codec::tape_seconds(stats.total_ticks, report.precision);
    println!(
        "Tape length: {}h{}m{}s ({} bytes) ({} signals)",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60,
        report.captured_len,
        stats.signal_count
    );
    println!("Capture file successfully created.");
    Ok(())
}

/// Ask before clobbering an existing output file. EOF counts as a decline.
fn confirm_overwrite() -> Result<bool, CaptureError> {
    print!("Overwrite existing file? (y/N) ");
    io::stdout()
        .flush()
        .map_err(|err| CaptureError::Io(err.to_string()))?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|err| CaptureError::Io(err.to_string()))?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}
