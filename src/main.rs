//! Live QR scanner: capture frames, decode symbols, overlay the results.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use qrscan::app::{self, ExitReason};
use qrscan::capture::CameraSession;
use qrscan::display::{Sdl2Display, WINDOW_TITLE};
use qrscan::scan::RqrrDecoder;
use qrscan::Config;

#[derive(Debug, Parser)]
#[command(name = "qrscan", version, about = "QR Code Scanner")]
struct Args {
    /// Width of the display window
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Height of the display window
    #[arg(long, default_value_t = 480)]
    height: u32,
    /// Target FPS
    #[arg(long, default_value_t = 30)]
    fps: u32,
}

fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qrscan=info")),
        )
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();

    let args = Args::parse();
    let config = Config::new(args.width, args.height, args.fps);

    // Cooperative cancellation: the loop polls this flag each iteration so
    // an interrupt still runs the normal shutdown path.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))
            .wrap_err("failed to install interrupt handler")?;
    }

    let mut session =
        CameraSession::open(&config.capture).wrap_err("could not open any camera backend")?;
    info!(
        "camera started on {} at {}x{} @ {}fps; press 'q' to quit",
        session.backend(),
        config.capture.width,
        config.capture.height,
        config.capture.fps
    );

    let mut display = Sdl2Display::new(WINDOW_TITLE, config.display.width, config.display.height)
        .wrap_err("failed to create display window")?;
    let mut decoder = RqrrDecoder::new();

    let target = (config.capture.width, config.capture.height);
    let exit = app::run_loop(&mut session, &mut display, &mut decoder, target, &cancel)?;

    match exit {
        ExitReason::Quit => info!("quit"),
        ExitReason::Interrupted => info!("interrupted by user"),
        ExitReason::CaptureFailed => info!("capture stopped"),
    }
    Ok(())
}
