//! Image Relocator
//!
//! Copies every image referenced by a scanned set of deployment manifests
//! into one destination repository and prints the rewritten image list.

use image_relocator::cli::{Args, Runner};
use image_relocator::logging::init_tracing;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse_args();
    init_tracing(args.verbose);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let runner = Runner::new(args);
    match runner.run(&cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            runner.logger().warning("Relocation cancelled");
            ExitCode::from(EXIT_CANCELLED)
        }
        Err(e) => {
            runner.logger().error(&e.to_string());
            if e.is_transfer() {
                runner
                    .logger()
                    .info("Images copied before the failure are kept; re-running the batch is safe");
            }
            ExitCode::FAILURE
        }
    }
}
