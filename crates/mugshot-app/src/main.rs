//! Headless runner: upload one photo, generate its mugshot, and save it.
//!
//! Usage: `mugshot-generator <image> [output-dir]`

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use mugshot_app::{
    AppError, HttpTransport, MugshotController, app_version, download_dir_from_env, init_tracing,
};
use mugshot_core::{LocalFile, ServiceConfig};
use mugshot_download::DownloadOutcome;
use mugshot_ui::WorkflowState;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(image) = args.next() else {
        eprintln!("mugshot-generator {}\nusage: mugshot-generator <image> [output-dir]", app_version());
        return ExitCode::from(2);
    };
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(download_dir_from_env);

    match run(Path::new(&image), output_dir).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            tracing::error!(error = %error, "mugshot-generator failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run(image: &Path, output_dir: PathBuf) -> Result<bool, AppError> {
    tracing::info!(version = app_version(), "mugshot-generator starting");
    let file = LocalFile::read_from_path(image)?;
    let mut controller =
        MugshotController::with_http(ServiceConfig::default(), HttpTransport::new()?, output_dir);

    controller.select_file(file).await;
    if controller.session().state() != WorkflowState::Ready {
        print_alerts(&mut controller);
        return Ok(false);
    }

    if controller.generate().await.is_err() || controller.session().state() != WorkflowState::Complete
    {
        print_alerts(&mut controller);
        return Ok(false);
    }
    controller.tick();

    let saved = match controller.download().await {
        Some(DownloadOutcome::Fetched { path } | DownloadOutcome::Canvas { path }) => {
            println!("{}", path.display());
            true
        }
        Some(DownloadOutcome::OpenedInNewTab { .. }) | None => false,
    };
    print_alerts(&mut controller);
    Ok(saved)
}

fn print_alerts(controller: &mut MugshotController) {
    for alert in controller.take_alerts() {
        eprintln!("{alert}");
    }
}
