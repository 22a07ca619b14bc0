use anyhow::{bail, Result};

use crate::service::{ServeConfig, SERVE_USAGE};

const USAGE: &str = "Usage: handframe <command>\n\nCommands:\n  serve    Run the hand landmark service\n  help     Show this message";

pub fn handle_commands(args: &[String]) -> Result<()> {
    match args.get(1).map(|s| s.as_str()) {
        Some("serve") => serve(args),
        Some("help") | Some("--help") | Some("-h") => {
            println!("{USAGE}\n\n{SERVE_USAGE}");
            Ok(())
        }
        Some(other) => bail!("Unrecognised command: {other}\n\n{USAGE}"),
        None => bail!("{USAGE}"),
    }
}

fn serve(args: &[String]) -> Result<()> {
    let config = ServeConfig::from_args(args)?;
    run_with_backend(config)
}

#[cfg(feature = "with-tch")]
fn run_with_backend(config: ServeConfig) -> Result<()> {
    use std::sync::Arc;

    use hand_core::detector::{LandmarkModel, ModelFactory, TorchLandmarker};

    let options = config.detector_options();
    let factory: ModelFactory = Arc::new(move || {
        TorchLandmarker::new(options.clone()).map(|model| Box::new(model) as Box<dyn LandmarkModel>)
    });
    crate::service::run(config, factory)
}

#[cfg(not(feature = "with-tch"))]
fn run_with_backend(config: ServeConfig) -> Result<()> {
    use std::sync::Arc;

    use hand_core::detector::{DetectorError, ModelFactory};

    // fails through the normal fatal-startup path instead of serving with
    // a null detector
    let factory: ModelFactory = Arc::new(|| {
        Err(DetectorError::ModelLoad(
            "this build was compiled without a landmark backend; \
             rebuild with `--features with-tch`"
                .to_string(),
        ))
    });
    crate::service::run(config, factory)
}
