use crate::cli::RunArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use csdmd::{
    engine::{backend::ExternalBackend, progress::ProgressReporter},
    workflows::simulate::{self, RunOptions},
};
use tracing::info;

pub async fn run(args: RunArgs) -> Result<()> {
    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let params = simulate::load_params(&args.md_params, &reporter)?;
    let backend = ExternalBackend::new(params.engine.clone());
    let options = RunOptions {
        work_dir: std::env::current_dir()?,
        keep_inputs: args.keep_inputs,
    };

    info!("Invoking the MD workflow for {:?}...", &args.md_params);
    let summary = tokio::task::block_in_place(|| {
        simulate::run(
            &params,
            &args.md_params,
            &backend,
            &backend,
            &options,
            &reporter,
        )
    })?;

    info!(
        "Workflow finished after {} stage(s).",
        summary.completed_stages.len()
    );
    if let Some(dir) = summary.input_dir {
        println!("Input files kept in: {}", dir.display());
    }
    Ok(())
}
