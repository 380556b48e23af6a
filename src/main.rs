use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use std::fs;
use std::process::ExitCode;

use ideo::cli::{CleanArgs, Cli, Command, RunArgs, StatusArgs};
use ideo::config::SourceConfig;
use ideo::path::PathManager;
use ideo::pipeline::{StageCtx, run_pipeline, status_table};
use ideo::{build_stages, utils};

fn setup_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_level(true)
        .init();
}

fn run(args: &RunArgs) -> Result<()> {
    let pm = PathManager::new(&args.options.root_dir);
    pm.setup_dirs()?;
    let cfg = SourceConfig::from_options(&args.options);
    let stages = build_stages(&pm);
    let ctx = StageCtx {
        pm: &pm,
        cfg: &cfg,
        opts: &args.options,
    };
    run_pipeline(
        &ctx,
        &stages,
        args.options.force,
        args.options.from_stage.as_deref(),
    )
}

fn status(args: &StatusArgs) -> Result<()> {
    let pm = PathManager::new(&args.root_dir);
    let stages = build_stages(&pm);
    let rows = status_table(&pm, &stages)?;

    println!("{:<16} {:<10} {:<22} {}", "stage", "status", "finished", "error");
    for (name, state) in rows {
        let finished = state
            .end_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let error = state.error.unwrap_or_default();
        println!(
            "{name:<16} {:<10} {finished:<22} {error}",
            state.status.as_str()
        );
    }
    Ok(())
}

fn clean(args: &CleanArgs) -> Result<()> {
    let pm = PathManager::new(&args.root_dir);

    let mut targets = vec![pm.dir_work(), pm.path_state()];
    if args.all {
        targets.push(pm.dir_dict());
        targets.push(pm.dir_reports());
    }

    for target in targets {
        if !target.exists() {
            continue;
        }
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
        } else {
            fs::remove_file(&target)?;
        }
        utils::pretty_println_at_path("Removed", &target);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse_cli();
    setup_tracing(cli.verbose);

    let outcome = match &cli.command {
        Command::Run(args) => run(args),
        Command::Status(args) => status(args),
        Command::Clean(args) => clean(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
