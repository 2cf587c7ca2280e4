use clap::Parser;
use channel_tidy::{
    actions::{ActionOutcome, Transformer},
    audio::analysis::AudioAnalyzer,
    batch::Batch,
    cli::commands::{Cli, Commands},
    utils::reporting::Reporter,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    // Configure thread pool
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get()) // Use all available CPU cores
        .build_global()
    {
        eprintln!("Could not configure thread pool: {}", e);
    }

    let cli = Cli::parse();
    let options = cli.analysis.to_options();

    match cli.command {
        Commands::Scan { dir, report, actions } => {
            let options = actions.apply(options);
            println!("=== Scanning {} ===", dir.display());
            let batch = match Batch::scan(&dir, options) {
                Ok(batch) => batch,
                Err(e) => {
                    eprintln!("Error scanning directory: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            print_failures(&batch);

            let plan = batch.plan();
            let reporter = Reporter::new();
            println!("\nFound {} audio files", plan.len());
            for planned in &plan {
                println!("  {}", reporter.summary_line(planned));
            }

            if let Some(report) = report {
                match reporter.generate_plan_report(&plan, &report) {
                    Ok(_) => println!("\nReport saved to: {}", report.display()),
                    Err(e) => {
                        eprintln!("Error generating report: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }

        Commands::Proceed { dir, dry_run, actions } => {
            let options = actions.apply(options);
            println!("=== Processing {} ===", dir.display());
            let mut batch = match Batch::scan(&dir, options) {
                Ok(batch) => batch,
                Err(e) => {
                    eprintln!("Error scanning directory: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            print_failures(&batch);

            let plan = batch.plan();
            let reporter = Reporter::new();
            for planned in &plan {
                println!("  {}", reporter.summary_line(planned));
            }
            if dry_run {
                println!("\nDry run - no files were changed");
                return ExitCode::SUCCESS;
            }

            let report = batch.proceed(&plan);
            for (path, outcome) in &report.outcomes {
                match outcome {
                    ActionOutcome::Skipped => {}
                    ActionOutcome::Removed(_) => println!("Removed: {}", path.display()),
                    ActionOutcome::Rewritten(file) => {
                        println!("Rewritten: {} ({} channel)", path.display(), file.channels)
                    }
                    ActionOutcome::Created(paths) => {
                        for created in paths {
                            println!("Created: {}", created.display());
                        }
                    }
                }
            }
            for (path, error) in &report.failures {
                eprintln!("Failed: {}: {}", path.display(), error);
            }
            println!("\n=== {} files remain ===", batch.files().len());
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }

        Commands::Split { file, keep } => {
            let result = AudioAnalyzer::analyze_path(&file, &options)
                .and_then(|audio| Transformer::new(options.clone()).split(&audio, !keep));
            finish(result)
        }

        Commands::Monoize { file, channel } => {
            let result = AudioAnalyzer::analyze_path(&file, &options)
                .and_then(|audio| Transformer::new(options.clone()).monoize(&audio, channel));
            finish(result)
        }

        Commands::Join { files, output, forced, keep } => {
            let Some((leader, partners)) = files.split_first() else {
                eprintln!("No files to join");
                return ExitCode::FAILURE;
            };
            let result = AudioAnalyzer::analyze_path(leader, &options).and_then(|audio| {
                Transformer::new(options.clone()).join(&audio, partners, output.as_deref(), forced, !keep)
            });
            finish(result)
        }
    }
}

fn print_failures(batch: &Batch) {
    for (path, error) in batch.failures() {
        eprintln!("Skipping {}: {}", path.display(), error);
    }
}

fn finish(result: channel_tidy::Result<ActionOutcome>) -> ExitCode {
    match result {
        Ok(ActionOutcome::Skipped) => {
            println!("Nothing to do");
            ExitCode::SUCCESS
        }
        Ok(ActionOutcome::Removed(path)) => {
            println!("Removed: {}", path.display());
            ExitCode::SUCCESS
        }
        Ok(ActionOutcome::Rewritten(file)) => {
            println!("Rewritten: {} ({})", file.path.display(), file.verdict.category());
            ExitCode::SUCCESS
        }
        Ok(ActionOutcome::Created(paths)) => {
            for path in paths {
                println!("Created: {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
