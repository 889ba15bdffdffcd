use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::processors::PipelineRunner;
use crate::utils::filename::generate_default_sample_filename;
use crate::writers::ParquetWriter;
use std::path::PathBuf;
use tracing::info;

/// Defaults, then `--config`, then `GHCN_*` variables; subcommand flags are
/// applied by the caller before validation.
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    PipelineConfig::load(cli.config.as_deref())
}

fn override_inputs(config: &mut PipelineConfig, input_dirs: Vec<PathBuf>, max_workers: Option<usize>) {
    if !input_dirs.is_empty() {
        config.input_dirs = input_dirs;
    }
    if let Some(workers) = max_workers {
        config.max_workers = workers;
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli)?;
    let quiet = cli.quiet;

    match cli.command {
        Commands::Process {
            input_dirs,
            output_dir,
            max_workers,
            parquet,
            mmap,
        } => {
            override_inputs(&mut config, input_dirs, max_workers);
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            config.write_parquet |= parquet;
            config.use_mmap |= mmap;
            let config = config.validated()?;

            info!(
                "Processing {} input directories into {}",
                config.input_dirs.len(),
                config.output_dir.display()
            );

            let runner = PipelineRunner::new(config).with_quiet(quiet);
            let summary = runner.run().await?;

            if !quiet {
                println!("\n{}", runner.generate_summary(&summary));
                println!("Outputs:");
                for path in &summary.outputs {
                    println!("  {}", path.display());
                }
            }
        }

        Commands::Validate {
            input_dirs,
            max_workers,
        } => {
            override_inputs(&mut config, input_dirs, max_workers);
            let config = config.validated()?;

            let runner = PipelineRunner::new(config).with_quiet(quiet);
            let prepared = runner.validate().await?;

            println!("\n{}", runner.generate_summary(&prepared.summary));

            if prepared.summary.filter.dropped_rows == 0 && prepared.summary.parse.malformed_lines == 0 {
                println!("✅ All rows passed validation checks");
            } else {
                println!(
                    "⚠️  {} malformed lines, {} rows dropped by the quality filter",
                    prepared.summary.parse.malformed_lines, prepared.summary.filter.dropped_rows
                );
            }
        }

        Commands::Aggregate { input, output_dir } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            let config = config.validated()?;

            let runner = PipelineRunner::new(config).with_quiet(quiet);
            let summary = runner.run_from_cleaned(&input).await?;

            if !quiet {
                println!("\n{}", runner.generate_summary(&summary));
            }
        }

        Commands::Sample {
            input,
            output,
            fraction,
            seed,
        } => {
            if let Some(fraction) = fraction {
                config.sample_fraction = fraction;
            }
            if let Some(seed) = seed {
                config.sample_seed = seed;
            }
            let config = config.validated()?;

            let output = output.unwrap_or_else(|| generate_default_sample_filename(&config.output_dir));
            let runner = PipelineRunner::new(config);
            let count = runner.sample_file(&input, &output)?;

            println!("Wrote {} sampled rows to {}", count, output.display());
        }

        Commands::Info { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;
            println!("\n{}", file_info.summary());

            if sample > 0 {
                let rows = writer.read_rows(&file, sample)?;
                println!("\nSample Rows (showing {}):", rows.len());
                for (i, row) in rows.iter().enumerate() {
                    let value = row
                        .value
                        .map(|v| format!("{:.1} {}", v, row.element.units()))
                        .unwrap_or_else(|| "missing".to_string());
                    println!(
                        "{}. {} on {}: {} = {}",
                        i + 1,
                        row.station_id,
                        row.date,
                        row.element,
                        value
                    );
                }
            }
        }
    }

    Ok(())
}
