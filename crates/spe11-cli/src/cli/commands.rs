use super::CliError;
use anyhow::Context;
use spe11_core::domain::{CaseVariant, OutputKinds, ReaderBackend, RunConfig, SparseSource};
use spe11_core::modules::run_reduction;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(clap::Args, Debug)]
pub(super) struct ReduceArgs {
    /// JSON run configuration; flags given on the command line win over it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run directory holding flow/ and deck/ (default: output)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Benchmark case: spe11a, spe11b or spe11c (default: spe11b)
    #[arg(short, long = "deck", value_name = "CASE")]
    deck: Option<CaseVariant>,

    /// Base name of the simulator files (default: run directory name, upper-cased)
    #[arg(long, value_name = "NAME")]
    deck_name: Option<String>,

    /// Output grid resolution as nx,ny,nz (default: 10,1,5)
    #[arg(short, long, value_name = "NX,NY,NZ", value_parser = parse_resolution)]
    resolution: Option<[usize; 3]>,

    /// Spatial map interval, hours for spe11a and years otherwise (default: 25)
    #[arg(short = 't', long = "time", value_name = "INTERVAL")]
    time: Option<f64>,

    /// Sparse and performance interval, hours for spe11a and years otherwise (default: 0.1)
    #[arg(short, long, value_name = "INTERVAL")]
    write: Option<f64>,

    /// Sparse data source: summary or restart (default: summary)
    #[arg(short, long, value_name = "SOURCE")]
    load: Option<SparseSource>,

    /// Output kinds: all, or a '_'-joined list of performance, sparse and dense (default: sparse)
    #[arg(short, long, value_name = "KINDS")]
    generate: Option<OutputKinds>,

    /// Reader backend: resdata or opm (default: resdata)
    #[arg(short = 'u', long = "use", value_name = "BACKEND")]
    backend: Option<ReaderBackend>,
}

fn parse_resolution(value: &str) -> Result<[usize; 3], String> {
    let parts = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .map_err(|error| format!("invalid resolution component '{part}': {error}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    <[usize; 3]>::try_from(parts)
        .map_err(|parts| format!("expected three comma-separated counts, got {}", parts.len()))
}

impl ReduceArgs {
    /// Defaults, then the configuration file, then explicit flags.
    fn resolve_config(&self) -> Result<RunConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let source = fs::read_to_string(path).with_context(|| {
                    format!("failed to read run configuration '{}'", path.display())
                })?;
                RunConfig::from_json(&source).map_err(CliError::Compute)?
            }
            None => RunConfig::default(),
        };

        if let Some(path) = &self.path {
            config.path = path.clone();
        }
        if let Some(case) = self.deck {
            config.case = case;
        }
        if let Some(name) = &self.deck_name {
            config.deck_name = Some(name.clone());
        }
        if let Some(resolution) = self.resolution {
            config.resolution = resolution;
        }
        if let Some(interval) = self.time {
            config.spatial_interval = interval;
        }
        if let Some(interval) = self.write {
            config.sparse_interval = interval;
        }
        if let Some(load) = self.load {
            config.load = load;
        }
        if let Some(generate) = self.generate {
            config.generate = generate;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        Ok(config)
    }
}

pub(super) fn run_reduce_command(args: ReduceArgs) -> Result<i32, CliError> {
    let config = args.resolve_config()?;
    let request = config.to_request().map_err(CliError::Compute)?;
    let artifacts = run_reduction(&request).map_err(CliError::Compute)?;

    let output_dir = request.output_dir();
    for artifact in &artifacts {
        println!("{}", output_dir.join(&artifact.relative_path).display());
    }
    info!(files = artifacts.len(), output_dir = %output_dir.display(), "data reduction finished");
    Ok(0)
}
