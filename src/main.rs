use anyhow::Result;
use clap::{Arg, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use gbtune::config::PipelineConfig;
use gbtune::pipeline::run_pipeline;
use gbtune::report::build_pipeline_report;
use gbtune::table::RawTable;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("GBTUNE_LOG", "error,gbtune=info"))
        .init();

    let matches = Command::new("gbtune")
        .version(clap::crate_version!())
        .about("Tune a gradient-boosted tree regressor with staged cross-validated grid search")
        .arg(
            Arg::new("dataset")
                .help("Path to the input CSV dataset")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a JSON pipeline configuration; defaults are used when omitted")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Path the HTML report is written to")
                .default_value("gbtune_report.html")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("outcome")
                .long("outcome")
                .help("Outcome column name; overrides the configuration file")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .get_matches();

    let dataset_path = matches
        .get_one::<PathBuf>("dataset")
        .expect("dataset is required");

    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(outcome) = matches.get_one::<String>("outcome") {
        config.roles.outcome = outcome.clone();
    }

    let table = RawTable::from_csv(dataset_path, &config.roles)?;
    let run = run_pipeline(&table, &config)?;

    let report = build_pipeline_report(&run, &config)?;
    let output = matches
        .get_one::<String>("output")
        .expect("output has a default");
    report.save_to_file(output)?;
    log::info!("Report written to {}", output);
    println!(
        "Held-out RMSE: {:.5} ({} trees, learning rate {}, depth {}, colsample {})",
        run.final_test_rmse,
        run.final_params.trees,
        run.final_params.learning_rate,
        run.final_params.max_depth,
        run.final_params.colsample
    );

    Ok(())
}
