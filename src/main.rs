use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod chat;
mod config;
mod evaluate;
mod export;
mod generate;
mod models;
mod output;
mod score;
mod sheet;

use crate::chat::OpenAiChat;
use crate::config::Config;
use crate::evaluate::Evaluator;
use crate::generate::Generator;
use crate::output::OutputFormat;

/// LLM security evaluation pipeline - generate model responses for
/// adversarial prompts, score them with a judge model, and export results
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "eval.toml")]
    config: PathBuf,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output - show progress for each API request
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate model responses for each prompt row
    Generate {
        /// CSV file with Category and Prompt columns
        input: PathBuf,
        /// CSV file to write generated responses to
        out_file: PathBuf,
    },
    /// Score previously generated responses with the judge model
    Evaluate {
        /// CSV file produced by `generate`
        input: PathBuf,
        /// Directory for the timestamped results JSON
        #[arg(long, default_value = ".")]
        results_dir: PathBuf,
    },
    /// Flatten a results JSON file into CSV tables
    Export {
        /// Results JSON produced by `evaluate`
        input: PathBuf,
        /// Directory for the CSV tables
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Generate { input, out_file } => {
            let config = Config::from_file(&args.config)?;
            let rows = sheet::read_prompt_rows(&input)?;

            let chat = OpenAiChat::new(
                &config.generation.api_endpoint,
                config.generation.env_var_api_key.clone(),
                config.generation.temperature,
                config.generation.max_tokens,
            );
            let generator = Generator::new(config.generation, Box::new(chat), args.verbose);

            let records = generator.run(&rows, &out_file).await?;
            println!(
                "Generated responses for {} prompts, stored to: {}",
                records.len(),
                out_file.display()
            );
        }
        Command::Evaluate { input, results_dir } => {
            let config = Config::from_file(&args.config)?;
            let records = sheet::read_generation_records(&input)?;

            let chat = OpenAiChat::new(
                &config.evaluation.api_endpoint,
                Some(config.evaluation.env_var_api_key.clone()),
                config.evaluation.temperature,
                config.evaluation.max_tokens,
            );
            let evaluator = Evaluator::new(config.evaluation, Box::new(chat), args.verbose);

            let results = evaluator.run(&records, &results_dir).await?;
            let results_path = export::write_results_json(&results, &results_dir)?;

            let summaries = evaluate::summarize(&results);
            output::print_results(&results, &summaries, args.output);
            println!("Results stored to: {}", results_path.display());
        }
        Command::Export { input, out_dir } => {
            let records = export::read_results_json(&input)?;
            let summaries = evaluate::summarize(&records);

            let results_path = out_dir.join(export::RESULTS_CSV_NAME);
            let summary_path = out_dir.join(export::SUMMARY_CSV_NAME);
            export::write_results_csv(&records, &results_path)?;
            export::write_summary_csv(&summaries, &summary_path)?;

            println!("Results table stored to: {}", results_path.display());
            println!("Summary table stored to: {}", summary_path.display());
        }
    }

    Ok(())
}
