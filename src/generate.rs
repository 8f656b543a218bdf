use crate::chat::ChatApi;
use crate::config::GenerationConfig;
use crate::models::{GenerationRecord, PromptRow};
use crate::sheet;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;

/// Drives the local inference runtime: for every prompt row and every
/// configured model, issues `repeat_count` independent chat requests and
/// checkpoints the accumulated results after each completed row.
///
/// Requests run strictly sequentially with a fixed delay between them;
/// local inference is resource-bound and the runtime must not be flooded.
pub struct Generator {
    config: GenerationConfig,
    chat: Box<dyn ChatApi>,
    verbose: bool,
}

impl Generator {
    pub fn new(config: GenerationConfig, chat: Box<dyn ChatApi>, verbose: bool) -> Self {
        Self {
            config,
            chat,
            verbose,
        }
    }

    /// Generate responses for all prompt rows, rewriting the full output
    /// file after every completed row. An interrupted run leaves a valid
    /// file reflecting all fully completed rows; a failed request aborts
    /// the run with no retry.
    pub async fn run(&self, rows: &[PromptRow], output_path: &Path) -> Result<Vec<GenerationRecord>> {
        let model_names: Vec<String> = self
            .config
            .models
            .iter()
            .map(|model| model.name.clone())
            .collect();

        let mut records = Vec::new();
        let total_rows = rows.len();

        for (row_index, row) in rows.iter().enumerate() {
            self.log_row(row_index + 1, total_rows, &row.category);

            let record = self
                .generate_row(row)
                .await
                .with_context(|| format!("Failed to generate responses for prompt: {}", row.prompt))?;
            records.push(record);

            sheet::write_generation_records(
                output_path,
                &records,
                &model_names,
                self.config.repeat_count,
            )
            .with_context(|| {
                format!("Failed to checkpoint results to {}", output_path.display())
            })?;
        }

        Ok(records)
    }

    /// Generate all responses for a single prompt row. Each request is an
    /// independent single-message call with no shared conversation state.
    async fn generate_row(&self, row: &PromptRow) -> Result<GenerationRecord> {
        let mut record = GenerationRecord::new(&row.category, &row.prompt);

        for model in &self.config.models {
            for repeat in 1..=self.config.repeat_count {
                self.log_request(&model.name, repeat);

                let response = self
                    .chat
                    .complete(&model.id, &row.prompt)
                    .await
                    .with_context(|| {
                        format!(
                            "Chat request {}/{} failed for model {}",
                            repeat, self.config.repeat_count, model.name
                        )
                    })?;
                record.push_response(&model.name, response);

                sleep(Duration::from_secs(self.config.request_delay_secs)).await;
            }
        }

        Ok(record)
    }

    fn log_row(&self, row_num: usize, total_rows: usize, category: &str) {
        if self.verbose {
            println!("Processing prompt {}/{} ({})", row_num, total_rows, category);
        }
    }

    fn log_request(&self, model: &str, repeat: usize) {
        if self.verbose {
            println!(
                "  → Request {}/{} for model {}",
                repeat, self.config.repeat_count, model
            );
        }
    }
}
