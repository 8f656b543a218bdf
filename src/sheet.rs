use crate::models::{GenerationRecord, PromptRow};
use anyhow::{Context, Result};
use std::path::Path;

const CATEGORY_COLUMN: &str = "Category";
const PROMPT_COLUMN: &str = "Prompt";

fn column_index(headers: &csv::StringRecord, name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .with_context(|| format!("Missing required column `{}` in {}", name, path.display()))
}

/// Read `Category,Prompt` rows from a CSV file
pub fn read_prompt_rows(path: &Path) -> Result<Vec<PromptRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    let category_index = column_index(&headers, CATEGORY_COLUMN, path)?;
    let prompt_index = column_index(&headers, PROMPT_COLUMN, path)?;

    let mut rows = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error at row {} in {}", row_index, path.display()))?;
        rows.push(PromptRow {
            category: record.get(category_index).unwrap_or("").to_string(),
            prompt: record.get(prompt_index).unwrap_or("").to_string(),
        });
    }

    Ok(rows)
}

/// Write generation records as `Category,Prompt,<Model>-1..<Model>-N` rows.
/// The whole file is rewritten on every call; this is the checkpoint format.
pub fn write_generation_records(
    path: &Path,
    records: &[GenerationRecord],
    model_names: &[String],
    repeat_count: usize,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))?;

    let mut headers = vec![CATEGORY_COLUMN.to_string(), PROMPT_COLUMN.to_string()];
    for model in model_names {
        for repeat in 1..=repeat_count {
            headers.push(format!("{}-{}", model, repeat));
        }
    }
    writer
        .write_record(&headers)
        .context("Failed to write header row")?;

    for record in records {
        let mut row = vec![record.category.clone(), record.prompt.clone()];
        for model in model_names {
            for repeat in 0..repeat_count {
                let response = record
                    .responses_by_model
                    .get(model)
                    .and_then(|responses| responses.get(repeat))
                    .map(String::as_str)
                    .unwrap_or("");
                row.push(response.to_string());
            }
        }
        writer
            .write_record(&row)
            .with_context(|| format!("Failed to write row for prompt: {}", record.prompt))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush output file: {}", path.display()))
}

/// Read generation records back from the format `write_generation_records`
/// produces. Response columns are recognized by their `<Model>-<k>` suffix;
/// any other extra column is ignored.
pub fn read_generation_records(path: &Path) -> Result<Vec<GenerationRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open input file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    let category_index = column_index(&headers, CATEGORY_COLUMN, path)?;
    let prompt_index = column_index(&headers, PROMPT_COLUMN, path)?;

    // (column index, model name) for response columns, in header order;
    // the writer emits repeats in ascending order so header order is
    // request order
    let response_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|&(index, _)| index != category_index && index != prompt_index)
        .filter_map(|(index, header)| {
            header
                .rsplit_once('-')
                .filter(|(name, suffix)| !name.is_empty() && suffix.parse::<usize>().is_ok())
                .map(|(name, _)| (index, name.to_string()))
        })
        .collect();

    let mut records = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let row = result
            .with_context(|| format!("CSV parse error at row {} in {}", row_index, path.display()))?;

        let mut record = GenerationRecord::new(
            row.get(category_index).unwrap_or(""),
            row.get(prompt_index).unwrap_or(""),
        );
        for (column_index, model) in &response_columns {
            record.push_response(model, row.get(*column_index).unwrap_or("").to_string());
        }
        records.push(record);
    }

    Ok(records)
}
