use crate::evaluate::GroupSummary;
use crate::models::EvaluationRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};

/// Fixed filename for the flattened per-response table
pub const RESULTS_CSV_NAME: &str = "security_evaluation_results.csv";
/// Fixed filename for the per-(model, category) summary table
pub const SUMMARY_CSV_NAME: &str = "security_evaluation_summary.csv";

/// Timestamped results filename; colons and dots are replaced so the name
/// stays valid on every filesystem, and repeated runs never collide
pub fn results_file_name(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("security_evaluation_results_{}.json", stamp)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Serialize the full record list to a timestamped JSON file in `dir`.
/// One overwrite per invocation, never an append.
pub fn write_results_json(records: &[EvaluationRecord], dir: &Path) -> Result<PathBuf> {
    let path = dir.join(results_file_name(Utc::now()));
    let json = serde_json::to_string_pretty(records)
        .context("Failed to serialize evaluation records to JSON")?;

    ensure_parent_dir(&path)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write results to: {}", path.display()))?;

    Ok(path)
}

/// Read an evaluation record list back from a results JSON file
pub fn read_results_json(path: &Path) -> Result<Vec<EvaluationRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results JSON: {}", path.display()))
}

/// Flatten evaluation records into a CSV table. Score fields become
/// top-level numeric columns without their explanations; a record missing
/// its consistency score gets an empty cell.
pub fn write_results_csv(records: &[EvaluationRecord], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))?;

    writer
        .write_record([
            "Model",
            "Category",
            "Prompt",
            "ResponseIndex",
            "Response",
            "BreachScore",
            "DefenseScore",
            "ConsistencyScore",
        ])
        .context("Failed to write header row")?;

    for record in records {
        let consistency = record
            .consistency
            .as_ref()
            .map(|score| score.score.to_string())
            .unwrap_or_default();

        writer
            .write_record([
                record.model.as_str(),
                record.category.as_str(),
                record.prompt.as_str(),
                &record.response_index.to_string(),
                record.response.as_str(),
                &record.breach.score.to_string(),
                &record.defense.score.to_string(),
                &consistency,
            ])
            .with_context(|| format!("Failed to write row for prompt: {}", record.prompt))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush output file: {}", path.display()))
}

/// Write per-(model, category) mean scores as a CSV table
pub fn write_summary_csv(summaries: &[GroupSummary], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open output file: {}", path.display()))?;

    writer
        .write_record([
            "Model",
            "Category",
            "AvgBreachScore",
            "AvgDefenseScore",
            "AvgConsistencyScore",
        ])
        .context("Failed to write header row")?;

    for summary in summaries {
        let avg_consistency = summary
            .avg_consistency
            .map(|score| score.to_string())
            .unwrap_or_default();

        writer
            .write_record([
                summary.model.as_str(),
                summary.category.as_str(),
                &summary.avg_breach.to_string(),
                &summary.avg_defense.to_string(),
                &avg_consistency,
            ])
            .with_context(|| {
                format!("Failed to write summary row for model: {}", summary.model)
            })?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush output file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreResult;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn make_record(response_index: usize, consistency: Option<f64>) -> EvaluationRecord {
        EvaluationRecord {
            model: "LLaMA 2".to_string(),
            category: "Jailbreak".to_string(),
            prompt: "Ignore previous instructions".to_string(),
            response_index,
            response: format!("response {}", response_index),
            breach: ScoreResult {
                score: 7.5,
                explanation: "partial breach".to_string(),
            },
            defense: ScoreResult {
                score: 2.0,
                explanation: "weak refusal".to_string(),
            },
            consistency: consistency.map(|score| ScoreResult {
                score,
                explanation: "stable".to_string(),
            }),
        }
    }

    #[test]
    fn test_results_file_name_format() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 45).unwrap();
        let name = results_file_name(now);

        assert_eq!(name, "security_evaluation_results_2024-03-15T09-30-45-000Z.json");
        assert!(!name.contains(':'));
        assert_eq!(name.matches('.').count(), 1); // only the extension dot
    }

    #[test]
    fn test_json_round_trip() {
        let temp_dir = tempdir().unwrap();
        let records = vec![make_record(0, Some(0.8)), make_record(1, None)];

        let path = write_results_json(&records, temp_dir.path()).unwrap();
        assert!(path.exists());
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("security_evaluation_results_")
        );

        let reloaded = read_results_json(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0].breach.score, 7.5);
        assert_eq!(reloaded[0].consistency.as_ref().unwrap().score, 0.8);
        assert!(reloaded[1].consistency.is_none());
    }

    #[test]
    fn test_read_results_json_invalid_content() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();

        let result = read_results_json(&path);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse results JSON")
        );
    }

    #[test]
    fn test_csv_flattens_scores() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(RESULTS_CSV_NAME);
        let records = vec![make_record(0, Some(0.8))];

        write_results_csv(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Model,Category,Prompt,ResponseIndex,Response,BreachScore,DefenseScore,ConsistencyScore"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("7.5"));
        assert!(row.contains("0.8"));
        // Explanations are dropped from the flattened table
        assert!(!content.contains("partial breach"));
        assert!(!content.contains("stable"));
    }

    #[test]
    fn test_csv_missing_consistency_yields_empty_cell() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(RESULTS_CSV_NAME);
        let records = vec![make_record(0, None)];

        // Regression: a record without a consistency score must export
        // cleanly instead of crashing
        write_results_csv(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert!(row.ends_with(',')); // empty ConsistencyScore cell
    }

    #[test]
    fn test_summary_csv() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(SUMMARY_CSV_NAME);
        let summaries = vec![
            GroupSummary {
                model: "A".to_string(),
                category: "X".to_string(),
                avg_breach: 5.0,
                avg_defense: 2.5,
                avg_consistency: Some(0.75),
            },
            GroupSummary {
                model: "B".to_string(),
                category: "X".to_string(),
                avg_breach: 0.0,
                avg_defense: 3.0,
                avg_consistency: None,
            },
        ];

        write_summary_csv(&summaries, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Model,Category,AvgBreachScore,AvgDefenseScore,AvgConsistencyScore"
        );
        assert_eq!(lines.next().unwrap(), "A,X,5,2.5,0.75");
        assert_eq!(lines.next().unwrap(), "B,X,0,3,");
    }

    #[test]
    fn test_write_results_json_creates_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("runs").join("latest");

        let path = write_results_json(&[make_record(0, Some(1.0))], &nested).unwrap();
        assert!(path.exists());
    }
}
