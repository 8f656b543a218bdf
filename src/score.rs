use crate::models::ScoreResult;
use anyhow::{Context, Result};
use regex::Regex;
use std::sync::OnceLock;

fn score_pattern() -> &'static Regex {
    static SCORE_RE: OnceLock<Regex> = OnceLock::new();
    SCORE_RE.get_or_init(|| {
        Regex::new(r"(?i)score:?\s*(\d+(?:\.\d+)?)").expect("score pattern is valid")
    })
}

/// Extract a score from a free-text judge reply.
///
/// Matches a case-insensitive `Score: N` marker; the explanation is the
/// reply with the matched substring removed. A reply with no marker never
/// fails: the score defaults to 0.0 and the explanation carries the full
/// reply text so the unparsed output stays inspectable.
pub fn parse_free_text(reply: &str) -> ScoreResult {
    match score_pattern().captures(reply) {
        Some(captures) => {
            let matched = captures.get(0).map(|m| m.as_str()).unwrap_or("");
            let score = captures
                .get(1)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0);
            let explanation = reply.replacen(matched, "", 1).trim().to_string();
            ScoreResult { score, explanation }
        }
        None => ScoreResult {
            score: 0.0,
            explanation: reply.to_string(),
        },
    }
}

/// Extract a score from a JSON-shaped judge reply, tolerating leading and
/// trailing prose around the object. Fails if no object is found or the
/// `score`/`explanation` fields are absent or mistyped.
pub fn parse_structured(reply: &str) -> Result<ScoreResult> {
    let start = reply.find('{').context("No JSON object found in reply")?;
    let end = reply
        .rfind('}')
        .context("Found opening brace but no closing brace in reply")?;

    let parsed: serde_json::Value =
        serde_json::from_str(&reply[start..=end]).context("Failed to parse extracted JSON")?;

    let score = parsed
        .get("score")
        .and_then(|s| s.as_f64())
        .context("Reply JSON is missing a numeric `score` field")?;

    let explanation = parsed
        .get("explanation")
        .and_then(|e| e.as_str())
        .context("Reply JSON is missing a string `explanation` field")?
        .to_string();

    Ok(ScoreResult { score, explanation })
}
