use anyhow::{anyhow, Context};
use lodestar_protocol::prelude::*;
use tracing::info;

/// Fetch and print the server's research history, newest first.
pub async fn show_history(server: &str, limit: Option<usize>) -> Result<(), anyhow::Error> {
    let url = format!("{}/api/history", server.trim_end_matches('/'));

    let response = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .context("Failed to send history request")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to fetch history (status code: {})",
            response.status()
        ));
    }

    let history: HistoryResponse = response
        .json()
        .await
        .context("Failed to parse history response")?;

    if let Some(error) = history.error {
        return Err(anyhow!("Server could not retrieve history: {}", error));
    }

    let entries = history.history.unwrap_or_default();
    if entries.is_empty() {
        info!("No history yet. Run a research query to start.");
        return Ok(());
    }

    let shown = limit.unwrap_or(entries.len());
    for entry in entries.iter().take(shown) {
        println!("{}  {}", entry.timestamp.to_rfc3339(), entry.query);
        println!("    {}", report_excerpt(&entry.report, 120));
    }

    Ok(())
}

/// First non-empty line of a report, truncated on a char boundary.
fn report_excerpt(report: &str, max_chars: usize) -> String {
    let line = report
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if line.chars().count() <= max_chars {
        line.to_string()
    } else {
        let truncated: String = line.chars().take(max_chars).collect();
        format!("{truncated}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_takes_first_non_empty_line() {
        let report = "\n\n# Findings\n\nbody";
        assert_eq!(report_excerpt(report, 120), "# Findings");
    }

    #[test]
    fn test_excerpt_truncates_long_lines() {
        let report = "a".repeat(200);
        let excerpt = report_excerpt(&report, 120);
        assert!(excerpt.starts_with(&"a".repeat(120)));
        assert!(excerpt.ends_with('…'));
    }

    #[test]
    fn test_excerpt_of_empty_report() {
        assert_eq!(report_excerpt("", 120), "");
    }
}
