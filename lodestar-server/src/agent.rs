use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::error::AgentError;
use crate::extract::{extract_text, truncate_chars, MAX_CONTENT_CHARS};
use crate::progress::ProgressSender;
use crate::providers::{PageFetcher, SearchProvider, TextGenerator};

/// One source's relevance-filtered content
struct SourceExtract {
    url: String,
    content: String,
}

/// One source's summary, input to the final report
struct SourceSummary {
    url: String,
    summary: String,
}

/// The research pipeline: search, extract, summarize, generate.
///
/// Progress is pushed through a [`ProgressSender`] as the pipeline runs;
/// the progress texts are part of the client contract (clients classify
/// them by keyword), so changing their wording is a protocol change.
pub struct ResearchAgent {
    search: Arc<dyn SearchProvider>,
    generator: Arc<dyn TextGenerator>,
    fetcher: Arc<dyn PageFetcher>,
    max_sources: usize,
}

impl ResearchAgent {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        generator: Arc<dyn TextGenerator>,
        fetcher: Arc<dyn PageFetcher>,
        max_sources: usize,
    ) -> Self {
        Self {
            search,
            generator,
            fetcher,
            max_sources,
        }
    }

    /// Run the full pipeline for one query, returning the report as
    /// Markdown. Sources that fail to fetch, extract or summarize are
    /// skipped; the operation only fails when nothing usable remains.
    #[instrument(skip(self, progress))]
    pub async fn run(&self, query: &str, progress: &ProgressSender) -> Result<String, AgentError> {
        progress.update("Searching for sources...").await;
        let urls = self.search.search(query, self.max_sources).await?;
        if urls.is_empty() {
            return Err(AgentError::NoSources);
        }
        info!(count = urls.len(), "discovered sources");

        progress
            .update_with_urls(
                format!("Extracting content from {} sources", urls.len()),
                urls.clone(),
            )
            .await;

        let mut extracts = Vec::new();
        for url in &urls {
            match self.extract_relevant(url, query).await {
                Ok(content) => {
                    progress.update(format!("Extracted content from {url}")).await;
                    extracts.push(SourceExtract {
                        url: url.clone(),
                        content,
                    });
                }
                Err(error) => {
                    warn!(url = %url, %error, "skipping source");
                    progress.update(format!("Skipped {url} ({error})")).await;
                }
            }
        }
        if extracts.is_empty() {
            return Err(AgentError::NoSources);
        }

        progress.update("Summarizing findings...").await;
        let mut summaries = Vec::new();
        for extract in &extracts {
            match self
                .generator
                .generate(&summary_prompt(query, &extract.content))
                .await
            {
                Ok(summary) => {
                    progress.update(format!("Summarized {}", extract.url)).await;
                    summaries.push(SourceSummary {
                        url: extract.url.clone(),
                        summary,
                    });
                }
                Err(error) => {
                    warn!(url = %extract.url, %error, "failed to summarize source");
                }
            }
        }
        if summaries.is_empty() {
            return Err(AgentError::NoSources);
        }

        progress.update("Generating final report...").await;
        let report = self
            .generator
            .generate(&report_prompt(query, &summaries))
            .await?;

        info!("report generated");
        Ok(report)
    }

    /// Fetch one source and reduce it to content relevant to the query.
    async fn extract_relevant(&self, url: &str, query: &str) -> Result<String, AgentError> {
        let html = self.fetcher.fetch(url).await?;
        let text = extract_text(&html);
        if text.trim().is_empty() {
            return Err(AgentError::Fetch {
                url: url.to_string(),
                reason: "no extractable content".to_string(),
            });
        }

        let text = truncate_chars(&text, MAX_CONTENT_CHARS);
        debug!(url, chars = text.len(), "extracted page text");

        self.generator
            .generate(&extraction_prompt(query, text))
            .await
    }
}

fn extraction_prompt(query: &str, text: &str) -> String {
    format!(
        "Extract only the most relevant information to the query '{query}' from this text. \
         Be concise and include key points only, nothing extra or irrelevant:\n\n{text}"
    )
}

fn summary_prompt(query: &str, content: &str) -> String {
    format!(
        "Summarize this relevant content for the query '{query}' in a few key points:\n\n{content}"
    )
}

fn report_prompt(query: &str, summaries: &[SourceSummary]) -> String {
    let mut prompt = format!(
        "Create a short, structured report for the query '{query}' based on these source \
         summaries. Use bullet points for key findings and include source links at the end:"
    );
    for summary in summaries {
        prompt.push_str(&format!(
            "\n\nSource: {}\nSummary: {}",
            summary.url, summary.summary
        ));
    }
    prompt
}
