use serde::{Deserialize, Serialize};

/// The four phases of a research operation, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Finding candidate sources for the query
    Discovery,
    /// Fetching and extracting content from each source
    Extraction,
    /// Summarizing the extracted content per source
    Summarization,
    /// Generating the final structured report
    Generation,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 4] = [
        Stage::Discovery,
        Stage::Extraction,
        Stage::Summarization,
        Stage::Generation,
    ];

    /// Zero-based position in the execution order
    pub fn index(self) -> usize {
        self as usize
    }

    /// One-based stage number as shown to users (1..=4)
    pub fn number(self) -> usize {
        self.index() + 1
    }

    /// Human-readable stage name
    pub fn label(self) -> &'static str {
        match self {
            Stage::Discovery => "Discovery",
            Stage::Extraction => "Extraction",
            Stage::Summarization => "Summarization",
            Stage::Generation => "Generation",
        }
    }
}

/// Display status of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started
    Pending,
    /// Stage is currently running
    Active,
    /// Stage has finished
    Complete,
}

/// Per-stage record tracked by the interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageState {
    pub stage: Stage,
    pub status: StageStatus,
    /// Most recent progress text attributed to this stage
    pub last_message: String,
}

impl StageState {
    pub fn pending(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Pending,
            last_message: String::new(),
        }
    }
}
