use lodestar_protocol::StreamMessage;
use tracing::debug;

use crate::render::markdown_to_html;
use crate::stage::{Stage, StageState, StageStatus};
use crate::view::ViewCommand;

/// Status text shown for the Discovery stage before the first server
/// message arrives.
pub const INITIAL_MESSAGE: &str = "Discovering relevant links...";

/// Keyword table used to classify free-text progress messages.
///
/// Checked in order, first match wins, matching is a case-sensitive
/// substring test. A message matching no keyword is dropped without any
/// state change.
const STAGE_KEYWORDS: &[(&str, Stage)] = &[
    ("Searching", Stage::Discovery),
    ("Extracting", Stage::Extraction),
    ("Extracted", Stage::Extraction),
    ("Skipped", Stage::Extraction),
    ("Summarizing", Stage::Summarization),
    ("Summarized", Stage::Summarization),
    ("Generating", Stage::Generation),
];

/// Lifecycle of one interpreter session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No session started yet
    Idle,
    /// A stream is being consumed
    Streaming,
    /// Terminal: the final report was rendered
    Done,
    /// Terminal: the session failed
    Failed,
}

/// Pure state machine turning stream messages into view commands.
///
/// One interpreter tracks exactly one query's progress. It never performs
/// I/O and never retries; it only classifies messages and emits commands.
/// After a terminal message (`Report` or `Error`) every further message is
/// discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInterpreter {
    stages: [StageState; 4],
    phase: Phase,
    active: Option<Stage>,
}

impl Default for ProgressInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressInterpreter {
    pub fn new() -> Self {
        Self {
            stages: Stage::ALL.map(StageState::pending),
            phase: Phase::Idle,
            active: None,
        }
    }

    /// Start a session: clears the view and forces Discovery active with a
    /// fixed initial message, before any server message has arrived.
    pub fn begin(&mut self) -> Vec<ViewCommand> {
        self.stages = Stage::ALL.map(StageState::pending);
        self.phase = Phase::Streaming;
        self.active = Some(Stage::Discovery);

        let state = &mut self.stages[Stage::Discovery.index()];
        state.status = StageStatus::Active;
        state.last_message = INITIAL_MESSAGE.to_string();

        vec![
            ViewCommand::Reset,
            ViewCommand::SetStage {
                stage: Stage::Discovery,
                status: StageStatus::Active,
                message: INITIAL_MESSAGE.to_string(),
            },
        ]
    }

    /// Process one inbound message, returning the view commands it produces.
    ///
    /// Returns an empty batch for unknown message types, unclassifiable
    /// progress text, and anything arriving after a terminal message.
    pub fn apply(&mut self, message: &StreamMessage) -> Vec<ViewCommand> {
        if self.is_terminal() {
            debug!("discarding message received after terminal state");
            return Vec::new();
        }

        match message {
            StreamMessage::Progress { message, details } => {
                let Some(target) = classify(message) else {
                    debug!(text = %message, "progress message matched no stage keyword");
                    return Vec::new();
                };

                let items = details.as_ref().map(|d| d.urls.as_slice()).unwrap_or(&[]);
                self.advance(target, message, items)
            }
            StreamMessage::Report { report } => {
                self.phase = Phase::Done;

                let mut commands = Vec::new();
                for state in self.stages.iter_mut() {
                    if state.status != StageStatus::Complete {
                        state.status = StageStatus::Complete;
                        commands.push(ViewCommand::SetStage {
                            stage: state.stage,
                            status: StageStatus::Complete,
                            message: state.last_message.clone(),
                        });
                    }
                }
                commands.push(ViewCommand::RenderReport {
                    html: markdown_to_html(report),
                });
                commands
            }
            StreamMessage::Error { message } => {
                self.phase = Phase::Failed;
                vec![ViewCommand::RenderError {
                    message: message.clone(),
                }]
            }
            StreamMessage::Unknown => Vec::new(),
        }
    }

    /// Whether the session accepted a terminal message
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Done | Phase::Failed)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The stage currently marked active, if any
    pub fn active_stage(&self) -> Option<Stage> {
        self.active
    }

    /// Current per-stage state, in execution order
    pub fn stages(&self) -> &[StageState; 4] {
        &self.stages
    }

    fn advance(&mut self, target: Stage, text: &str, items: &[String]) -> Vec<ViewCommand> {
        self.phase = Phase::Streaming;
        let mut commands = Vec::new();

        let current = self.active.map(|stage| stage.index());
        let forward = current.map_or(true, |index| target.index() > index);

        if forward {
            // Monotonic progression: everything below the target is complete
            // even if its own message never arrived.
            for state in &mut self.stages[..target.index()] {
                if state.status != StageStatus::Complete {
                    state.status = StageStatus::Complete;
                    commands.push(ViewCommand::SetStage {
                        stage: state.stage,
                        status: StageStatus::Complete,
                        message: state.last_message.clone(),
                    });
                }
            }

            let state = &mut self.stages[target.index()];
            state.status = StageStatus::Active;
            state.last_message = text.to_string();
            self.active = Some(target);

            commands.push(ViewCommand::SetStage {
                stage: target,
                status: StageStatus::Active,
                message: text.to_string(),
            });
        } else {
            // Status refresh for the active stage or a stray late message
            // for an earlier one; Complete marks are never reverted.
            let state = &mut self.stages[target.index()];
            state.last_message = text.to_string();

            commands.push(ViewCommand::SetStage {
                stage: target,
                status: state.status,
                message: text.to_string(),
            });
        }

        let total = items.len();
        for (position, item) in items.iter().enumerate() {
            commands.push(ViewCommand::AppendSubStatus {
                stage: target,
                text: format!("Processing {}/{}: {}", position + 1, total, item),
            });
        }

        commands
    }
}

/// Map free-text progress to its target stage, or `None` if no keyword
/// matches.
fn classify(text: &str) -> Option<Stage> {
    STAGE_KEYWORDS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, stage)| *stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestar_protocol::ProgressDetails;
    use rstest::rstest;

    fn progress(text: &str) -> StreamMessage {
        StreamMessage::Progress {
            message: text.to_string(),
            details: None,
        }
    }

    fn progress_with_urls(text: &str, urls: &[&str]) -> StreamMessage {
        StreamMessage::Progress {
            message: text.to_string(),
            details: Some(ProgressDetails {
                urls: urls.iter().map(|url| url.to_string()).collect(),
            }),
        }
    }

    fn started() -> ProgressInterpreter {
        let mut interpreter = ProgressInterpreter::new();
        interpreter.begin();
        interpreter
    }

    #[rstest]
    #[case("Searching for sources", Stage::Discovery)]
    #[case("Extracting content from http://a", Stage::Extraction)]
    #[case("Extracted 3 pages", Stage::Extraction)]
    #[case("Skipped http://b (fetch failed)", Stage::Extraction)]
    #[case("Summarizing findings", Stage::Summarization)]
    #[case("Summarized 2 sources", Stage::Summarization)]
    #[case("Generating final report", Stage::Generation)]
    fn test_keyword_classification(#[case] text: &str, #[case] expected: Stage) {
        assert_eq!(classify(text), Some(expected));
    }

    #[rstest]
    #[case("unrelated chatter")]
    #[case("searching lowercase does not match")]
    #[case("")]
    fn test_unmatched_text_has_no_stage(#[case] text: &str) {
        assert_eq!(classify(text), None);
    }

    #[test]
    fn test_begin_forces_discovery_active() {
        let mut interpreter = ProgressInterpreter::new();
        let commands = interpreter.begin();

        assert_eq!(commands[0], ViewCommand::Reset);
        assert_eq!(
            commands[1],
            ViewCommand::SetStage {
                stage: Stage::Discovery,
                status: StageStatus::Active,
                message: INITIAL_MESSAGE.to_string(),
            }
        );
        assert_eq!(interpreter.active_stage(), Some(Stage::Discovery));
        assert_eq!(interpreter.phase(), Phase::Streaming);
    }

    #[test]
    fn test_full_session_completes_all_stages() {
        let mut interpreter = started();

        interpreter.apply(&progress("Searching for sources"));
        interpreter.apply(&progress("Extracted 3 pages"));
        interpreter.apply(&progress("Summarizing findings"));
        interpreter.apply(&progress("Generating final report"));
        let commands = interpreter.apply(&StreamMessage::Report {
            report: "# Result\n\n- done".to_string(),
        });

        assert_eq!(interpreter.phase(), Phase::Done);
        for state in interpreter.stages() {
            assert_eq!(state.status, StageStatus::Complete, "{:?}", state.stage);
        }

        let ViewCommand::RenderReport { html } = commands.last().unwrap() else {
            panic!("expected final command to render the report");
        };
        assert!(html.contains("<h1>Result</h1>"));
    }

    #[test]
    fn test_forward_jump_completes_skipped_stages() {
        let mut interpreter = started();

        // Extraction's own message never arrives.
        let commands = interpreter.apply(&progress("Summarizing findings"));

        let stages = interpreter.stages();
        assert_eq!(stages[0].status, StageStatus::Complete);
        assert_eq!(stages[1].status, StageStatus::Complete);
        assert_eq!(stages[2].status, StageStatus::Active);
        assert_eq!(stages[3].status, StageStatus::Pending);
        assert_eq!(interpreter.active_stage(), Some(Stage::Summarization));

        // Complete marks for both skipped stages, then the active one.
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn test_late_message_does_not_revert_complete() {
        let mut interpreter = started();

        interpreter.apply(&progress("Summarizing findings"));
        let commands = interpreter.apply(&progress("Searching again for more sources"));

        let stages = interpreter.stages();
        assert_eq!(stages[0].status, StageStatus::Complete);
        assert_eq!(stages[0].last_message, "Searching again for more sources");
        assert_eq!(interpreter.active_stage(), Some(Stage::Summarization));

        assert_eq!(
            commands,
            vec![ViewCommand::SetStage {
                stage: Stage::Discovery,
                status: StageStatus::Complete,
                message: "Searching again for more sources".to_string(),
            }]
        );
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let mut interpreter = started();

        interpreter.apply(&progress("Extracting content"));
        let once = interpreter.clone();
        interpreter.apply(&progress("Extracting content"));

        assert_eq!(interpreter, once);
    }

    #[test]
    fn test_sub_status_items_in_order() {
        let mut interpreter = started();

        let commands =
            interpreter.apply(&progress_with_urls("Extracting content", &["http://a", "http://b"]));

        assert_eq!(interpreter.active_stage(), Some(Stage::Extraction));

        let sub: Vec<_> = commands
            .iter()
            .filter_map(|command| match command {
                ViewCommand::AppendSubStatus { stage, text } => Some((*stage, text.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            sub,
            vec![
                (Stage::Extraction, "Processing 1/2: http://a".to_string()),
                (Stage::Extraction, "Processing 2/2: http://b".to_string()),
            ]
        );
    }

    #[test]
    fn test_unmatched_progress_leaves_state_unchanged() {
        let mut interpreter = started();
        let before = interpreter.clone();

        let commands = interpreter.apply(&progress("unrelated chatter"));

        assert!(commands.is_empty());
        assert_eq!(interpreter, before);
    }

    #[test]
    fn test_unknown_message_is_a_no_op() {
        let mut interpreter = started();
        let before = interpreter.clone();

        let commands = interpreter.apply(&StreamMessage::Unknown);

        assert!(commands.is_empty());
        assert_eq!(interpreter, before);
    }

    #[test]
    fn test_error_is_terminal_and_absorbs_later_messages() {
        let mut interpreter = started();
        interpreter.apply(&progress("Extracting content"));

        let commands = interpreter.apply(&StreamMessage::Error {
            message: "quota exceeded".to_string(),
        });
        assert_eq!(
            commands,
            vec![ViewCommand::RenderError {
                message: "quota exceeded".to_string(),
            }]
        );
        assert_eq!(interpreter.phase(), Phase::Failed);

        let after_terminal = interpreter.clone();
        assert!(interpreter.apply(&progress("Generating final report")).is_empty());
        assert!(interpreter
            .apply(&StreamMessage::Report {
                report: "# too late".to_string(),
            })
            .is_empty());
        assert_eq!(interpreter, after_terminal);
    }

    #[test]
    fn test_report_is_terminal() {
        let mut interpreter = started();

        interpreter.apply(&StreamMessage::Report {
            report: "# early".to_string(),
        });
        assert_eq!(interpreter.phase(), Phase::Done);

        let after_terminal = interpreter.clone();
        assert!(interpreter.apply(&progress("Searching for sources")).is_empty());
        assert_eq!(interpreter, after_terminal);
    }
}
