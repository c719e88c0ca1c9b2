//! Per-question state machine
//!
//! A [`Turn`] folds ask events into log patches. It reads the current log
//! (to keep the searching indicator unique) but never mutates it; the caller
//! applies the returned patches.

use notebook_core::{Message, Role, StrategyPlan};

use super::log::{LogPatch, MessageLog};
use super::types::{AskStreamEvent, DEFAULT_BACKEND_ERROR};

/// Where a question is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnPhase {
    /// No question in flight
    #[default]
    Idle,
    /// Request sent, nothing received yet
    AwaitingFirstEvent,
    /// A strategy message is shown
    StreamingStrategy,
    /// The searching indicator is shown
    StreamingSearch,
    /// A final answer was appended
    Answered,
    /// The backend reported an error
    Errored,
}

/// How the last question ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Final answer received
    Answered,
    /// Backend sent an `error` event
    Errored,
    /// Transport failed (connection, non-2xx status)
    Failed,
    /// Cancelled by the caller
    Cancelled,
    /// Stream ended without an answer or an error
    Ended,
}

/// Effect of one event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnStep {
    pub patches: Vec<LogPatch>,
    /// Error to surface, if the event reported one
    pub error: Option<String>,
    /// The event marked the end of the stream
    pub end_of_stream: bool,
}

/// Event reducer for one question
#[derive(Debug, Clone)]
pub struct Turn {
    show_strategy: bool,
    phase: TurnPhase,
    plan: Option<StrategyPlan>,
    answer_id: Option<String>,
}

impl Turn {
    pub fn new(show_strategy: bool) -> Self {
        Self {
            show_strategy,
            phase: TurnPhase::AwaitingFirstEvent,
            plan: None,
            answer_id: None,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Most recent search plan seen in this turn
    pub fn plan(&self) -> Option<&StrategyPlan> {
        self.plan.as_ref()
    }

    /// Outcome if the stream ended now
    pub fn outcome(&self) -> TurnOutcome {
        match self.phase {
            TurnPhase::Answered => TurnOutcome::Answered,
            TurnPhase::Errored => TurnOutcome::Errored,
            _ => TurnOutcome::Ended,
        }
    }

    pub fn on_event(&mut self, event: AskStreamEvent, log: &MessageLog) -> TurnStep {
        let mut step = TurnStep::default();

        match event {
            AskStreamEvent::Strategy { data } => {
                let plan = data.map(|d| d.into_plan());
                match plan {
                    Some(plan) if self.show_strategy => {
                        remove_indicator(log, &mut step);
                        step.patches
                            .push(LogPatch::Append(Message::strategy(plan.clone())));
                        self.plan = Some(plan);
                        self.phase = TurnPhase::StreamingStrategy;
                    }
                    plan => {
                        if plan.is_some() {
                            self.plan = plan;
                        }
                        if !log.has_indicator() {
                            step.patches.push(LogPatch::Append(Message::searching()));
                        }
                        self.phase = TurnPhase::StreamingSearch;
                    }
                }
            }
            AskStreamEvent::Answer { .. } => {}
            AskStreamEvent::FinalAnswer { content } => {
                remove_indicator(log, &mut step);
                let mut answer = Message::ai(content, self.plan.clone());
                // Replace the earlier answer only while it is still in the log
                match self.answer_id.as_deref().filter(|id| log.get(id).is_some()) {
                    Some(id) => {
                        answer.id = id.to_string();
                        step.patches.push(LogPatch::Replace {
                            id: id.to_string(),
                            message: answer,
                        });
                    }
                    None => {
                        self.answer_id = Some(answer.id.clone());
                        step.patches.push(LogPatch::Append(answer));
                    }
                }
                self.phase = TurnPhase::Answered;
            }
            AskStreamEvent::Error { content } => {
                remove_indicator(log, &mut step);
                step.error = Some(content.unwrap_or_else(|| DEFAULT_BACKEND_ERROR.to_string()));
                self.phase = TurnPhase::Errored;
            }
            AskStreamEvent::Complete => {
                step.end_of_stream = true;
            }
        }

        step
    }
}

fn remove_indicator(log: &MessageLog, step: &mut TurnStep) {
    if log.has_indicator() {
        step.patches.push(LogPatch::RemoveRole(Role::Searching));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ask::types::StrategyData;
    use notebook_core::SearchStep;

    fn strategy(queries: &[&str]) -> AskStreamEvent {
        AskStreamEvent::Strategy {
            data: Some(StrategyData {
                reasoning: Some("plan".into()),
                searches: Some(
                    queries
                        .iter()
                        .map(|q| SearchStep {
                            search: q.to_string(),
                            instructions: "i".into(),
                        })
                        .collect(),
                ),
                source_ids: None,
            }),
        }
    }

    fn apply(log: &mut MessageLog, step: &TurnStep) {
        for patch in &step.patches {
            log.apply(patch);
        }
    }

    #[test]
    fn test_hidden_strategy_shows_indicator() {
        let mut log = MessageLog::new();
        let mut turn = Turn::new(false);

        let step = turn.on_event(strategy(&["a"]), &log);
        assert_eq!(step.patches.len(), 1);
        assert!(matches!(&step.patches[0], LogPatch::Append(m) if m.is_indicator()));
        apply(&mut log, &step);
        assert!(log.has_indicator());
        assert_eq!(turn.phase(), TurnPhase::StreamingSearch);
        assert_eq!(turn.plan().unwrap().searches[0].search, "a");
    }

    #[test]
    fn test_indicator_not_duplicated() {
        let mut log = MessageLog::new();
        let mut turn = Turn::new(false);

        let step = turn.on_event(strategy(&["a"]), &log);
        apply(&mut log, &step);
        let step = turn.on_event(strategy(&["b"]), &log);

        assert!(step.patches.is_empty());
    }

    #[test]
    fn test_shown_strategy_replaces_indicator() {
        let mut log = MessageLog::new();
        log.append(Message::searching());
        let mut turn = Turn::new(true);

        let step = turn.on_event(strategy(&["a", "b"]), &log);
        assert_eq!(step.patches[0], LogPatch::RemoveRole(Role::Searching));
        let LogPatch::Append(msg) = &step.patches[1] else {
            panic!("expected append");
        };
        assert_eq!(msg.role, Role::Strategy);
        assert_eq!(msg.content, "Searching: a, b");
        assert_eq!(turn.phase(), TurnPhase::StreamingStrategy);
    }

    #[test]
    fn test_shown_strategy_without_data_falls_back_to_indicator() {
        let log = MessageLog::new();
        let mut turn = Turn::new(true);

        let step = turn.on_event(AskStreamEvent::Strategy { data: None }, &log);
        let LogPatch::Append(msg) = &step.patches[0] else {
            panic!("expected append");
        };
        assert!(msg.is_indicator());
        assert!(turn.plan().is_none());
    }

    #[test]
    fn test_final_answer_carries_plan() {
        let mut log = MessageLog::new();
        let mut turn = Turn::new(false);
        let step = turn.on_event(strategy(&["a"]), &log);
        apply(&mut log, &step);

        let step = turn.on_event(
            AskStreamEvent::FinalAnswer {
                content: "Answer text".into(),
            },
            &log,
        );
        apply(&mut log, &step);

        assert!(!log.has_indicator());
        let answer = &log.messages()[0];
        assert_eq!(answer.role, Role::Ai);
        assert_eq!(answer.content, "Answer text");
        assert_eq!(answer.strategy.as_ref().unwrap().searches.len(), 1);
        assert_eq!(turn.outcome(), TurnOutcome::Answered);
    }

    #[test]
    fn test_second_final_answer_replaces_first() {
        let mut log = MessageLog::new();
        let mut turn = Turn::new(false);

        for content in ["first", "second"] {
            let step = turn.on_event(
                AskStreamEvent::FinalAnswer {
                    content: content.into(),
                },
                &log,
            );
            apply(&mut log, &step);
        }

        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].content, "second");
    }

    #[test]
    fn test_final_answer_after_clear_is_appended() {
        let mut log = MessageLog::new();
        let mut turn = Turn::new(false);

        let first = AskStreamEvent::FinalAnswer {
            content: "first".into(),
        };
        let step = turn.on_event(first, &log);
        apply(&mut log, &step);
        log.clear();

        let second = AskStreamEvent::FinalAnswer {
            content: "second".into(),
        };
        let step = turn.on_event(second, &log);
        assert!(matches!(&step.patches[..], [LogPatch::Append(m)] if m.content == "second"));
        apply(&mut log, &step);

        assert_eq!(log.len(), 1);
        assert_eq!(log.messages()[0].role, Role::Ai);
    }

    #[test]
    fn test_answer_event_is_ignored() {
        let log = MessageLog::new();
        let mut turn = Turn::new(true);
        let step = turn.on_event(
            AskStreamEvent::Answer {
                content: Some("partial".into()),
            },
            &log,
        );
        assert_eq!(step, TurnStep::default());
        assert_eq!(turn.phase(), TurnPhase::AwaitingFirstEvent);
    }

    #[test]
    fn test_error_event() {
        let mut log = MessageLog::new();
        log.append(Message::searching());
        let mut turn = Turn::new(false);

        let step = turn.on_event(AskStreamEvent::Error { content: None }, &log);
        assert_eq!(step.patches, vec![LogPatch::RemoveRole(Role::Searching)]);
        assert_eq!(step.error.as_deref(), Some(DEFAULT_BACKEND_ERROR));
        assert_eq!(turn.outcome(), TurnOutcome::Errored);
    }

    #[test]
    fn test_complete_ends_stream() {
        let log = MessageLog::new();
        let mut turn = Turn::new(false);
        let step = turn.on_event(AskStreamEvent::Complete, &log);
        assert!(step.end_of_stream);
        assert!(step.patches.is_empty());
        assert_eq!(turn.outcome(), TurnOutcome::Ended);
    }
}
