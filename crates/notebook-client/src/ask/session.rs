//! Streaming ask client
//!
//! [`AskClient`] drives one question at a time against an [`AskTransport`]
//! and keeps the resulting conversation log. All state sits behind one lock
//! that is never held across an `.await`, so `cancel`, `clear` and the
//! readers can be called from other tasks while `submit` is running.

use futures::StreamExt;
use notebook_core::{Message, Role};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use super::log::{LogPatch, MessageLog};
use super::stream::AskTransport;
use super::turn::{Turn, TurnOutcome, TurnPhase};
use super::types::{AskStreamEvent, StreamError};

/// Error shown when the transport fails; details only go to the log
pub const GENERIC_ASK_ERROR: &str = "Failed to get an answer. Please try again.";

const DEFAULT_PATCH_CAPACITY: usize = 256;

/// Behaviour switches for [`AskClient`]
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Show the backend's search plan instead of a searching indicator
    pub show_strategy: bool,
    /// Buffered patches per subscriber before slow readers lag
    pub patch_capacity: usize,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            show_strategy: false,
            patch_capacity: DEFAULT_PATCH_CAPACITY,
        }
    }
}

struct InFlight {
    generation: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct AskState {
    log: MessageLog,
    busy: bool,
    error: Option<String>,
    phase: TurnPhase,
    last_outcome: Option<TurnOutcome>,
    in_flight: Option<InFlight>,
    generation: u64,
}

impl AskState {
    fn is_current(&self, generation: u64) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| f.generation == generation)
    }
}

enum RunEnd {
    Finished(TurnOutcome),
    Cancelled,
    Failed(StreamError),
}

/// Question/answer client over a server-sent event stream
pub struct AskClient<T> {
    transport: T,
    options: AskOptions,
    state: Mutex<AskState>,
    patches: broadcast::Sender<LogPatch>,
}

impl<T: AskTransport> AskClient<T> {
    pub fn new(transport: T, options: AskOptions) -> Self {
        let (patches, _) = broadcast::channel(options.patch_capacity.max(1));
        Self {
            transport,
            options,
            state: Mutex::new(AskState::default()),
            patches,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Snapshot of the conversation log
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().log.messages().to_vec()
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    /// Error of the last question, if it failed
    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn phase(&self) -> TurnPhase {
        self.state.lock().phase
    }

    /// How the last finished question ended
    pub fn last_outcome(&self) -> Option<TurnOutcome> {
        self.state.lock().last_outcome
    }

    /// Receive every log patch from now on, in application order
    pub fn subscribe(&self) -> broadcast::Receiver<LogPatch> {
        self.patches.subscribe()
    }

    /// Ask a question and stream the answer into the log.
    ///
    /// Blank questions and calls made while another question is in flight
    /// are ignored. Failures never escape: they end up in [`error`](Self::error).
    #[instrument(skip(self))]
    pub async fn submit(&self, question: &str) {
        let question = question.trim();
        if question.is_empty() {
            return;
        }

        let (generation, token) = {
            let mut state = self.state.lock();
            if state.busy {
                debug!("Question already in flight, ignoring submit");
                return;
            }

            state.generation += 1;
            let generation = state.generation;
            let token = CancellationToken::new();

            state.error = None;
            state.busy = true;
            state.phase = TurnPhase::AwaitingFirstEvent;
            state.in_flight = Some(InFlight {
                generation,
                token: token.clone(),
            });
            self.apply(&mut state, LogPatch::Append(Message::human(question)));

            (generation, token)
        };

        let end = self.run(question, generation, &token).await;
        self.finish(generation, end);
    }

    /// Abort the question in flight, if any.
    ///
    /// Returns to idle immediately; the pending `submit` notices the
    /// cancellation at its next suspension point and leaves the log alone.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        let Some(in_flight) = state.in_flight.take() else {
            return;
        };

        debug!(generation = in_flight.generation, "Cancelling question");
        in_flight.token.cancel();
        state.busy = false;
        state.phase = TurnPhase::Idle;
        state.last_outcome = Some(TurnOutcome::Cancelled);
        self.apply(&mut state, LogPatch::RemoveRole(Role::Searching));
    }

    /// Empty the log and forget the last error.
    ///
    /// Does not touch a question in flight; call [`cancel`](Self::cancel)
    /// first to drop it.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.error = None;
        self.apply(&mut state, LogPatch::Clear);
    }

    /// Replace the log wholesale, e.g. with a stored conversation
    pub fn load_messages(&self, messages: Vec<Message>) {
        let mut state = self.state.lock();
        self.apply(&mut state, LogPatch::ReplaceAll(messages));
    }

    async fn run(&self, question: &str, generation: u64, token: &CancellationToken) -> RunEnd {
        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return RunEnd::Cancelled,
            opened = self.transport.open(question, token) => opened,
        };

        let mut events = match opened {
            Ok(events) => events,
            Err(StreamError::Cancelled) => return RunEnd::Cancelled,
            Err(e) => return RunEnd::Failed(e),
        };

        let mut turn = Turn::new(self.options.show_strategy);

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return RunEnd::Cancelled,
                next = events.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(StreamError::Cancelled)) => return RunEnd::Cancelled,
                Some(Err(e)) => return RunEnd::Failed(e),
                None => return RunEnd::Finished(turn.outcome()),
            };

            if self.on_event(generation, &mut turn, event) {
                return RunEnd::Finished(turn.outcome());
            }
        }
    }

    /// Apply one event; returns true at end of stream
    fn on_event(&self, generation: u64, turn: &mut Turn, event: AskStreamEvent) -> bool {
        let mut state = self.state.lock();
        if !state.is_current(generation) {
            return true;
        }

        debug!(kind = event.kind(), "Ask event");
        let step = turn.on_event(event, &state.log);
        for patch in step.patches {
            self.apply(&mut state, patch);
        }
        if let Some(message) = step.error {
            state.error = Some(message);
        }
        state.phase = turn.phase();

        step.end_of_stream
    }

    fn finish(&self, generation: u64, end: RunEnd) {
        let mut state = self.state.lock();
        if !state.is_current(generation) {
            // cancel() already cleaned up, and a newer question may own the log
            debug!(generation, "Question finished after cancellation");
            return;
        }

        let outcome = match end {
            RunEnd::Finished(outcome) => outcome,
            RunEnd::Cancelled => TurnOutcome::Cancelled,
            RunEnd::Failed(e) => {
                error!("Ask failed: {}", e);
                state.error = Some(GENERIC_ASK_ERROR.to_string());
                TurnOutcome::Failed
            }
        };

        self.apply(&mut state, LogPatch::RemoveRole(Role::Searching));
        state.busy = false;
        state.in_flight = None;
        state.phase = TurnPhase::Idle;
        state.last_outcome = Some(outcome);
    }

    fn apply(&self, state: &mut AskState, patch: LogPatch) {
        if state.log.apply(&patch) {
            // no receivers is fine
            let _ = self.patches.send(patch);
        }
    }
}
