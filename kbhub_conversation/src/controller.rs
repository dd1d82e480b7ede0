//! Conversation controller.
//!
//! The controller owns the transcript, the loading flag, the pending input
//! and the active persona. A submission appends a placeholder entry right
//! away, then asks the answering service on a background task and settles
//! that same entry (by id) when the reply or the failure arrives.
//!
//! Each `reset` starts a new generation. Replies that belong to an older
//! generation are dropped without touching the transcript or the session.

use crate::lane::{ExchangeLane, LaneTurn};
use crate::transcript::{EntryId, EntryStatus, Transcript, TranscriptEntry};
use kbhub_core::{
    Answer, AnsweringService, AskRequest, Persona, SessionStore, SessionToken, Source,
    SubmissionPolicy,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Answer shown in place of a reply when the service fails.
pub const ERROR_ANSWER: &str = "Received an error from the Knowledge Hub. Check the log output.";

/// Configuration for a conversation controller.
#[derive(Debug, Clone, Default)]
pub struct ConversationConfig {
    /// Persona used until the caller changes it
    pub persona: Persona,
    /// Behavior when a question is submitted while another is in flight
    pub policy: SubmissionPolicy,
}

impl ConversationConfig {
    #[must_use]
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: SubmissionPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Reasons a submission is refused before anything changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Still waiting for the answer to the previous question")]
    Busy,
}

/// How a submission cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Answered,
    /// The service failed and the entry holds [`ERROR_ANSWER`].
    Failed,
    /// The conversation was reset before the cycle settled.
    Discarded,
}

/// Everything a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationView {
    pub transcript: Transcript,
    pub loading: bool,
    pub pending_input: String,
    pub persona: Persona,
    /// Cause of the most recent failed request, for diagnostics
    pub last_error: Option<String>,
}

/// An accepted submission.
#[derive(Debug)]
pub struct Submission {
    id: EntryId,
    task: JoinHandle<Settlement>,
}

impl Submission {
    /// Id of the transcript entry this submission settles.
    #[must_use]
    pub const fn id(&self) -> EntryId {
        self.id
    }

    /// Wait for the cycle to settle.
    pub async fn settled(self) -> Settlement {
        match self.task.await {
            Ok(settlement) => settlement,
            Err(e) => {
                error!("Submission task for {} did not complete: {e}", self.id);
                Settlement::Discarded
            }
        }
    }
}

/// A reset whose session teardown may still be running.
#[derive(Debug)]
pub struct ResetHandle {
    task: JoinHandle<()>,
}

impl ResetHandle {
    /// Wait until the server was notified and the local token is gone.
    pub async fn finished(self) {
        if let Err(e) = self.task.await {
            error!("Session teardown task did not complete: {e}");
        }
    }
}

#[derive(Debug)]
struct ConversationState {
    transcript: Transcript,
    persona: Persona,
    pending_input: String,
    /// Cycles of the current generation that have not settled
    in_flight: usize,
    generation: u64,
    last_error: Option<String>,
    lane: ExchangeLane,
}

impl ConversationState {
    fn view(&self) -> ConversationView {
        ConversationView {
            transcript: self.transcript.clone(),
            loading: self.in_flight > 0,
            pending_input: self.pending_input.clone(),
            persona: self.persona.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

struct Shared<A, S> {
    service: A,
    store: S,
    policy: SubmissionPolicy,
    state: Mutex<ConversationState>,
    views: watch::Sender<ConversationView>,
}

/// Drives question/answer cycles against an answering service.
///
/// Cloning is cheap; clones share the same conversation. `submit` and
/// `reset` spawn onto the current Tokio runtime.
pub struct ConversationController<A = Arc<dyn AnsweringService>, S = Arc<dyn SessionStore>> {
    shared: Arc<Shared<A, S>>,
}

impl<A, S> Clone for ConversationController<A, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A, S> ConversationController<A, S>
where
    A: AnsweringService + 'static,
    S: SessionStore + 'static,
{
    pub fn new(service: A, store: S, config: ConversationConfig) -> Self {
        info!(
            "Creating conversation controller (persona={}, policy={:?})",
            config.persona, config.policy
        );

        let state = ConversationState {
            transcript: Transcript::new(),
            persona: config.persona,
            pending_input: String::new(),
            in_flight: 0,
            generation: 0,
            last_error: None,
            lane: ExchangeLane::default(),
        };
        let (views, _) = watch::channel(state.view());

        Self {
            shared: Arc::new(Shared {
                service,
                store,
                policy: config.policy,
                state: Mutex::new(state),
                views,
            }),
        }
    }

    /// Submit a question exactly as typed.
    ///
    /// On acceptance the placeholder entry is already in the transcript,
    /// `loading` is set and the pending input is cleared.
    pub fn submit(&self, question: impl Into<String>) -> Result<Submission, SubmitError> {
        let question = question.into();
        if question.is_empty() {
            return Err(SubmitError::EmptyQuestion);
        }

        let id = EntryId::new();
        let (generation, persona, turn) = {
            let mut state = self.shared.lock();
            if self.shared.policy == SubmissionPolicy::Reject && state.in_flight > 0 {
                debug!("Rejecting submission: {} in flight", state.in_flight);
                return Err(SubmitError::Busy);
            }

            state.transcript = state
                .transcript
                .append(TranscriptEntry::pending(id, question.clone()));
            state.in_flight += 1;
            state.pending_input.clear();
            self.shared.publish(&state);

            (state.generation, state.persona.clone(), state.lane.join())
        };

        info!("Submitted question {id} (persona={persona})");

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            shared
                .run_submission(id, generation, question, persona, turn)
                .await
        });

        Ok(Submission { id, task })
    }

    /// Submit a suggested question, as if it had been typed.
    pub fn select_suggestion(
        &self,
        suggestion: impl Into<String>,
    ) -> Result<Submission, SubmitError> {
        let suggestion = suggestion.into();
        self.set_pending_input(suggestion.clone());
        self.submit(suggestion)
    }

    /// Clear the conversation and forget the session.
    ///
    /// The transcript is empty when this returns. The server is told to end
    /// the session afterwards and the local token is cleared whether or not
    /// that succeeds.
    pub fn reset(&self) -> ResetHandle {
        let turn = {
            let mut state = self.shared.lock();
            state.transcript = state.transcript.clear();
            state.generation += 1;
            state.in_flight = 0;
            state.last_error = None;
            self.shared.publish(&state);
            state.lane.join()
        };

        info!("Conversation cleared");

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move { shared.end_session(turn).await });

        ResetHandle { task }
    }

    /// Persona for subsequent submissions. In-flight ones keep theirs.
    pub fn change_persona(&self, persona: impl Into<Persona>) {
        let persona = persona.into();
        let mut state = self.shared.lock();
        if state.persona != persona {
            info!("Persona changed: {} -> {persona}", state.persona);
            state.persona = persona;
            self.shared.publish(&state);
        }
    }

    pub fn set_pending_input(&self, text: impl Into<String>) {
        let mut state = self.shared.lock();
        state.pending_input = text.into();
        self.shared.publish(&state);
    }

    #[must_use]
    pub fn pending_input(&self) -> String {
        self.shared.lock().pending_input.clone()
    }

    #[must_use]
    pub fn persona(&self) -> Persona {
        self.shared.lock().persona.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.shared.lock().in_flight > 0
    }

    #[must_use]
    pub fn transcript(&self) -> Transcript {
        self.shared.lock().transcript.clone()
    }

    #[must_use]
    pub fn view(&self) -> ConversationView {
        self.shared.lock().view()
    }

    /// Receive every state change as a fresh view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.shared.views.subscribe()
    }
}

impl<A, S> Shared<A, S>
where
    A: AnsweringService,
    S: SessionStore,
{
    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &ConversationState) {
        self.views.send_replace(state.view());
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    async fn load_session(&self) -> Option<SessionToken> {
        match self.store.get().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read the session token, asking without one: {e:#}");
                None
            }
        }
    }

    async fn adopt_session(&self, answer: &Answer) {
        let Some(token) = &answer.session else {
            warn!("Answer carried no session id; keeping the stored one");
            return;
        };

        if let Err(e) = self.store.set(token).await {
            warn!("Could not store the session token: {e:#}");
        }
    }

    async fn run_submission(
        &self,
        id: EntryId,
        generation: u64,
        question: String,
        persona: Persona,
        mut turn: LaneTurn,
    ) -> Settlement {
        turn.ready().await;

        if !self.is_current(generation) {
            debug!("Dropping queued question {id}: conversation was reset");
            return Settlement::Discarded;
        }

        let request = AskRequest {
            question,
            persona,
            session: self.load_session().await,
        };

        match self.service.ask(&request).await {
            Ok(answer) => {
                if !self.is_current(generation) {
                    debug!("Discarding answer to {id}: conversation was reset");
                    return Settlement::Discarded;
                }
                self.adopt_session(&answer).await;
                self.settle(
                    id,
                    generation,
                    EntryStatus::Answered,
                    answer.text,
                    answer.sources,
                    None,
                )
            }
            Err(e) => {
                error!("Knowledge Hub request for {id} failed: {e:#}");
                self.settle(
                    id,
                    generation,
                    EntryStatus::Failed,
                    ERROR_ANSWER.to_string(),
                    Vec::new(),
                    Some(format!("{e:#}")),
                )
            }
        }
    }

    fn settle(
        &self,
        id: EntryId,
        generation: u64,
        status: EntryStatus,
        answer: String,
        sources: Vec<Source>,
        failure: Option<String>,
    ) -> Settlement {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("Discarding settlement of {id}: conversation was reset");
            return Settlement::Discarded;
        }

        state.transcript = state.transcript.settle(id, status, answer, sources);
        state.in_flight = state.in_flight.saturating_sub(1);
        state.last_error = failure;
        self.publish(&state);

        debug!("Settled {id} as {status:?}");
        match status {
            EntryStatus::Failed => Settlement::Failed,
            EntryStatus::Answered | EntryStatus::Pending => Settlement::Answered,
        }
    }

    async fn end_session(&self, mut turn: LaneTurn) {
        turn.ready().await;

        let session = self.load_session().await;
        match self.service.end_session(session.as_ref()).await {
            Ok(()) => debug!("Knowledge Hub acknowledged session teardown"),
            Err(e) => warn!("Session teardown failed, forgetting the session anyway: {e:#}"),
        }

        if let Err(e) = self.store.clear().await {
            error!("Could not clear the stored session token: {e:#}");
        }
    }
}
