//! The supervisor loop implementation.

use std::sync::Arc;

use crewloop_core::agent::{AgentMessage, AgentRole, AgentState, DEFAULT_MAX_ITERATIONS, Phase};
use crewloop_core::identity::{DEV_USER_ID, IdentityProvider, resolve_user_id};
use crewloop_core::message::ChatMessage;
use crewloop_memory::MemoryRecorder;
use crewloop_providers::ModelGateway;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::prompts;
use crate::routing::{is_complete, select_role};
use crate::simulate::{simulate_tool_execution, tool_metadata};

/// Messages of history shown to the planner.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// Drives one goal through plan, route, act, observe and critique until the
/// critique says it is done or the iteration bound is hit.
pub struct AgentLoop {
    gateway: ModelGateway,
    recorder: MemoryRecorder,
    identity: Arc<dyn IdentityProvider>,
    max_iterations: u32,
    history_window: usize,
    tool_seed: Option<u64>,
    fallback_user_id: String,
}

/// Per-run values fixed before the first pass.
struct RunContext {
    user_id: String,
    system: String,
    rng: StdRng,
}

impl AgentLoop {
    pub fn new(
        gateway: ModelGateway,
        recorder: MemoryRecorder,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            gateway,
            recorder,
            identity,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            history_window: DEFAULT_HISTORY_WINDOW,
            tool_seed: None,
            fallback_user_id: DEV_USER_ID.into(),
        }
    }

    /// Set the maximum number of outer passes.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set how many recent messages the planner sees.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Seed the simulated tool picker so runs are reproducible.
    pub fn with_tool_seed(mut self, seed: u64) -> Self {
        self.tool_seed = Some(seed);
        self
    }

    /// Identity used when nobody is signed in.
    pub fn with_fallback_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.fallback_user_id = user_id.into();
        self
    }

    pub fn recorder(&self) -> &MemoryRecorder {
        &self.recorder
    }

    /// Run the loop for `goal` and return the final state.
    ///
    /// Never fails: model and storage problems show up as message content
    /// or missing rows, not as errors.
    pub async fn run(&self, goal: &str) -> AgentState {
        let mut ctx = RunContext {
            user_id: resolve_user_id(self.identity.as_ref(), &self.fallback_user_id).await,
            system: prompts::supervisor(goal),
            rng: match self.tool_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            },
        };
        let mut state = AgentState::new(goal, self.max_iterations);

        info!(
            user_id = %ctx.user_id,
            goal_len = goal.len(),
            max_iterations = self.max_iterations,
            live = self.gateway.is_live(),
            "Starting supervisor loop"
        );

        while state.should_continue() {
            state.iteration += 1;
            debug!(iteration = state.iteration, "Loop pass");
            self.pass(&mut state, &mut ctx).await;
        }

        if state.iteration >= state.max_iterations {
            if !state.is_complete() {
                warn!(iterations = state.iteration, "Iteration bound reached, forcing completion");
            }
            state.current_phase = Phase::Complete;
        }

        info!(
            iterations = state.iteration,
            messages = state.messages.len(),
            phase = %state.current_phase,
            "Supervisor loop finished"
        );
        state
    }

    /// One outer pass: all four phases in order, unconditionally.
    async fn pass(&self, state: &mut AgentState, ctx: &mut RunContext) {
        let goal = state.goal.clone();

        // Plan
        state.current_phase = Phase::Planning;
        debug!(phase = %state.current_phase, iteration = state.iteration);
        let prompt = prompts::plan(state, self.history_window);
        let plan = self.ask(prompt, &ctx.system).await;
        self.emit(state, ctx, AgentMessage::new(AgentRole::Supervisor, plan.clone()), None)
            .await;

        // Route
        let decision = self.ask(prompts::route(&plan), &ctx.system).await;
        let role = select_role(&decision);
        debug!(%role, "Routed");
        self.recorder
            .record(
                &ctx.user_id,
                AgentRole::Supervisor,
                &decision,
                Some(serde_json::json!({ "decision": role })),
            )
            .await;

        // Act
        state.current_phase = Phase::Acting;
        debug!(phase = %state.current_phase, iteration = state.iteration);
        let action = self
            .ask(prompts::act(&plan), &prompts::specialist(role, &goal))
            .await;
        let execution = simulate_tool_execution(&mut ctx.rng, &goal);
        let metadata = tool_metadata(&execution);
        debug!(%role, tool = %execution.tool, "Simulated tool run");
        self.emit(
            state,
            ctx,
            AgentMessage::new(role, action).with_tool_execution(execution),
            Some(metadata),
        )
        .await;

        // Observe
        state.current_phase = Phase::Observing;
        debug!(phase = %state.current_phase, iteration = state.iteration);
        let observation = self.ask(prompts::OBSERVE_PROMPT.into(), &ctx.system).await;
        self.emit(state, ctx, AgentMessage::new(AgentRole::Supervisor, observation), None)
            .await;

        // Critique
        state.current_phase = Phase::Critiquing;
        debug!(phase = %state.current_phase, iteration = state.iteration);
        let critique = self.ask(prompts::critique(&goal), &ctx.system).await;
        let done = is_complete(&critique);
        self.emit(state, ctx, AgentMessage::new(AgentRole::Supervisor, critique), None)
            .await;

        state.current_phase = if done {
            info!(iteration = state.iteration, "Critique reports goal complete");
            Phase::Complete
        } else {
            Phase::Planning
        };
    }

    async fn ask(&self, prompt: String, system: &str) -> String {
        trace!(prompt_len = prompt.len(), "Asking model");
        self.gateway
            .generate(&[ChatMessage::user(prompt)], Some(system))
            .await
    }

    /// Persist a message and append it to the state.
    async fn emit(
        &self,
        state: &mut AgentState,
        ctx: &RunContext,
        message: AgentMessage,
        metadata: Option<serde_json::Value>,
    ) {
        self.recorder
            .record(&ctx.user_id, message.role, &message.content, metadata)
            .await;
        state.push(message);
    }
}
