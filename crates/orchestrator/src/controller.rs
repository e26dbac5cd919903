//! Iteration Controller — the central state machine of the orchestrator.
//!
//! Drives the model↔plugin cycle for one request:
//!
//! ```text
//! AwaitModel → Parse → { DispatchPlugin | EmitMessage | retry | Abort }
//!       ↑__________________|
//! ```
//!
//! Every completed plugin round counts against `max_iterations`;
//! unparseable model output consumes a bounded number of re-prompts. The
//! loop is strictly sequential per request: no plugin call is issued for
//! round *n+1* until round *n*'s result has been folded into context and
//! a fresh model response obtained, which is what makes multi-step plugin
//! chains replayable from the iteration log.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use libreassistant_config::OrchestratorConfig;
use libreassistant_core::{
    Action, ConversationContext, DomainEvent, EventBus, ModelClient, PluginRegistry, PluginResult,
    RequestOutcome, TerminalReason, TurnRequest,
};
use libreassistant_protocol::{build_system_instructions, parse};

use crate::context::ContextAssembler;
use crate::executor::PluginExecutor;
use crate::formatter;
use crate::usage::UsageLog;

/// The explicit states of one loop pass.
enum LoopState {
    /// Send the current context to the model and wait for a full turn.
    AwaitModel,
    /// Interpret the model's raw output.
    Parse { raw: String },
    /// Execute a validated plugin invocation.
    DispatchPlugin {
        plugin: String,
        input: Map<String, Value>,
        reason: String,
    },
    /// Terminal: the model produced a final message.
    EmitMessage { text: String, markdown: bool },
    /// Terminal: safety bound hit or fatal condition.
    Abort {
        reason: TerminalReason,
        detail: String,
    },
}

/// The orchestration loop for LibreAssistant requests.
///
/// One controller can serve many requests; each `run` call owns its own
/// `ConversationContext` and iteration log, so concurrent runs share
/// nothing mutable. The registry is the only shared resource and is
/// immutable after startup.
pub struct IterationController {
    model: Arc<dyn ModelClient>,
    model_name: String,
    temperature: f32,
    registry: Arc<PluginRegistry>,
    event_bus: Arc<EventBus>,
    max_iterations: usize,
    parse_retry_limit: usize,
    default_plugin_timeout: Duration,
    plugin_timeouts: HashMap<String, u64>,
    token_budget: usize,
    cancel: Option<watch::Receiver<bool>>,
}

impl IterationController {
    /// Create a controller with default bounds.
    pub fn new(
        model: Arc<dyn ModelClient>,
        model_name: impl Into<String>,
        temperature: f32,
        registry: Arc<PluginRegistry>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            temperature,
            registry,
            event_bus,
            max_iterations: 5,
            parse_retry_limit: 2,
            default_plugin_timeout: Duration::from_secs(10),
            plugin_timeouts: HashMap::new(),
            token_budget: 4096,
            cancel: None,
        }
    }

    /// Apply the orchestrator section of the app configuration.
    pub fn with_config(mut self, config: &OrchestratorConfig) -> Self {
        self.max_iterations = config.max_iterations;
        self.parse_retry_limit = config.parse_retry_limit;
        self.default_plugin_timeout = Duration::from_secs(config.plugin_timeout_secs);
        self.plugin_timeouts = config.plugin_timeouts.clone();
        self.token_budget = config.context_token_budget;
        self
    }

    /// Set the maximum number of completed plugin rounds per request.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Set how many re-prompts unparseable output is allowed to consume.
    pub fn with_parse_retry_limit(mut self, limit: usize) -> Self {
        self.parse_retry_limit = limit;
        self
    }

    /// Set the default per-plugin execution timeout.
    pub fn with_plugin_timeout(mut self, timeout: Duration) -> Self {
        self.default_plugin_timeout = timeout;
        self
    }

    /// Set the context token budget.
    pub fn with_token_budget(mut self, budget: usize) -> Self {
        self.token_budget = budget;
        self
    }

    /// Attach a cooperative cancellation flag. The loop checks it before
    /// each model call and before each plugin dispatch.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    fn plugin_timeout_for(&self, plugin_id: &str) -> Duration {
        self.plugin_timeouts
            .get(plugin_id)
            .map(|&secs| Duration::from_secs(secs))
            .unwrap_or(self.default_plugin_timeout)
    }

    /// Append a synthesized (never executed) plugin round: unknown plugin
    /// or consecutive duplicate. Counts as a completed round.
    fn synthesize_round(
        &self,
        ctx: &mut ConversationContext,
        assembler: &ContextAssembler,
        usage: &mut UsageLog,
        action: Action,
        error: String,
    ) {
        if let Action::PluginInvoke {
            plugin,
            input,
            reason,
        } = &action
        {
            let index = usage.record(plugin.clone(), input.clone(), reason.clone());
            usage.finish(index, false, Some(error.clone()), 0);

            self.event_bus.publish(DomainEvent::PluginExecuted {
                request_id: ctx.request_id.clone(),
                plugin_id: plugin.clone(),
                success: false,
                duration_ms: 0,
                timestamp: Utc::now(),
            });
        }

        let result = PluginResult::fail(error);
        ctx.push_record(action.clone(), Some(result.clone()));
        assembler.append_plugin_round(ctx, &action, &result);
    }

    /// Process one user message and drive the loop to a terminal outcome.
    ///
    /// Never returns an error: fatal conditions (model service down,
    /// parse ceiling exceeded, cancellation) become a `RequestOutcome`
    /// with `success: false` and a descriptive response.
    pub async fn run(&self, request_id: impl Into<String>, user_message: &str) -> RequestOutcome {
        let request_id = request_id.into();
        let mut ctx = ConversationContext::new(&request_id, user_message);
        let system_instructions = build_system_instructions(self.registry.list());
        let assembler = ContextAssembler::new(self.token_budget);
        let mut usage = UsageLog::new();
        let mut parse_failures = 0usize;
        let mut last_raw: Option<String> = None;

        info!(
            request_id = %request_id,
            plugins = self.registry.len(),
            max_iterations = self.max_iterations,
            "Processing request"
        );
        self.event_bus.publish(DomainEvent::RequestStarted {
            request_id: request_id.clone(),
            timestamp: Utc::now(),
        });

        let mut state = LoopState::AwaitModel;

        let outcome = loop {
            state = match state {
                LoopState::AwaitModel => {
                    if self.is_cancelled() {
                        break formatter::abort_outcome(
                            &request_id,
                            &ctx.records,
                            TerminalReason::FatalError,
                            "The request was cancelled before completion.".into(),
                            last_raw.take(),
                        );
                    }

                    let prompt = assembler.render(&system_instructions, &ctx);
                    debug!(
                        request_id = %request_id,
                        rounds = ctx.plugin_rounds(),
                        prompt_chars = prompt.len(),
                        "Awaiting model turn"
                    );

                    let request = TurnRequest {
                        model: self.model_name.clone(),
                        prompt,
                        temperature: self.temperature,
                    };

                    match self.model.send_turn(request).await {
                        Ok(raw) => {
                            self.event_bus.publish(DomainEvent::ResponseGenerated {
                                request_id: request_id.clone(),
                                model: self.model_name.clone(),
                                response_chars: raw.len(),
                                timestamp: Utc::now(),
                            });
                            LoopState::Parse { raw }
                        }
                        Err(e) => {
                            warn!(request_id = %request_id, error = %e, "Model service failed");
                            break formatter::abort_outcome(
                                &request_id,
                                &ctx.records,
                                TerminalReason::FatalError,
                                format!("The language model service could not be reached: {e}."),
                                last_raw.take(),
                            );
                        }
                    }
                }

                LoopState::Parse { raw } => {
                    last_raw = Some(raw.clone());

                    match parse(&raw) {
                        Action::Message { text, markdown } => {
                            LoopState::EmitMessage { text, markdown }
                        }

                        Action::PluginInvoke {
                            plugin,
                            input,
                            reason,
                        } => {
                            if ctx.plugin_rounds() >= self.max_iterations {
                                warn!(
                                    request_id = %request_id,
                                    rounds = ctx.plugin_rounds(),
                                    "Iteration bound reached, aborting"
                                );
                                LoopState::Abort {
                                    reason: TerminalReason::MaxIterations,
                                    detail: format!(
                                        "I stopped after {} plugin rounds without reaching a final answer.",
                                        self.max_iterations
                                    ),
                                }
                            } else if !self.registry.contains(&plugin) {
                                // No executor is called; the model is told its
                                // chosen plugin does not exist so it can retry.
                                debug!(request_id = %request_id, plugin = %plugin, "Unknown plugin requested");
                                let error = format!(
                                    "unknown plugin '{}'; available plugins: {}",
                                    plugin,
                                    self.registry.ids().join(", ")
                                );
                                self.synthesize_round(
                                    &mut ctx,
                                    &assembler,
                                    &mut usage,
                                    Action::PluginInvoke {
                                        plugin,
                                        input,
                                        reason,
                                    },
                                    error,
                                );
                                LoopState::AwaitModel
                            } else if usage.is_consecutive_duplicate(&plugin, &input) {
                                debug!(request_id = %request_id, plugin = %plugin, "Duplicate invocation suppressed");
                                let error = format!(
                                    "duplicate invocation of '{plugin}' with identical input; \
the previous result already answers this call"
                                );
                                self.synthesize_round(
                                    &mut ctx,
                                    &assembler,
                                    &mut usage,
                                    Action::PluginInvoke {
                                        plugin,
                                        input,
                                        reason,
                                    },
                                    error,
                                );
                                LoopState::AwaitModel
                            } else {
                                LoopState::DispatchPlugin {
                                    plugin,
                                    input,
                                    reason,
                                }
                            }
                        }

                        Action::ParseError { raw, reason } => {
                            parse_failures += 1;
                            if parse_failures > self.parse_retry_limit {
                                warn!(
                                    request_id = %request_id,
                                    attempts = parse_failures,
                                    "Parse-retry ceiling exceeded, aborting"
                                );
                                LoopState::Abort {
                                    reason: TerminalReason::FatalError,
                                    detail: format!(
                                        "The model failed to produce interpretable output after {parse_failures} attempts ({reason})."
                                    ),
                                }
                            } else {
                                debug!(
                                    request_id = %request_id,
                                    attempt = parse_failures,
                                    reason = %reason,
                                    "Re-prompting after parse failure"
                                );
                                ctx.push_record(
                                    Action::ParseError {
                                        raw: raw.clone(),
                                        reason: reason.clone(),
                                    },
                                    None,
                                );
                                assembler.append_parse_retry(&mut ctx, &raw, &reason);
                                LoopState::AwaitModel
                            }
                        }
                    }
                }

                LoopState::DispatchPlugin {
                    plugin,
                    input,
                    reason,
                } => {
                    if self.is_cancelled() {
                        break formatter::abort_outcome(
                            &request_id,
                            &ctx.records,
                            TerminalReason::FatalError,
                            "The request was cancelled before completion.".into(),
                            last_raw.take(),
                        );
                    }

                    // Checked in Parse; a miss here means the registry
                    // changed underneath us, which it cannot.
                    let Some(plugin_impl) = self.registry.get(&plugin) else {
                        let error = format!("unknown plugin '{plugin}'");
                        self.synthesize_round(
                            &mut ctx,
                            &assembler,
                            &mut usage,
                            Action::PluginInvoke {
                                plugin,
                                input,
                                reason,
                            },
                            error,
                        );
                        state = LoopState::AwaitModel;
                        continue;
                    };

                    let timeout = self.plugin_timeout_for(&plugin);
                    let index = usage.record(plugin.clone(), input.clone(), reason.clone());

                    let start = Instant::now();
                    let result = PluginExecutor::execute(plugin_impl, input.clone(), timeout).await;
                    let duration_ms = start.elapsed().as_millis() as u64;

                    usage.finish(index, result.success, result.error.clone(), duration_ms);
                    self.event_bus.publish(DomainEvent::PluginExecuted {
                        request_id: request_id.clone(),
                        plugin_id: plugin.clone(),
                        success: result.success,
                        duration_ms,
                        timestamp: Utc::now(),
                    });

                    let action = Action::PluginInvoke {
                        plugin,
                        input,
                        reason,
                    };
                    ctx.push_record(action.clone(), Some(result.clone()));
                    assembler.append_plugin_round(&mut ctx, &action, &result);

                    LoopState::AwaitModel
                }

                LoopState::EmitMessage { text, markdown } => {
                    ctx.push_record(
                        Action::Message {
                            text: text.clone(),
                            markdown,
                        },
                        None,
                    );
                    break formatter::message_outcome(&request_id, &ctx.records, text, markdown);
                }

                LoopState::Abort { reason, detail } => {
                    break formatter::abort_outcome(
                        &request_id,
                        &ctx.records,
                        reason,
                        detail,
                        last_raw.take(),
                    );
                }
            };
        };

        self.event_bus.publish(DomainEvent::RequestCompleted {
            request_id: request_id.clone(),
            terminal_reason: format!("{:?}", outcome.terminal_reason),
            iteration_count: outcome.iteration_count,
            timestamp: Utc::now(),
        });
        info!(
            request_id = %request_id,
            success = outcome.success,
            iterations = outcome.iteration_count,
            plugins = outcome.plugins_used.len(),
            "Request completed"
        );

        outcome
    }
}
