//! Agent Loop
//!
//! Core loop: prompt → model → if function calls, execute them → feed
//! results back → repeat until the model answers in plain text, the step
//! budget runs out, or the model repeats itself.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::dispatch::{tool_definitions, Dispatcher};
use crate::provider::{ModelClient, ResponsePart};
use crate::system_prompt::system_message;
use crate::types::{EventSink, Message, MessageContent, Role, RunEvent, ToolCallRequest};

// ---------------------------------------------------------------------------
// Run outcome
// ---------------------------------------------------------------------------

/// How a run ended. All three are normal terminations; model-client
/// failures surface as errors from [`Agent::run`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The model answered without requesting a function call.
    Completed,
    /// The model issued an identical (name, arguments) call twice.
    RepeatedCall,
    /// The model was still requesting calls when the budget ran out.
    StepBudgetExhausted,
}

/// Result of one agent run.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Every turn generated during the run (model and tool results),
    /// excluding the seed system and user turns.
    pub messages: Vec<Message>,
    /// Model round-trips performed.
    pub steps: usize,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// One agent run: owns the conversation and the seen-call set, so
/// concurrent runs in the same process cannot interfere.
pub struct Agent {
    client: Arc<dyn ModelClient>,
    config: RunConfig,
    dispatcher: Dispatcher,
    sink: Option<EventSink>,
    seen_calls: HashSet<String>,
}

impl Agent {
    pub fn new(config: RunConfig, client: Arc<dyn ModelClient>, sink: Option<EventSink>) -> Self {
        let dispatcher = Dispatcher::new(config.clone(), sink.clone());
        Self {
            client,
            config,
            dispatcher,
            sink,
            seen_calls: HashSet::new(),
        }
    }

    /// Drive the conversation seeded with `prompt` to a terminal outcome.
    ///
    /// Consumes the agent: the conversation and loop-detection state are
    /// scoped to exactly one run.
    pub async fn run(mut self, prompt: &str) -> Result<RunReport> {
        let tools = tool_definitions();
        let mut messages = vec![
            system_message(),
            Message {
                role: Role::User,
                content: MessageContent::Text(prompt.to_string()),
            },
        ];
        let mut new_messages: Vec<Message> = Vec::new();

        for step in 1..=self.config.max_steps {
            debug!(step, max_steps = self.config.max_steps, "requesting model turn");

            let response = self
                .client
                .generate(&messages, &tools)
                .await
                .context("model call failed")?;

            // Append the model turn before acting on it: the conversation
            // is the context for every subsequent round-trip.
            let text: String = response
                .parts
                .iter()
                .filter_map(|p| match p {
                    ResponsePart::Text(t) => Some(t.as_str()),
                    ResponsePart::FunctionCall(_) => None,
                })
                .collect();
            let calls: Vec<ToolCallRequest> = response
                .parts
                .iter()
                .filter_map(|p| match p {
                    ResponsePart::FunctionCall(c) => Some(c.clone()),
                    ResponsePart::Text(_) => None,
                })
                .collect();

            if !text.is_empty() {
                let msg = Message {
                    role: Role::Assistant,
                    content: MessageContent::Text(text),
                };
                messages.push(msg.clone());
                new_messages.push(msg);
            }
            if !calls.is_empty() {
                let msg = Message {
                    role: Role::Assistant,
                    content: MessageContent::ToolCalls(calls),
                };
                messages.push(msg.clone());
                new_messages.push(msg);
            }

            // Process parts in encounter order: text becomes user-visible
            // output, function calls are checked against the seen set and
            // dispatched one at a time.
            for part in &response.parts {
                match part {
                    ResponsePart::Text(t) => {
                        if !t.trim().is_empty() {
                            self.emit(RunEvent::AssistantText(t.clone()));
                        }
                    }
                    ResponsePart::FunctionCall(call) => {
                        if !self.seen_calls.insert(call.signature()) {
                            warn!(
                                tool = %call.name,
                                "model repeated an identical function call, stopping"
                            );
                            return Ok(RunReport {
                                outcome: RunOutcome::RepeatedCall,
                                messages: new_messages,
                                steps: step,
                            });
                        }

                        self.emit(RunEvent::ToolCallStarted {
                            name: call.name.clone(),
                        });
                        let result = self.dispatcher.dispatch(call).await;
                        info!(
                            tool = %call.name,
                            is_error = result.is_error,
                            result_len = result.content.len(),
                            "function call completed"
                        );
                        self.emit(RunEvent::ToolCallFinished {
                            name: result.name.clone(),
                            content: result.content.clone(),
                            is_error: result.is_error,
                        });

                        let msg = Message {
                            role: Role::Tool,
                            content: MessageContent::ToolResult(result),
                        };
                        messages.push(msg.clone());
                        new_messages.push(msg);
                    }
                }
            }

            if !response.has_function_calls() {
                debug!(step, "model answered without function calls");
                return Ok(RunReport {
                    outcome: RunOutcome::Completed,
                    messages: new_messages,
                    steps: step,
                });
            }
        }

        warn!(
            max_steps = self.config.max_steps,
            "reached maximum steps without a final answer"
        );
        Ok(RunReport {
            outcome: RunOutcome::StepBudgetExhausted,
            messages: new_messages,
            steps: self.config.max_steps,
        })
    }

    fn emit(&self, event: RunEvent) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
