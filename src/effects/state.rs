//! Per-invocation state machine shared by every effect.
//!
//! ```text
//! Validating ──ok──▶ BuildingRequest ──▶ Invoking ──▶ Interpreting ──▶ Terminal
//!      │                   │
//!      └──config error─────┴──────────────────────────────────────────▶ Terminal
//! ```
//!
//! There are no retries: a failed remote call moves straight on to
//! `Interpreting`, which decides the outputs and any stop directive.

use std::fmt;

// ---------------------------------------------------------------------------
// InvocationState
// ---------------------------------------------------------------------------

/// Phases of a single effect invocation, in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum InvocationState {
    /// Checking the effect configuration.
    #[default]
    Validating,
    /// Assembling the provider request.
    BuildingRequest,
    /// Waiting for the one remote call.
    Invoking,
    /// Turning the provider result into outputs and a directive.
    Interpreting,
    /// Done; the result has been handed to the host.
    Terminal,
}

impl InvocationState {
    /// ```
    /// use openai_effects::effects::InvocationState;
    ///
    /// assert!(!InvocationState::Validating.is_terminal());
    /// assert!(InvocationState::Terminal.is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvocationState::Terminal)
    }

    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            InvocationState::Validating => "Validating",
            InvocationState::BuildingRequest => "BuildingRequest",
            InvocationState::Invoking => "Invoking",
            InvocationState::Interpreting => "Interpreting",
            InvocationState::Terminal => "Terminal",
        }
    }
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// InvocationTrace
// ---------------------------------------------------------------------------

/// Tracks and logs the states one invocation passes through.
///
/// Transitions only move forward; skipping states (e.g. a validation failure
/// jumping to `Terminal`) is allowed.
#[derive(Debug)]
pub struct InvocationTrace {
    effect: &'static str,
    visited: Vec<InvocationState>,
}

impl InvocationTrace {
    pub fn new(effect: &'static str) -> Self {
        log::debug!("{effect}: → {}", InvocationState::Validating);
        Self {
            effect,
            visited: vec![InvocationState::Validating],
        }
    }

    pub fn state(&self) -> InvocationState {
        self.visited
            .last()
            .copied()
            .unwrap_or_default()
    }

    /// Move to `next`.  Backward or repeated transitions are ignored with a
    /// warning.
    pub fn advance(&mut self, next: InvocationState) {
        let current = self.state();
        if next <= current {
            log::warn!("{}: ignored transition {current} → {next}", self.effect);
            return;
        }
        log::debug!("{}: {current} → {next}", self.effect);
        self.visited.push(next);
    }

    pub fn finish(&mut self) {
        self.advance(InvocationState::Terminal);
    }

    #[cfg(test)]
    fn visited(&self) -> &[InvocationState] {
        &self.visited
    }

    /// Returns `true` once the remote call has been attempted.
    #[cfg(test)]
    fn reached_invoking(&self) -> bool {
        self.visited.contains(&InvocationState::Invoking)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
