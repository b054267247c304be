//! Interface boundary with the automation host.
//!
//! The host owns triggering, variable substitution, effect-chain execution,
//! chat and audio playback.  This module only describes what crosses the
//! boundary:
//!
//! * [`Trigger`]: metadata of the event that fired an effect.
//! * [`EffectResult`]: outputs plus an optional [`ExecutionDirective`].
//! * [`ChatAlertSink`], [`AudioPlayback`], [`CredentialStore`]: host
//!   services injected into the effects that need them.

pub mod result;
pub mod services;
pub mod trigger;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use result::{EffectOutputs, EffectResult, ExecutionDirective};
pub use services::{
    AudioClip, AudioPlayback, ChatAlert, ChatAlertSink, CredentialStore, NoopChatAlerts,
    SharedCredentials,
};
pub use trigger::{Trigger, TriggerMetadata};
