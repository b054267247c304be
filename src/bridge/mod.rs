//! Line-delimited JSON bridge between a host process and the effects.
//!
//! ```text
//! stdin ──▶ Bridge::serve ──▶ one task per request ──▶ EffectRegistry
//!                                     │
//!   chat alerts / playSound events ───┤
//!                                     ▼
//!                      mpsc channel ──▶ write_lines ──▶ stdout
//! ```
//!
//! Requests:
//!
//! | `kind`     | fields                          | `result`                   |
//! |------------|---------------------------------|----------------------------|
//! | `trigger`  | `effect`, `options`, `trigger`  | effect result              |
//! | `validate` | `effect`, `options`             | list of error strings      |
//! | `label`    | `effect`, `options`             | default label              |
//! | `evaluate` | `variable`, `args`              | variable value             |
//! | `catalog`  |                                 | definitions and catalogs   |
//!
//! Events (`{"type":"event","event":...,"data":...}`): `chatAlert` and
//! `playSound`.

pub mod protocol;
pub mod server;
pub mod services;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use protocol::{BridgeEvent, BridgeRequest, OutgoingLine, PlaySound, RequestEnvelope};
pub use server::{write_lines, Bridge};
pub use services::{ChannelChatAlerts, LineSender, SpoolPlayback};
