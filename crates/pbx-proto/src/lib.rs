//! Wire protocol for the PBX line-oriented TCP service: the outbound
//! state encoding (§4.1) and the inbound command grammar (§4.4).
//!
//! Everything here is pure text transformation — no I/O, no locking —
//! so it is trivially unit-testable and shared between the core state
//! machine (for encoding) and the `pbx-server` driver (for parsing).

mod command;
mod state;

pub use command::{parse_command, Command};
pub use state::{encode_state_line, TuState};
