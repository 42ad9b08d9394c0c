//! Chat-facing glue around the debt engine.
//!
//! Everything here is replaceable I/O plumbing: a typed command parser, a
//! Russian renderer, the participant-roster seam, and a dispatcher that
//! turns one inbound message into at most one reply string. The engine
//! below never sees raw text, locales, or rosters.

mod command;
mod dispatch;
mod render;
mod roster;

pub use command::{ChargeTargets, Command};
pub use dispatch::{Dispatcher, Inbound};
pub use render::{Gender, GenderSource, MasculineDefault, Renderer};
pub use roster::{Roster, RosterError, StaticRoster};
