//! Invocation of the external `dds` program
//!
//! [`DdsCommand`] turns a mode and a signal snapshot into an argument
//! vector; a [`Launcher`] runs it. Arguments are never passed through a
//! shell, so client-supplied values reach `dds` verbatim as single
//! arguments.
//!
//! `fmtone` with an alternate tone never exits on its own; it is left
//! running as a [`RunningDds`] until something stops it.

mod command;
mod launcher;

pub use command::{DdsCommand, DdsOptions};
pub use launcher::{InvocationOutcome, Launched, Launcher, ProcessLauncher, RunningDds};

#[cfg(all(test, unix))]
pub(crate) use launcher::fake;
