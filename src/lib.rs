//! Snigdha OS Blackbox, the first-boot setup wizard.
//!
//! The [`wizard`] module holds the state machine and the operations it
//! drives (connectivity probe, system update, software selection and
//! apply). [`ui`] and [`event`] are the terminal front end that renders
//! the current screen and forwards button presses.

pub mod error;
pub mod event;
pub mod ui;
pub mod wizard;
