//! Audio resource descriptors.
//!
//! [`AudioEvent`]s name sounds and list the files they may play;
//! [`AudioBank`]s group events so their files load and unload together.

mod bank;
mod event;

pub use bank::*;
pub use event::*;
