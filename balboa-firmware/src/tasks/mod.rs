//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod binding;
pub mod buttons;
pub mod spa;

pub use binding::binding_task;
pub use buttons::{buttons_task, Button, MAX_BUTTONS};
pub use spa::spa_task;
