//! Controllers driving the projector: randomization, subslot toggling and
//! the debounced re-sync.

pub mod clock;
pub mod randomize;
pub mod resync;
pub mod toggle;

pub use clock::{Clock, Cooldown, ManualClock, SystemClock};
pub use randomize::{RandomizationController, RandomizeOutcome, RandomizeState, RandomizeTicket};
pub use resync::ResyncScheduler;
pub use toggle::{SubslotToggleController, ToggleOutcome, ToggleState, collapse_region};
