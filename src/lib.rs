//! Animated Number Widget
//!
//! A numeric text field that animates from its previously displayed value to
//! a new target over a configurable number of discrete steps, re-rendering
//! formatted text on each tick. Purely a presentation component: it owns no
//! business logic, persistence, or network boundary.
//!
//! # Features
//!
//! - **Stepped Interpolation**: linear legs of `steps` equal increments,
//!   clamped to the exact target on completion
//! - **Reset Detection**: a changed initial value snaps the display and
//!   restarts the animation, guarded against rapid consecutive resets
//! - **Imperative Rendering**: formatted strings are pushed into a host
//!   [`TextDisplay`] primitive without re-layout
//! - **Cancellable Timers**: one shared [`TimerScheduler`] drives all
//!   widgets; unmounting cancels every pending tick
//! - **Idle Deferral**: the first tick of each leg hops through an
//!   [`InteractionGate`] so animations never jank input handling
//!
//! # Example
//!
//! ```ignore
//! use animated_number::prelude::*;
//! use std::sync::Arc;
//!
//! let mut scheduler = TimerScheduler::new();
//! scheduler.start_background();
//!
//! let display: Arc<dyn TextDisplay> = platform_text_handle();
//! let score = animated_number(100.0)
//!     .initial_value(0.0)
//!     .steps(10)
//!     .time(6.0)
//!     .formatter(|v| format!("{v:.0} pts"))
//!     .display(display)
//!     .build(&scheduler.handle())?;
//!
//! // Later: animate from wherever the display currently is
//! score.set_value(250.0);
//!
//! // Game restarted: snap back and re-animate
//! score.set_initial_value(0.0);
//! ```

pub mod animator;
pub mod error;
pub mod interactions;
pub mod scheduler;
pub mod text;
pub mod widget;

pub use animator::{NumberAnimator, Tick};
pub use error::{AnimatedNumberError, Result};
pub use interactions::{ImmediateGate, InteractionGate, QueuedGate};
pub use scheduler::{SchedulerHandle, TimerCallback, TimerId, TimerScheduler};
pub use text::{MergedTextHandle, TextAlign, TextBuffer, TextDisplay, TextStyle};
pub use widget::{
    animated_number, default_formatter, AnimatedNumber, AnimatedNumberBuilder,
    AnimatedNumberConfig, Formatter,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interactions::{ImmediateGate, InteractionGate};
    pub use crate::scheduler::{SchedulerHandle, TimerScheduler};
    pub use crate::text::{TextAlign, TextBuffer, TextDisplay, TextStyle};
    pub use crate::widget::{animated_number, AnimatedNumber, AnimatedNumberBuilder};
}
