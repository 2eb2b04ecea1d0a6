//! Per-leg interpolation core
//!
//! Pure linear stepping with no timers or I/O. One animation leg runs from
//! the displayed value captured at [`NumberAnimator::retarget`] time to the
//! target, in equal increments. Step size and direction are fixed for the
//! whole leg even as the displayed value advances; the first tick that
//! reaches or overshoots the target clamps to it exactly, so no
//! floating-point residue is ever displayed.

/// Result of advancing the animator by one tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// The displayed value after the tick
    pub value: f64,
    /// Whether the leg finished on this tick
    pub complete: bool,
}

/// Linear stepper for one numeric value
#[derive(Clone, Copy, Debug)]
pub struct NumberAnimator {
    current: f64,
    target: f64,
    step_size: f64,
    is_positive: bool,
}

impl NumberAnimator {
    /// Create an animator displaying `initial`, with no leg in flight
    pub fn new(initial: f64) -> Self {
        Self {
            current: initial,
            target: initial,
            step_size: 0.0,
            is_positive: false,
        }
    }

    /// Begin a new leg toward `target`
    ///
    /// Captures the step size and direction from the current displayed
    /// value; both stay fixed until the next `retarget`. `steps` is
    /// validated to be non-zero by the widget configuration.
    pub fn retarget(&mut self, target: f64, steps: u32) {
        self.target = target;
        self.step_size = (target - self.current) / f64::from(steps);
        self.is_positive = target - self.current > 0.0;
    }

    /// Hard-set the displayed value (baseline reset)
    ///
    /// Leg parameters are stale afterwards; callers retarget before ticking.
    pub fn snap(&mut self, value: f64) {
        self.current = value;
    }

    /// Advance one step toward the target
    ///
    /// A zero-length leg (`target == current` at retarget) has a zero step
    /// size; both completion branches hold on the first tick, so the leg
    /// takes exactly one tick.
    pub fn tick(&mut self) -> Tick {
        let next = self.current + self.step_size;
        let complete = (self.is_positive && next >= self.target)
            || (!self.is_positive && next <= self.target);

        self.current = if complete { self.target } else { next };

        Tick {
            value: self.current,
            complete,
        }
    }

    /// The value currently displayed
    pub fn current(&self) -> f64 {
        self.current
    }

    /// The value the current leg converges toward
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether the displayed value has reached the target
    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }
}
