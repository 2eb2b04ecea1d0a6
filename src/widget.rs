//! AnimatedNumber widget
//!
//! A read-only numeric text field that animates from its previously
//! displayed value to a new target in a fixed number of equal steps,
//! re-rendering formatted text on each tick.
//!
//! - Changing the **target** (`set_value`) starts a new animation leg from
//!   the current displayed value.
//! - Changing the **baseline** (`set_initial_value`) is a hard reset: any
//!   in-flight animation stops, the displayed value snaps to the new
//!   baseline, and a fresh leg starts toward the current target. A guard
//!   timer of one tick delay plus 1ms must expire before the new baseline is
//!   accepted as the comparison point, so a second reset arriving
//!   mid-animation still snaps instead of being absorbed as a retarget.
//!
//! At most one animation timer and one guard timer exist per widget;
//! starting a leg always cancels the pending tick first and outdates any
//! first-tick hop still parked on the idle gate, so displayed-value
//! mutations never race.

use std::sync::{Arc, Mutex};

use crate::animator::NumberAnimator;
use crate::error::{AnimatedNumberError, Result};
use crate::interactions::{ImmediateGate, InteractionGate};
use crate::scheduler::{SchedulerHandle, TimerCallback, TimerId};
use crate::text::{MergedTextHandle, TextAlign, TextBuffer, TextDisplay, TextStyle};

/// Function turning the displayed value into its rendered string
pub type Formatter = Arc<dyn Fn(f64) -> String + Send + Sync>;

/// Default formatter: plain numeric-to-string conversion
///
/// Integral values render without a trailing fraction ("10", not "10.0").
pub fn default_formatter() -> Formatter {
    Arc::new(|value: f64| value.to_string())
}

/// AnimatedNumber configuration
#[derive(Clone)]
pub struct AnimatedNumberConfig {
    /// Target value the animation converges toward
    pub value: f64,
    /// Reset baseline and the value displayed at mount; defaults to `value`
    pub initial_value: Option<f64>,
    /// Number of increments per animation leg (must be > 0)
    pub steps: u32,
    /// Delay between consecutive ticks in milliseconds, so one leg lasts
    /// about `steps * time` ms (must be finite and > 0)
    pub time: f64,
    /// Value-to-string conversion
    pub formatter: Formatter,
    /// Disable fixed-width digit rendering
    pub disable_tabular_nums: bool,
    /// Alignment passed through to the text primitive
    pub text_align: TextAlign,
}

impl Default for AnimatedNumberConfig {
    fn default() -> Self {
        Self {
            value: 0.0,
            initial_value: None,
            steps: 10,
            time: 6.0,
            formatter: default_formatter(),
            disable_tabular_nums: false,
            text_align: TextAlign::Right,
        }
    }
}

/// Builder for [`AnimatedNumber`]
pub struct AnimatedNumberBuilder {
    config: AnimatedNumberConfig,
    displays: Vec<Arc<dyn TextDisplay>>,
    gate: Arc<dyn InteractionGate>,
}

/// Create an animated number widget showing `value`
pub fn animated_number(value: f64) -> AnimatedNumberBuilder {
    AnimatedNumberBuilder {
        config: AnimatedNumberConfig {
            value,
            ..AnimatedNumberConfig::default()
        },
        displays: Vec::new(),
        gate: Arc::new(ImmediateGate),
    }
}

impl AnimatedNumberBuilder {
    /// Set the reset baseline (also the value displayed at mount)
    pub fn initial_value(mut self, initial: f64) -> Self {
        self.config.initial_value = Some(initial);
        self
    }

    /// Set the number of increments per animation leg
    pub fn steps(mut self, steps: u32) -> Self {
        self.config.steps = steps;
        self
    }

    /// Set the per-tick delay in milliseconds
    pub fn time(mut self, time_ms: f64) -> Self {
        self.config.time = time_ms;
        self
    }

    /// Set the value-to-string conversion
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(f64) -> String + Send + Sync + 'static,
    {
        self.config.formatter = Arc::new(formatter);
        self
    }

    /// Disable fixed-width digit rendering
    pub fn disable_tabular_nums(mut self, disable: bool) -> Self {
        self.config.disable_tabular_nums = disable;
        self
    }

    /// Set the text alignment
    pub fn text_align(mut self, align: TextAlign) -> Self {
        self.config.text_align = align;
        self
    }

    /// Attach an external display owner; it receives every push the
    /// widget's internal handle receives
    pub fn display(mut self, display: Arc<dyn TextDisplay>) -> Self {
        self.displays.push(display);
        self
    }

    /// Set the host-idle gate the first tick of each leg defers through
    pub fn gate(mut self, gate: Arc<dyn InteractionGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Validate the configuration and mount the widget
    ///
    /// Renders the formatted initial value immediately; if `value` differs
    /// from the initial value, the first animation leg starts right away.
    pub fn build(self, scheduler: &SchedulerHandle) -> Result<AnimatedNumber> {
        let Self {
            config,
            displays,
            gate,
        } = self;

        if config.steps == 0 {
            return Err(AnimatedNumberError::InvalidSteps(config.steps));
        }
        if !config.time.is_finite() || config.time <= 0.0 {
            return Err(AnimatedNumberError::InvalidTime(config.time));
        }

        let initial = config.initial_value.unwrap_or(config.value);

        // Internal handle first, then external owners, fan-out on every push
        let buffer = Arc::new(TextBuffer::new());
        let mut display =
            MergedTextHandle::new(vec![Arc::clone(&buffer) as Arc<dyn TextDisplay>]);
        for external in displays {
            display.push(external);
        }

        display.apply_style(&TextStyle {
            tabular_nums: !config.disable_tabular_nums,
            text_align: config.text_align,
        });
        display.set_editable(false);

        let state = Arc::new(Mutex::new(WidgetState {
            animator: NumberAnimator::new(initial),
            baseline: initial,
            steps: config.steps,
            time: config.time,
            formatter: config.formatter,
            display,
            scheduler: scheduler.clone(),
            gate,
            anim_timer: None,
            guard_timer: None,
            leg: 0,
            unmounted: false,
        }));

        {
            let mut st = state.lock().unwrap();
            render(&mut st);
        }

        let widget = AnimatedNumber { state, buffer };
        if config.value != initial {
            widget.set_value(config.value);
        }
        Ok(widget)
    }
}

/// Mutable widget state shared with timer callbacks
struct WidgetState {
    animator: NumberAnimator,
    /// Shadow copy of the externally supplied initial value; only updated
    /// once the reset guard timer fires
    baseline: f64,
    steps: u32,
    time: f64,
    formatter: Formatter,
    display: MergedTextHandle,
    scheduler: SchedulerHandle,
    gate: Arc<dyn InteractionGate>,
    anim_timer: Option<TimerId>,
    guard_timer: Option<TimerId>,
    /// Generation of the current animation leg. A gate hop or timer fire
    /// carrying a stale generation belongs to a superseded leg and is
    /// ignored, so only one tick chain ever drives the displayed value.
    leg: u64,
    unmounted: bool,
}

type SharedState = Arc<Mutex<WidgetState>>;

/// Push the formatted displayed value into the text primitive
fn render(st: &mut WidgetState) {
    let text = (st.formatter)(st.animator.current());
    st.display.set_text(&text);
}

/// Start an animation leg: cancel the pending tick, then hop through the
/// idle gate and perform the first tick
fn start_leg(shared: &SharedState) {
    let (gate, leg) = {
        let mut st = shared.lock().unwrap();
        if st.unmounted {
            return;
        }
        if let Some(id) = st.anim_timer.take() {
            st.scheduler.cancel(id);
        }
        // Invalidate hops and timers of any superseded leg; a hop still
        // parked on the gate cannot be cancelled, only outdated
        st.leg += 1;
        (Arc::clone(&st.gate), st.leg)
    };

    let weak = Arc::downgrade(shared);
    gate.run_after_interactions(Box::new(move || {
        if let Some(shared) = weak.upgrade() {
            advance_leg(&shared, leg);
        }
    }));
}

/// Perform one tick, render it, and re-arm the tick timer unless the leg
/// completed (cancel-then-create repetition)
///
/// `leg` is the generation this tick chain belongs to; a stale generation
/// means the leg was superseded while the first tick waited on the gate.
fn advance_leg(shared: &SharedState, leg: u64) {
    let mut st = shared.lock().unwrap();
    if st.unmounted || st.leg != leg {
        return;
    }

    let tick = st.animator.tick();
    let text = (st.formatter)(tick.value);
    st.display.set_text(&text);
    tracing::trace!(value = tick.value, complete = tick.complete, "tick");

    if tick.complete {
        if let Some(id) = st.anim_timer.take() {
            st.scheduler.cancel(id);
        }
        return;
    }

    let weak = Arc::downgrade(shared);
    let callback: TimerCallback = Arc::new(move || {
        if let Some(shared) = weak.upgrade() {
            advance_leg(&shared, leg);
        }
    });
    st.anim_timer = st.scheduler.schedule(st.time, callback);
}

/// A numeric text field that animates value changes
///
/// Built through [`animated_number`]. All timers are cancelled when the
/// widget is unmounted or dropped; a timer firing after teardown can never
/// mutate the displayed value.
pub struct AnimatedNumber {
    state: SharedState,
    /// The widget's own display handle inside the merged fan-out
    buffer: Arc<TextBuffer>,
}

impl AnimatedNumber {
    /// Set a new target value and start an animation leg toward it
    ///
    /// Setting the value the widget already displays still runs a
    /// single-tick leg; it completes immediately with no visible change.
    pub fn set_value(&self, value: f64) {
        {
            let mut st = self.state.lock().unwrap();
            if st.unmounted {
                return;
            }
            let steps = st.steps;
            st.animator.retarget(value, steps);
            tracing::debug!(value, "target changed, starting leg");
        }
        start_leg(&self.state);
    }

    /// Supply the externally controlled initial value
    ///
    /// If it differs from the shadow baseline this is a hard reset: the
    /// displayed value snaps to `initial`, a fresh leg starts toward the
    /// current target, and the guard timer is (re-)armed. The shadow
    /// baseline only follows once the guard fires, so rapid consecutive
    /// resets each snap.
    pub fn set_initial_value(&self, initial: f64) {
        let changed = {
            let mut st = self.state.lock().unwrap();
            if st.unmounted || st.baseline == initial {
                false
            } else {
                tracing::debug!(baseline = initial, "baseline changed, resetting");
                if let Some(id) = st.anim_timer.take() {
                    st.scheduler.cancel(id);
                }

                st.animator.snap(initial);
                render(&mut st);

                let target = st.animator.target();
                let steps = st.steps;
                st.animator.retarget(target, steps);

                // Re-arming supersedes a guard from an earlier reset
                if let Some(id) = st.guard_timer.take() {
                    st.scheduler.cancel(id);
                }
                let weak = Arc::downgrade(&self.state);
                let callback: TimerCallback = Arc::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        let mut st = shared.lock().unwrap();
                        st.guard_timer = None;
                        st.baseline = initial;
                        tracing::debug!(baseline = initial, "reset guard expired");
                    }
                });
                st.guard_timer = st.scheduler.schedule(st.time + 1.0, callback);
                true
            }
        };

        if changed {
            start_leg(&self.state);
        }
    }

    /// Change the number of increments per leg
    ///
    /// Recomputes the step size of an in-flight leg from the current
    /// displayed value; the tick timer keeps running unchanged.
    pub fn set_steps(&self, steps: u32) -> Result<()> {
        if steps == 0 {
            return Err(AnimatedNumberError::InvalidSteps(steps));
        }
        let mut st = self.state.lock().unwrap();
        if st.unmounted {
            return Ok(());
        }
        st.steps = steps;
        let target = st.animator.target();
        st.animator.retarget(target, steps);
        Ok(())
    }

    /// Change the per-tick delay; applies to ticks armed from now on
    pub fn set_time(&self, time_ms: f64) -> Result<()> {
        if !time_ms.is_finite() || time_ms <= 0.0 {
            return Err(AnimatedNumberError::InvalidTime(time_ms));
        }
        self.state.lock().unwrap().time = time_ms;
        Ok(())
    }

    /// The numeric value currently displayed
    pub fn displayed_value(&self) -> f64 {
        self.state.lock().unwrap().animator.current()
    }

    /// The target the widget is converging toward
    pub fn target(&self) -> f64 {
        self.state.lock().unwrap().animator.target()
    }

    /// The displayed value run through the configured formatter
    pub fn formatted(&self) -> String {
        let st = self.state.lock().unwrap();
        (st.formatter)(st.animator.current())
    }

    /// The string most recently pushed to the display, if any
    pub fn rendered_text(&self) -> Option<String> {
        self.buffer.current()
    }

    /// Whether the displayed value has not yet reached the target
    pub fn is_animating(&self) -> bool {
        !self.state.lock().unwrap().animator.is_settled()
    }

    /// Tear the widget down: cancel both timers
    ///
    /// After unmounting no timer fire can mutate the displayed value.
    /// Called automatically on drop; unmounting twice is a no-op.
    pub fn unmount(&self) {
        let mut st = self.state.lock().unwrap();
        st.unmounted = true;
        if let Some(id) = st.anim_timer.take() {
            st.scheduler.cancel(id);
        }
        if let Some(id) = st.guard_timer.take() {
            st.scheduler.cancel(id);
        }
    }
}

impl Drop for AnimatedNumber {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::QueuedGate;
    use crate::scheduler::TimerScheduler;

    fn count_up_widget(scheduler: &TimerScheduler) -> (AnimatedNumber, Arc<TextBuffer>) {
        // Count-up fixture: 0 -> 100 in 10 steps, 6ms apart
        let external = Arc::new(TextBuffer::new());
        let widget = animated_number(100.0)
            .initial_value(0.0)
            .steps(10)
            .time(6.0)
            .display(external.clone() as Arc<dyn TextDisplay>)
            .build(&scheduler.handle())
            .unwrap();
        (widget, external)
    }

    #[test]
    fn test_build_rejects_zero_steps() {
        let scheduler = TimerScheduler::new();
        let err = animated_number(1.0)
            .steps(0)
            .build(&scheduler.handle())
            .err()
            .unwrap();
        assert_eq!(err, AnimatedNumberError::InvalidSteps(0));
    }

    #[test]
    fn test_build_rejects_bad_time() {
        let scheduler = TimerScheduler::new();
        for bad in [0.0, -6.0, f64::NAN, f64::INFINITY] {
            let err = animated_number(1.0)
                .time(bad)
                .build(&scheduler.handle())
                .err()
                .unwrap();
            assert!(matches!(err, AnimatedNumberError::InvalidTime(_)));
        }
    }

    #[test]
    fn test_mount_renders_initial_value() {
        let scheduler = TimerScheduler::new();
        let external = Arc::new(TextBuffer::new());
        let widget = animated_number(7.5)
            .display(external.clone() as Arc<dyn TextDisplay>)
            .build(&scheduler.handle())
            .unwrap();

        // No initial_value given: baseline defaults to value, no animation
        assert_eq!(external.history(), vec!["7.5"]);
        assert!(!external.is_editable());
        assert!(external.style().tabular_nums);
        assert_eq!(external.style().text_align, TextAlign::Right);
        assert!(!scheduler.has_pending());
        assert!(!widget.is_animating());
    }

    #[test]
    fn test_style_options_forwarded() {
        let scheduler = TimerScheduler::new();
        let external = Arc::new(TextBuffer::new());
        let _widget = animated_number(1.0)
            .disable_tabular_nums(true)
            .text_align(TextAlign::Center)
            .display(external.clone() as Arc<dyn TextDisplay>)
            .build(&scheduler.handle())
            .unwrap();

        assert!(!external.style().tabular_nums);
        assert_eq!(external.style().text_align, TextAlign::Center);
    }

    #[test]
    fn test_count_up_sequence() {
        let scheduler = TimerScheduler::new();
        let (widget, external) = count_up_widget(&scheduler);

        // Mount renders "0", the leg's first tick renders "10" right away
        assert_eq!(external.history(), vec!["0", "10"]);
        assert!(widget.is_animating());

        // One tick every 6ms until the leg completes
        for _ in 0..9 {
            scheduler.advance(6.0);
        }
        let expected: Vec<String> = std::iter::once("0".to_string())
            .chain((1..=10).map(|i| (i * 10).to_string()))
            .collect();
        assert_eq!(external.history(), expected);
        assert_eq!(widget.displayed_value(), 100.0);
        assert!(!widget.is_animating());
        assert!(!scheduler.has_pending());

        // Completion stopped the timer; time passing changes nothing
        scheduler.advance(600.0);
        assert_eq!(external.push_count(), 11);
    }

    #[test]
    fn test_idempotent_target_completes_in_one_tick() {
        let scheduler = TimerScheduler::new();
        let external = Arc::new(TextBuffer::new());
        let widget = animated_number(5.0)
            .display(external.clone() as Arc<dyn TextDisplay>)
            .build(&scheduler.handle())
            .unwrap();

        widget.set_value(5.0);

        // One tick, same text, no timer armed
        assert_eq!(external.history(), vec!["5", "5"]);
        assert!(!scheduler.has_pending());
        assert_eq!(widget.displayed_value(), 5.0);
    }

    #[test]
    fn test_retarget_mid_flight() {
        let scheduler = TimerScheduler::new();
        let (widget, external) = count_up_widget(&scheduler);

        // Reach 40, then the target drops to 50
        for _ in 0..3 {
            scheduler.advance(6.0);
        }
        assert_eq!(widget.displayed_value(), 40.0);

        widget.set_value(50.0);
        // New step size (50 - 40) / 10 = 1, first tick immediate
        assert_eq!(external.current(), Some("41".to_string()));

        for _ in 0..9 {
            scheduler.advance(6.0);
        }
        assert_eq!(widget.displayed_value(), 50.0);
        let tail: Vec<String> = external.history().split_off(5);
        assert_eq!(
            tail,
            (41..=50).map(|i| i.to_string()).collect::<Vec<String>>()
        );
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_reset_snaps_and_restarts() {
        let scheduler = TimerScheduler::new();
        let (widget, external) = count_up_widget(&scheduler);
        scheduler.advance(6.0); // displayed: 20

        widget.set_initial_value(20.0);

        // Snap render, then the restarted leg ticks from the new baseline:
        // step (100 - 20) / 10 = 8
        let history = external.history();
        assert_eq!(&history[history.len() - 2..], ["20", "28"]);
        assert_eq!(widget.target(), 100.0);

        // The leg keeps running toward the unchanged target
        scheduler.advance(6.0);
        assert_eq!(widget.displayed_value(), 36.0);
    }

    #[test]
    fn test_reset_reentrancy_settles_on_second_baseline() {
        let scheduler = TimerScheduler::new();
        let (widget, external) = count_up_widget(&scheduler);

        widget.set_initial_value(20.0);
        assert_eq!(external.current(), Some("28".to_string()));

        // Second reset before the 7ms guard fires: snaps again
        scheduler.advance(2.0);
        widget.set_initial_value(40.0);
        assert_eq!(widget.displayed_value(), 46.0); // step (100-40)/10 = 6

        // Let the re-armed guard expire
        scheduler.advance(7.0);

        // Shadow baseline settled on the second value: repeating it is a
        // no-op, while the first value would trigger a fresh snap
        let pushes = external.push_count();
        widget.set_initial_value(40.0);
        assert_eq!(external.push_count(), pushes);

        widget.set_initial_value(20.0);
        assert!(external.push_count() > pushes);
    }

    #[test]
    fn test_unmount_stops_all_timers() {
        let scheduler = TimerScheduler::new();
        let (widget, external) = count_up_widget(&scheduler);
        widget.set_initial_value(3.0); // guard + animation timer both armed
        let pushes = external.push_count();

        widget.unmount();
        assert!(!scheduler.has_pending());

        scheduler.advance(600.0);
        assert_eq!(external.push_count(), pushes);

        // Post-teardown updates are ignored too
        widget.set_value(9.0);
        widget.set_initial_value(9.0);
        assert_eq!(external.push_count(), pushes);
    }

    #[test]
    fn test_drop_cancels_timers() {
        let scheduler = TimerScheduler::new();
        let external = Arc::new(TextBuffer::new());
        {
            let _widget = animated_number(100.0)
                .initial_value(0.0)
                .display(external.clone() as Arc<dyn TextDisplay>)
                .build(&scheduler.handle())
                .unwrap();
            assert!(scheduler.has_pending());
        }
        assert!(!scheduler.has_pending());

        let pushes = external.push_count();
        scheduler.advance(600.0);
        assert_eq!(external.push_count(), pushes);
    }

    #[test]
    fn test_first_tick_defers_until_host_idle() {
        let scheduler = TimerScheduler::new();
        let gate = Arc::new(QueuedGate::new());
        let external = Arc::new(TextBuffer::new());
        let widget = animated_number(100.0)
            .initial_value(0.0)
            .gate(gate.clone() as Arc<dyn InteractionGate>)
            .display(external.clone() as Arc<dyn TextDisplay>)
            .build(&scheduler.handle())
            .unwrap();

        // Mount rendered the baseline but the leg is parked on the gate
        assert_eq!(external.history(), vec!["0"]);
        assert_eq!(gate.pending(), 1);
        assert!(!scheduler.has_pending());
        assert!(widget.is_animating());

        // Host goes idle: first tick runs, repeating timer arms
        gate.flush();
        assert_eq!(external.current(), Some("10".to_string()));
        assert!(scheduler.has_pending());
    }

    #[test]
    fn test_superseded_gate_hop_starts_no_second_tick_chain() {
        let scheduler = TimerScheduler::new();
        let gate = Arc::new(QueuedGate::new());
        let external = Arc::new(TextBuffer::new());
        let widget = animated_number(0.0)
            .gate(gate.clone() as Arc<dyn InteractionGate>)
            .display(external.clone() as Arc<dyn TextDisplay>)
            .build(&scheduler.handle())
            .unwrap();

        // Two target changes while the host is busy park two first-tick
        // hops on the gate; only the latest leg may survive the flush
        widget.set_value(100.0);
        widget.set_value(100.0);
        assert_eq!(gate.pending(), 2);

        gate.flush();
        assert_eq!(widget.displayed_value(), 10.0);
        assert_eq!(scheduler.pending_count(), 1);

        // A single tick chain keeps stepping; a second one would double it
        scheduler.advance(6.0);
        assert_eq!(widget.displayed_value(), 20.0);
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_set_steps_recomputes_in_flight_leg() {
        let scheduler = TimerScheduler::new();
        let (widget, _external) = count_up_widget(&scheduler);
        scheduler.advance(6.0); // displayed: 20

        // Remaining distance 80, now in 4 increments of 20
        widget.set_steps(4).unwrap();
        scheduler.advance(6.0);
        assert_eq!(widget.displayed_value(), 40.0);

        assert_eq!(widget.set_steps(0), Err(AnimatedNumberError::InvalidSteps(0)));
        assert!(widget.set_time(f64::NAN).is_err());
    }

    #[test]
    fn test_custom_formatter() {
        let scheduler = TimerScheduler::new();
        let external = Arc::new(TextBuffer::new());
        let widget = animated_number(2.0)
            .initial_value(0.0)
            .steps(2)
            .formatter(|v| format!("{v:.2} EUR"))
            .display(external.clone() as Arc<dyn TextDisplay>)
            .build(&scheduler.handle())
            .unwrap();

        scheduler.advance(6.0);
        assert_eq!(
            external.history(),
            vec!["0.00 EUR", "1.00 EUR", "2.00 EUR"]
        );
        assert_eq!(widget.formatted(), "2.00 EUR");
    }
}
