//! Game clock and phase authority
//!
//! Owns the current phase and the time-scale multiplier. Every other
//! simulation component advances by `scaled_delta(dt)` only, so pausing or
//! ending a run freezes the world without cancelling anything.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level phase of the game clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    /// Assets loading / world being laid out
    Loading,
    /// Active gameplay
    Running,
    /// Game is paused
    Paused,
    /// Run ended; terminal until `reset`
    GameOver,
}

/// Phase transitions a subscriber can listen for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseEvent {
    Start,
    Pause,
    Resume,
    GameOver,
    Reset,
}

/// Payload handed to subscribers when a transition fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub event: PhaseEvent,
    pub from: SimPhase,
    pub to: SimPhase,
}

/// Handle returned by `GameClock::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Callback = Box<dyn FnMut(&PhaseChange)>;

struct Subscriber {
    id: SubscriptionId,
    event: PhaseEvent,
    callback: Callback,
}

/// The single process-scoped clock/state authority
pub struct GameClock {
    phase: SimPhase,
    /// Phase to return to on resume
    previous: SimPhase,
    /// Stored multiplier, always >= 0
    time_scale: f32,
    subscribers: Vec<Subscriber>,
    next_subscription: u32,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GameClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameClock")
            .field("phase", &self.phase)
            .field("previous", &self.previous)
            .field("time_scale", &self.time_scale)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self {
            phase: SimPhase::Loading,
            previous: SimPhase::Loading,
            time_scale: 1.0,
            subscribers: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Current phase
    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    /// Effective time scale: 0 while paused or game over, stored scale otherwise
    pub fn time_scale(&self) -> f32 {
        match self.phase {
            SimPhase::Paused | SimPhase::GameOver => 0.0,
            SimPhase::Loading | SimPhase::Running => self.time_scale,
        }
    }

    /// Stored multiplier, regardless of phase
    pub fn stored_time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn is_running(&self) -> bool {
        self.phase == SimPhase::Running
    }

    /// Frame delta scaled by the effective time scale
    ///
    /// This is the only time source gameplay motion may consume.
    pub fn scaled_delta(&self, dt: f32) -> f32 {
        dt.max(0.0) * self.time_scale()
    }

    /// Set the stored multiplier (clamped to >= 0). Ignored after game over.
    pub fn set_time_scale(&mut self, scale: f32) {
        if self.phase == SimPhase::GameOver {
            return;
        }
        // f32::max discards NaN
        self.time_scale = scale.max(0.0);
    }

    /// Loading -> Running. Returns false if not loading.
    pub fn start(&mut self) -> bool {
        if self.phase != SimPhase::Loading {
            return false;
        }
        self.transition(SimPhase::Running, PhaseEvent::Start);
        true
    }

    /// Running -> Paused. Returns false if not running.
    pub fn pause(&mut self) -> bool {
        if self.phase != SimPhase::Running {
            return false;
        }
        self.previous = self.phase;
        self.transition(SimPhase::Paused, PhaseEvent::Pause);
        true
    }

    /// Paused -> remembered phase. Returns false if not paused.
    pub fn resume(&mut self) -> bool {
        if self.phase != SimPhase::Paused {
            return false;
        }
        let target = match self.previous {
            SimPhase::Paused | SimPhase::GameOver => SimPhase::Running,
            other => other,
        };
        self.transition(target, PhaseEvent::Resume);
        true
    }

    /// Pause when running, resume when paused, no-op otherwise
    pub fn toggle_pause(&mut self) -> bool {
        match self.phase {
            SimPhase::Running => self.pause(),
            SimPhase::Paused => self.resume(),
            SimPhase::Loading | SimPhase::GameOver => false,
        }
    }

    /// Enter game over from any other phase
    ///
    /// Returns true only for the call that actually performed the
    /// transition, so callers can finalize a score exactly once.
    pub fn set_game_over(&mut self) -> bool {
        if self.phase == SimPhase::GameOver {
            return false;
        }
        self.time_scale = 0.0;
        self.previous = self.phase;
        self.transition(SimPhase::GameOver, PhaseEvent::GameOver);
        true
    }

    /// GameOver -> Loading with time scale restored to 1.0
    pub fn reset(&mut self) -> bool {
        if self.phase != SimPhase::GameOver {
            return false;
        }
        self.time_scale = 1.0;
        self.previous = SimPhase::Loading;
        self.transition(SimPhase::Loading, PhaseEvent::Reset);
        true
    }

    /// Register a callback for one kind of transition
    pub fn subscribe<F>(&mut self, event: PhaseEvent, callback: F) -> SubscriptionId
    where
        F: FnMut(&PhaseChange) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push(Subscriber {
            id,
            event,
            callback: Box::new(callback),
        });
        id
    }

    pub fn on_pause<F: FnMut(&PhaseChange) + 'static>(&mut self, callback: F) -> SubscriptionId {
        self.subscribe(PhaseEvent::Pause, callback)
    }

    pub fn on_resume<F: FnMut(&PhaseChange) + 'static>(&mut self, callback: F) -> SubscriptionId {
        self.subscribe(PhaseEvent::Resume, callback)
    }

    pub fn on_game_over<F: FnMut(&PhaseChange) + 'static>(
        &mut self,
        callback: F,
    ) -> SubscriptionId {
        self.subscribe(PhaseEvent::GameOver, callback)
    }

    pub fn on_reset<F: FnMut(&PhaseChange) + 'static>(&mut self, callback: F) -> SubscriptionId {
        self.subscribe(PhaseEvent::Reset, callback)
    }

    /// Remove a subscription. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    fn transition(&mut self, to: SimPhase, event: PhaseEvent) {
        let change = PhaseChange {
            event,
            from: self.phase,
            to,
        };
        self.phase = to;
        log::info!("Phase {:?} -> {:?}", change.from, change.to);

        for sub in self.subscribers.iter_mut().filter(|s| s.event == event) {
            (sub.callback)(&change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn running_clock() -> GameClock {
        let mut clock = GameClock::new();
        assert!(clock.start());
        clock
    }

    #[test]
    fn test_starts_loading() {
        let clock = GameClock::new();
        assert_eq!(clock.phase(), SimPhase::Loading);
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_pause_resume() {
        let mut clock = running_clock();
        assert!(clock.pause());
        assert_eq!(clock.phase(), SimPhase::Paused);
        assert_eq!(clock.time_scale(), 0.0);
        assert_eq!(clock.scaled_delta(0.5), 0.0);

        assert!(clock.resume());
        assert_eq!(clock.phase(), SimPhase::Running);
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_illegal_transitions_are_noops() {
        let mut clock = GameClock::new();
        assert!(!clock.pause());
        assert!(!clock.resume());
        assert!(!clock.toggle_pause());
        assert!(!clock.reset());
        assert_eq!(clock.phase(), SimPhase::Loading);

        clock.start();
        assert!(!clock.start());
        assert!(!clock.resume());
        assert_eq!(clock.phase(), SimPhase::Running);
    }

    #[test]
    fn test_game_over_is_terminal_until_reset() {
        let mut clock = running_clock();
        clock.set_time_scale(2.0);
        assert!(clock.set_game_over());
        assert_eq!(clock.time_scale(), 0.0);
        assert_eq!(clock.stored_time_scale(), 0.0);

        assert!(!clock.toggle_pause());
        assert!(!clock.start());
        clock.set_time_scale(3.0);
        assert_eq!(clock.stored_time_scale(), 0.0);
        assert_eq!(clock.phase(), SimPhase::GameOver);

        assert!(clock.reset());
        assert_eq!(clock.phase(), SimPhase::Loading);
        assert_eq!(clock.time_scale(), 1.0);
    }

    #[test]
    fn test_game_over_from_paused() {
        let mut clock = running_clock();
        clock.pause();
        assert!(clock.set_game_over());
        assert_eq!(clock.phase(), SimPhase::GameOver);
    }

    #[test]
    fn test_time_scale_clamped() {
        let mut clock = running_clock();
        clock.set_time_scale(-4.0);
        assert_eq!(clock.time_scale(), 0.0);
        clock.set_time_scale(f32::NAN);
        assert_eq!(clock.time_scale(), 0.0);
        clock.set_time_scale(1.5);
        assert_eq!(clock.scaled_delta(2.0), 3.0);
    }

    #[test]
    fn test_subscribers_fire_per_event() {
        let mut clock = GameClock::new();
        let pauses = Rc::new(Cell::new(0));
        let resumes = Rc::new(Cell::new(0));
        let p = pauses.clone();
        let r = resumes.clone();
        clock.on_pause(move |change| {
            assert_eq!(change.to, SimPhase::Paused);
            p.set(p.get() + 1);
        });
        let id = clock.on_resume(move |_| r.set(r.get() + 1));

        clock.start();
        clock.toggle_pause();
        clock.toggle_pause();
        assert_eq!(pauses.get(), 1);
        assert_eq!(resumes.get(), 1);

        assert!(clock.unsubscribe(id));
        assert!(!clock.unsubscribe(id));
        clock.toggle_pause();
        clock.toggle_pause();
        assert_eq!(pauses.get(), 2);
        assert_eq!(resumes.get(), 1);
    }

    #[test]
    fn test_reset_subscriber() {
        let mut clock = running_clock();
        let resets = Rc::new(Cell::new(0));
        let r = resets.clone();
        clock.on_reset(move |change| {
            assert_eq!(change.from, SimPhase::GameOver);
            r.set(r.get() + 1);
        });
        clock.set_game_over();
        clock.reset();
        clock.reset();
        assert_eq!(resets.get(), 1);
    }

    proptest! {
        #[test]
        fn prop_scaled_delta_matches_effective_scale(
            dt in 0.0f32..1.0,
            scale in 0.0f32..4.0,
            ops in prop::collection::vec(0u8..3, 0..20),
        ) {
            let mut clock = running_clock();
            clock.set_time_scale(scale);
            for op in ops {
                match op {
                    0 => { clock.pause(); }
                    1 => { clock.resume(); }
                    _ => { clock.toggle_pause(); }
                }
                prop_assert!(matches!(clock.phase(), SimPhase::Running | SimPhase::Paused));
                let expected = if clock.phase() == SimPhase::Paused { 0.0 } else { scale };
                prop_assert_eq!(clock.time_scale(), expected);
                prop_assert_eq!(clock.scaled_delta(dt), dt * expected);
            }
            clock.set_game_over();
            prop_assert_eq!(clock.scaled_delta(dt), 0.0);
        }
    }
}
