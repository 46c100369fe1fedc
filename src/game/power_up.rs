//! Power-Up Lifecycle
//!
//! Per-player timed effect cycle: apply, broadcast, wait, broadcast, expire.
//!
//! ```text
//!            pickup (idle)                   deadline <= now
//!   Idle ─────────────────────► Active ─────────────────────► Idle
//!             set flag                  publish expired
//!             light indicator           clear indicator
//!             publish applied           clear flag
//!             start deadline
//! ```
//!
//! The wait is a deadline in simulation ticks checked every step, so one
//! player's active effect never holds up anything else. A pickup touched
//! while `Active` is wasted: the caller removes it and nothing is published.

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{Fixed, seconds_to_ticks};
use crate::game::hub::SubscriptionId;
use crate::game::roster::PlayerStats;
use crate::game::score::ScoreCollector;
use crate::game::state::PlayerId;
use crate::game::world::Indicator;

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// Indicator color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Create from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b)
    }
}

/// Effect-specific parameters. Opaque to the lifecycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectPayload {
    /// Multiply collected points
    ScoreMultiplier {
        /// Multiplier while active
        factor: Fixed,
    },
    /// Set the player's scale
    Resize {
        /// Scale while active
        scale: Fixed,
    },
    /// Multiply the player's move magnitude
    SpeedBoost {
        /// Multiplier while active
        factor: Fixed,
    },
    /// No built-in effect; for external listeners keyed on the name
    Marker,
}

/// A configured power-up. Immutable once created.
///
/// The only way to build one is [`PowerUpDescriptor::new`]:
///
/// ```compile_fail
/// use arena_runtime::game::power_up::{EffectPayload, PowerUpDescriptor, Rgb};
/// let broken = PowerUpDescriptor {
///     name: "Broken".to_string(),
///     duration: 0,
///     color: Rgb::new(0, 0, 0),
///     effect: EffectPayload::Marker,
/// };
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PowerUpDescriptor {
    name: String,
    duration: Fixed,
    color: Rgb,
    effect: EffectPayload,
}

impl PowerUpDescriptor {
    /// Create a descriptor.
    ///
    /// # Panics
    /// Panics if `duration` is not positive.
    pub fn new(name: impl Into<String>, duration: Fixed, color: Rgb, effect: EffectPayload) -> Self {
        let name = name.into();
        assert!(duration > 0, "power-up {:?} must have a positive duration", name);
        Self { name, duration, color, effect }
    }

    /// Identifier, also what listeners match on.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effect duration in seconds.
    pub fn duration(&self) -> Fixed {
        self.duration
    }

    /// Indicator color while active.
    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Effect parameters.
    pub fn effect(&self) -> &EffectPayload {
        &self.effect
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

/// The player state an effect listener may touch.
#[derive(Debug)]
pub struct EffectTarget<'a> {
    /// Player the effect belongs to
    pub player: PlayerId,
    /// That player's scorer
    pub score: &'a mut ScoreCollector,
    /// That player's tunable stats
    pub stats: &'a mut PlayerStats,
}

/// Reacts to power-ups starting and ending.
///
/// One listener instance serves every player, so any memory it keeps must
/// be keyed by `target.player`.
pub trait PowerUpListener: Send {
    /// A power-up started on `target.player`.
    fn on_applied(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>);

    /// A power-up ended on `target.player`.
    fn on_expired(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>);
}

/// Registry of power-up listeners. Delivery is synchronous, in
/// registration order.
#[derive(Default)]
pub struct PowerUpBus {
    listeners: Vec<(SubscriptionId, Box<dyn PowerUpListener>)>,
    next_subscription: u64,
}

impl PowerUpBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe<L: PowerUpListener + 'static>(&mut self, listener: L) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.listeners.iter().position(|(sid, _)| *sid == id) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Is the bus empty?
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn publish_applied(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_applied(descriptor, target);
        }
    }

    fn publish_expired(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_expired(descriptor, target);
        }
    }
}

impl std::fmt::Debug for PowerUpBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerUpBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Collaborators a transition needs.
pub struct PowerUpContext<'a> {
    /// Current simulation tick
    pub now: u32,
    /// Simulation steps per second
    pub tick_rate: u32,
    /// Indicator intensity while active
    pub intensity: Fixed,
    /// Listeners to notify
    pub bus: &'a mut PowerUpBus,
    /// Where the indicator lives
    pub indicator: &'a mut dyn Indicator,
}

/// Lifecycle state.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum PowerUpPhase {
    /// No effect running
    #[default]
    Idle,
    /// One effect running until `expires_at`
    Active {
        /// The running power-up
        descriptor: Arc<PowerUpDescriptor>,
        /// Tick at which it ends
        expires_at: u32,
    },
}

/// One player's power-up state machine.
#[derive(Clone, Debug, Default)]
pub struct PowerUpLifecycle {
    phase: PowerUpPhase,
}

impl PowerUpLifecycle {
    /// Create an idle lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> &PowerUpPhase {
        &self.phase
    }

    /// Is an effect running?
    pub fn is_active(&self) -> bool {
        matches!(self.phase, PowerUpPhase::Active { .. })
    }

    /// Deadline of the running effect.
    pub fn expires_at(&self) -> Option<u32> {
        match &self.phase {
            PowerUpPhase::Active { expires_at, .. } => Some(*expires_at),
            PowerUpPhase::Idle => None,
        }
    }

    /// Start `descriptor` if idle.
    ///
    /// Returns the deadline tick, or `None` if an effect is already running
    /// (the pickup is wasted and nothing is published).
    pub fn try_apply(
        &mut self,
        descriptor: Arc<PowerUpDescriptor>,
        ctx: &mut PowerUpContext<'_>,
        target: &mut EffectTarget<'_>,
    ) -> Option<u32> {
        if self.is_active() {
            debug!(
                "{:?} already has a power-up, discarding {:?}",
                target.player, descriptor.name()
            );
            return None;
        }

        let expires_at = ctx.now + seconds_to_ticks(descriptor.duration(), ctx.tick_rate);
        self.phase = PowerUpPhase::Active {
            descriptor: Arc::clone(&descriptor),
            expires_at,
        };

        ctx.indicator.set_indicator(target.player, descriptor.color(), ctx.intensity);
        ctx.bus.publish_applied(&descriptor, target);

        debug!(
            "{:?} applied {:?} until tick {}",
            target.player, descriptor.name(), expires_at
        );
        Some(expires_at)
    }

    /// Expire the running effect if its deadline has passed.
    pub fn poll_expiry(
        &mut self,
        ctx: &mut PowerUpContext<'_>,
        target: &mut EffectTarget<'_>,
    ) -> Option<Arc<PowerUpDescriptor>> {
        match self.expires_at() {
            Some(expires_at) if expires_at <= ctx.now => self.force_expire(ctx, target),
            _ => None,
        }
    }

    /// Expire the running effect now, regardless of its deadline.
    ///
    /// Idempotent: calling it while idle does nothing and returns `None`.
    pub fn force_expire(
        &mut self,
        ctx: &mut PowerUpContext<'_>,
        target: &mut EffectTarget<'_>,
    ) -> Option<Arc<PowerUpDescriptor>> {
        let descriptor = match &self.phase {
            PowerUpPhase::Active { descriptor, .. } => Arc::clone(descriptor),
            PowerUpPhase::Idle => return None,
        };

        ctx.bus.publish_expired(&descriptor, target);
        ctx.indicator.clear_indicator(target.player);
        self.phase = PowerUpPhase::Idle;

        debug!("{:?} power-up {:?} expired", target.player, descriptor.name());
        Some(descriptor)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::core::fixed::{to_fixed, FIXED_ONE, INDICATOR_INTENSITY};

    type Log = Arc<Mutex<Vec<String>>>;

    struct LoggingIndicator(Log);

    impl Indicator for LoggingIndicator {
        fn set_indicator(&mut self, player: PlayerId, _color: Rgb, intensity: Fixed) {
            self.0.lock().unwrap().push(format!("light {} {}", player.0, intensity));
        }

        fn clear_indicator(&mut self, player: PlayerId) {
            self.0.lock().unwrap().push(format!("dark {}", player.0));
        }
    }

    struct LoggingListener(Log);

    impl PowerUpListener for LoggingListener {
        fn on_applied(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
            self.0.lock().unwrap().push(format!("applied {} {}", target.player.0, descriptor.name()));
        }

        fn on_expired(&mut self, descriptor: &PowerUpDescriptor, target: &mut EffectTarget<'_>) {
            self.0.lock().unwrap().push(format!("expired {} {}", target.player.0, descriptor.name()));
        }
    }

    struct Fixture {
        log: Log,
        bus: PowerUpBus,
        indicator: LoggingIndicator,
        score: ScoreCollector,
        stats: PlayerStats,
        lifecycle: PowerUpLifecycle,
    }

    impl Fixture {
        fn new() -> Self {
            let log: Log = Arc::new(Mutex::new(Vec::new()));
            let mut bus = PowerUpBus::new();
            bus.subscribe(LoggingListener(Arc::clone(&log)));
            Self {
                indicator: LoggingIndicator(Arc::clone(&log)),
                log,
                bus,
                score: ScoreCollector::new(0),
                stats: PlayerStats::default(),
                lifecycle: PowerUpLifecycle::new(),
            }
        }

        fn apply(&mut self, now: u32, descriptor: Arc<PowerUpDescriptor>) -> Option<u32> {
            let mut ctx = PowerUpContext {
                now,
                tick_rate: 60,
                intensity: INDICATOR_INTENSITY,
                bus: &mut self.bus,
                indicator: &mut self.indicator,
            };
            let mut target = EffectTarget {
                player: PlayerId::new(1),
                score: &mut self.score,
                stats: &mut self.stats,
            };
            self.lifecycle.try_apply(descriptor, &mut ctx, &mut target)
        }

        fn poll(&mut self, now: u32) -> Option<Arc<PowerUpDescriptor>> {
            let mut ctx = PowerUpContext {
                now,
                tick_rate: 60,
                intensity: INDICATOR_INTENSITY,
                bus: &mut self.bus,
                indicator: &mut self.indicator,
            };
            let mut target = EffectTarget {
                player: PlayerId::new(1),
                score: &mut self.score,
                stats: &mut self.stats,
            };
            self.lifecycle.poll_expiry(&mut ctx, &mut target)
        }

        fn force(&mut self, now: u32) -> Option<Arc<PowerUpDescriptor>> {
            let mut ctx = PowerUpContext {
                now,
                tick_rate: 60,
                intensity: INDICATOR_INTENSITY,
                bus: &mut self.bus,
                indicator: &mut self.indicator,
            };
            let mut target = EffectTarget {
                player: PlayerId::new(1),
                score: &mut self.score,
                stats: &mut self.stats,
            };
            self.lifecycle.force_expire(&mut ctx, &mut target)
        }

        fn entries(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    fn marker(name: &str, seconds: f64) -> Arc<PowerUpDescriptor> {
        Arc::new(PowerUpDescriptor::new(
            name,
            to_fixed(seconds),
            Rgb::new(255, 255, 0),
            EffectPayload::Marker,
        ))
    }

    #[test]
    fn test_apply_then_expire_order() {
        let mut fx = Fixture::new();

        assert_eq!(fx.apply(10, marker("Boost", 2.0)), Some(130));
        assert!(fx.lifecycle.is_active());

        assert!(fx.poll(129).is_none());
        assert_eq!(fx.poll(130).map(|d| d.name().to_string()), Some("Boost".to_string()));
        assert!(!fx.lifecycle.is_active());

        assert_eq!(
            fx.entries(),
            vec![
                format!("light 1 {}", INDICATOR_INTENSITY),
                "applied 1 Boost".to_string(),
                "expired 1 Boost".to_string(),
                "dark 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_second_pickup_while_active_is_silent() {
        let mut fx = Fixture::new();
        fx.apply(0, marker("First", 5.0));
        let before = fx.entries();

        assert_eq!(fx.apply(5, marker("Second", 5.0)), None);
        assert_eq!(fx.entries(), before);
        assert_eq!(fx.lifecycle.expires_at(), Some(300));

        // The first effect still ends on its own schedule
        let expired = fx.poll(300);
        assert_eq!(expired.map(|d| d.name().to_string()), Some("First".to_string()));
        let expired_count = fx.entries().iter().filter(|e| e.starts_with("expired")).count();
        assert_eq!(expired_count, 1);
    }

    #[test]
    fn test_double_expire_fires_once() {
        let mut fx = Fixture::new();
        fx.apply(0, marker("Boost", 1.0));

        assert!(fx.force(20).is_some());
        assert!(fx.force(20).is_none());
        assert!(fx.poll(60).is_none());

        let expired_count = fx.entries().iter().filter(|e| e.starts_with("expired")).count();
        assert_eq!(expired_count, 1);
    }

    #[test]
    fn test_reapply_after_expiry() {
        let mut fx = Fixture::new();
        fx.apply(0, marker("A", 0.5));
        fx.poll(30);

        assert_eq!(fx.apply(31, marker("B", 0.5)), Some(61));
    }

    #[test]
    fn test_unsubscribed_listener_not_called() {
        let mut fx = Fixture::new();
        let log = Arc::clone(&fx.log);
        let extra = fx.bus.subscribe(LoggingListener(log));
        assert_eq!(fx.bus.len(), 2);
        assert!(fx.bus.unsubscribe(extra));
        assert!(!fx.bus.unsubscribe(extra));

        fx.apply(0, marker("Solo", 1.0));
        let applied = fx.entries().iter().filter(|e| e.starts_with("applied")).count();
        assert_eq!(applied, 1);
    }

    #[test]
    #[should_panic(expected = "positive duration")]
    fn test_zero_duration_rejected() {
        let _ = PowerUpDescriptor::new("Broken", 0, Rgb::new(0, 0, 0), EffectPayload::Marker);
    }

    #[test]
    fn test_descriptor_accessors() {
        let d = PowerUpDescriptor::new("Glow", FIXED_ONE / 2, Rgb::new(9, 8, 7), EffectPayload::Marker);
        assert_eq!(d.name(), "Glow");
        assert_eq!(d.duration(), FIXED_ONE / 2);
        assert_eq!(d.color(), Rgb::new(9, 8, 7));
        assert_eq!(d.effect(), &EffectPayload::Marker);
    }
}
