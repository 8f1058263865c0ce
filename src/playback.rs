use std::time::Duration;

use instant::Instant;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::PlaybackError,
    settings::{SettingsPlayback, BASE_INTERVAL_MAX, SPEED_MAX, SPEED_MIN},
};

/// Read-only view of the playback position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub is_playing: bool,
    pub current_step: usize,
    pub total_steps: usize,
    pub speed: f32,
}

/// Result of a [`StepClock::seek`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Seek {
    Exact(usize),
    /// The requested step was outside `0..total_steps` and was clamped.
    Clamped { requested: usize, applied: usize },
}

impl Seek {
    pub fn applied(self) -> usize {
        match self {
            Seek::Exact(step) | Seek::Clamped { applied: step, .. } => step,
        }
    }
}

/// Labels the session mode shown next to the transport controls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Live,
    Replay,
    Debug,
}

impl ExecutionMode {
    pub const ALL: [ExecutionMode; 3] = [
        ExecutionMode::Live,
        ExecutionMode::Replay,
        ExecutionMode::Debug,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExecutionMode::Live => "Live Execution",
            ExecutionMode::Replay => "Replay Mode",
            ExecutionMode::Debug => "Debug Mode",
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    interval: Duration,
    deadline: Instant,
}

impl Timer {
    fn arm(interval: Duration, now: Instant) -> Option<Self> {
        Some(Self {
            interval,
            deadline: now.checked_add(interval)?,
        })
    }
}

/// Advances a discrete step counter while playing.
///
/// The clock is polled: the host calls [`StepClock::tick`] from its update loop
/// and uses [`StepClock::next_deadline`] to decide when to wake up again.
/// Playing means a timer is armed. Pausing, stopping, reaching the last step or
/// dropping the clock releases the timer, so no step can advance afterwards.
#[derive(Debug)]
pub struct StepClock {
    current_step: usize,
    total_steps: usize,
    speed: f32,
    base_interval: Duration,

    timer: Option<Timer>,
}

impl StepClock {
    /// Creates a paused clock at step 0.
    ///
    /// An invalid speed in `settings` falls back to `1.0`; a base interval
    /// above [`BASE_INTERVAL_MAX`] is capped.
    pub fn new(total_steps: usize, settings: &SettingsPlayback) -> Self {
        let speed = if valid_speed(settings.speed) {
            settings.speed
        } else {
            warn!("ignoring invalid playback speed {}", settings.speed);
            1.
        };

        let base_interval = if settings.base_interval > BASE_INTERVAL_MAX {
            warn!(
                "capping playback interval {:?} to {BASE_INTERVAL_MAX:?}",
                settings.base_interval
            );
            BASE_INTERVAL_MAX
        } else {
            settings.base_interval
        };

        Self {
            current_step: 0,
            total_steps: total_steps.max(1),
            speed,
            base_interval,
            timer: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        PlaybackState {
            is_playing: self.is_playing(),
            current_step: self.current_step,
            total_steps: self.total_steps,
            speed: self.speed,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn last_step(&self) -> usize {
        self.total_steps - 1
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Time between two steps at the current speed.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.base_interval.as_secs_f64() / f64::from(self.speed))
            .unwrap_or(self.base_interval)
    }

    /// Instant of the next scheduled step, if playing.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.deadline)
    }

    /// Starts playing. At the last step playback starts over from step 0.
    pub fn play(&mut self, now: Instant) {
        if self.current_step >= self.last_step() {
            self.current_step = 0;
        }
        self.arm(now);
        info!("playback started at step {}", self.current_step);
    }

    pub fn pause(&mut self) {
        if self.disarm() {
            info!("playback paused at step {}", self.current_step);
        }
    }

    pub fn stop(&mut self) {
        self.disarm();
        self.current_step = 0;
        info!("playback stopped");
    }

    pub fn restart(&mut self, now: Instant) {
        self.current_step = 0;
        self.arm(now);
        info!("playback restarted");
    }

    /// Plays when paused and pauses when playing.
    pub fn toggle(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Moves to `step` without touching the play state.
    ///
    /// Steps past the end are clamped to the last step, never rejected.
    pub fn seek(&mut self, step: usize) -> Seek {
        let applied = step.min(self.last_step());
        self.current_step = applied;

        if applied == step {
            debug!("seek to step {applied}");
            Seek::Exact(applied)
        } else {
            warn!("seek to step {step} clamped to {applied}");
            Seek::Clamped {
                requested: step,
                applied,
            }
        }
    }

    pub fn seek_end(&mut self) -> Seek {
        self.seek(self.last_step())
    }

    pub fn step_forward(&mut self) -> Seek {
        self.seek((self.current_step + 1).min(self.last_step()))
    }

    pub fn step_back(&mut self) -> Seek {
        self.seek(self.current_step.saturating_sub(1))
    }

    /// Changes the speed multiplier. While playing the pending timer is
    /// cancelled and a new one is armed with the new interval from `now`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidSpeed`] for speeds outside
    /// [`SPEED_MIN`]..=[`SPEED_MAX`], including NaN.
    pub fn set_speed(&mut self, speed: f32, now: Instant) -> Result<(), PlaybackError> {
        if !valid_speed(speed) {
            return Err(PlaybackError::InvalidSpeed(speed));
        }

        self.speed = speed;
        if self.is_playing() {
            self.arm(now);
        }
        debug!("playback speed set to {speed}x");
        Ok(())
    }

    /// Fires the timer if its deadline has passed.
    ///
    /// Advances one step per elapsed interval and disarms itself on reaching the
    /// last step. Returns the new step when it changed.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let mut advanced = false;

        while let Some(timer) = self.timer {
            if now < timer.deadline {
                break;
            }

            if self.current_step < self.last_step() {
                self.current_step += 1;
                advanced = true;
            }

            if self.current_step >= self.last_step() {
                self.disarm();
                info!("playback finished at step {}", self.current_step);
                break;
            }

            let Some(deadline) = timer.deadline.checked_add(timer.interval) else {
                self.disarm();
                warn!("playback deadline out of range, pausing at step {}", self.current_step);
                break;
            };
            self.timer = Some(Timer { deadline, ..timer });
        }

        advanced.then_some(self.current_step)
    }

    /// Releases the timer and consumes the clock.
    pub fn teardown(mut self) -> PlaybackState {
        self.disarm();
        self.state()
    }

    fn arm(&mut self, now: Instant) {
        self.timer = Timer::arm(self.interval(), now);
        if self.timer.is_none() {
            warn!("playback deadline out of range, staying paused");
        }
    }

    fn disarm(&mut self) -> bool {
        self.timer.take().is_some()
    }
}

fn valid_speed(speed: f32) -> bool {
    (SPEED_MIN..=SPEED_MAX).contains(&speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(total: usize) -> StepClock {
        StepClock::new(total, &SettingsPlayback::default())
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_new_clock_is_paused_at_zero() {
        let c = clock(6);
        let s = c.state();
        assert!(!s.is_playing);
        assert_eq!(s.current_step, 0);
        assert_eq!(s.total_steps, 6);
        assert_eq!(s.speed, 1.);
        assert!(c.next_deadline().is_none());
    }

    #[test]
    fn test_tick_before_deadline_does_nothing() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.play(t0);
        assert_eq!(c.tick(t0 + ms(1999)), None);
        assert_eq!(c.tick(t0 + ms(2000)), Some(1));
        assert_eq!(c.next_deadline(), Some(t0 + ms(4000)));
    }

    #[test]
    fn test_late_poll_catches_up_one_step_per_interval() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.play(t0);
        assert_eq!(c.tick(t0 + ms(6500)), Some(3));
        assert!(c.is_playing());
    }

    #[test]
    fn test_play_from_second_to_last_stops_after_one_tick() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.seek(4);
        c.play(t0);

        assert_eq!(c.tick(t0 + c.interval()), Some(5));
        assert!(!c.is_playing());
        assert!(c.next_deadline().is_none());
        assert_eq!(c.tick(t0 + ms(60_000)), None);
        assert_eq!(c.current_step(), 5);
    }

    #[test]
    fn test_play_at_end_starts_over() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.seek_end();
        c.play(t0);
        assert_eq!(c.current_step(), 0);
        assert!(c.is_playing());
    }

    #[test]
    fn test_pause_keeps_step_and_cancels_timer() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.play(t0);
        c.tick(t0 + ms(2000));
        c.pause();
        assert_eq!(c.current_step(), 1);
        assert_eq!(c.tick(t0 + ms(10_000)), None);
        assert_eq!(c.current_step(), 1);
    }

    #[test]
    fn test_stop_resets_and_restart_plays() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.seek(3);
        c.play(t0);
        c.stop();
        assert!(!c.is_playing());
        assert_eq!(c.current_step(), 0);

        c.seek(4);
        c.restart(t0);
        assert!(c.is_playing());
        assert_eq!(c.current_step(), 0);
    }

    #[test]
    fn test_toggle() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.toggle(t0);
        assert!(c.is_playing());
        c.toggle(t0);
        assert!(!c.is_playing());
    }

    #[test]
    fn test_seek_clamps_and_is_idempotent() {
        let mut c = clock(6);
        assert_eq!(
            c.seek(42),
            Seek::Clamped {
                requested: 42,
                applied: 5
            }
        );

        let once = {
            c.seek(3);
            c.state()
        };
        c.seek(3);
        assert_eq!(c.state(), once);
        assert_eq!(c.seek(3), Seek::Exact(3));
    }

    #[test]
    fn test_seek_does_not_change_play_state() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.play(t0);
        c.seek(2);
        assert!(c.is_playing());
        c.pause();
        c.seek(4);
        assert!(!c.is_playing());
    }

    #[test]
    fn test_step_forward_and_back_saturate() {
        let mut c = clock(3);
        assert_eq!(c.step_back().applied(), 0);
        c.step_forward();
        c.step_forward();
        assert_eq!(c.step_forward(), Seek::Exact(2));
    }

    #[test]
    fn test_speed_change_rearms_without_double_fire() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.set_speed(2., t0).unwrap();
        c.play(t0);
        assert_eq!(c.interval(), ms(1000));

        assert_eq!(c.tick(t0 + ms(1000)), Some(1));

        c.set_speed(1., t0 + ms(1500)).unwrap();
        assert_eq!(c.interval(), ms(2000));
        assert_eq!(c.next_deadline(), Some(t0 + ms(3500)));

        // the old 1000ms cadence would have fired here
        assert_eq!(c.tick(t0 + ms(2000)), None);
        assert_eq!(c.tick(t0 + ms(3499)), None);
        assert_eq!(c.tick(t0 + ms(3500)), Some(2));
    }

    #[test]
    fn test_speed_change_while_paused_does_not_arm() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.set_speed(3., t0).unwrap();
        assert!(!c.is_playing());
        assert!(c.next_deadline().is_none());
    }

    #[test]
    fn test_invalid_speed_is_rejected() {
        let t0 = Instant::now();
        let mut c = clock(6);
        assert_eq!(c.set_speed(0., t0), Err(PlaybackError::InvalidSpeed(0.)));
        assert!(c.set_speed(f32::NAN, t0).is_err());
        assert!(c.set_speed(-1., t0).is_err());
        assert_eq!(c.speed(), 1.);
    }

    #[test]
    fn test_out_of_range_speed_while_paused_keeps_clock_usable() {
        let t0 = Instant::now();
        let mut c = clock(6);
        assert_eq!(
            c.set_speed(1e-20, t0),
            Err(PlaybackError::InvalidSpeed(1e-20))
        );
        assert!(c.set_speed(SPEED_MAX * 2., t0).is_err());
        assert_eq!(c.speed(), 1.);
        assert!(!c.is_playing());

        c.play(t0);
        assert_eq!(c.next_deadline(), Some(t0 + ms(2000)));
        assert_eq!(c.tick(t0 + ms(2000)), Some(1));
    }

    #[test]
    fn test_out_of_range_speed_while_playing_keeps_deadline() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.play(t0);

        assert!(c.set_speed(1e-20, t0 + ms(500)).is_err());
        assert!(c.set_speed(11., t0 + ms(500)).is_err());
        assert!(c.is_playing());
        assert_eq!(c.interval(), ms(2000));
        assert_eq!(c.next_deadline(), Some(t0 + ms(2000)));
    }

    #[test]
    fn test_speed_bounds_are_inclusive() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.set_speed(SPEED_MIN, t0).unwrap();
        c.play(t0);
        assert!(c.next_deadline().is_some());
        c.set_speed(SPEED_MAX, t0).unwrap();
        assert_eq!(c.interval(), ms(200));
    }

    #[test]
    fn test_huge_base_interval_is_capped() {
        let t0 = Instant::now();
        let settings = SettingsPlayback::default().with_base_interval(Duration::MAX);
        let mut c = StepClock::new(6, &settings);
        assert_eq!(c.interval(), BASE_INTERVAL_MAX);

        c.set_speed(SPEED_MIN, t0).unwrap();
        c.play(t0);
        assert!(c.is_playing());
        assert_eq!(c.tick(t0 + ms(1000)), None);
        assert_eq!(c.current_step(), 0);
    }

    #[test]
    fn test_teardown_releases_timer() {
        let t0 = Instant::now();
        let mut c = clock(6);
        c.play(t0);
        let last = c.teardown();
        assert!(!last.is_playing);
    }

    #[test]
    fn test_single_step_session_never_advances() {
        let t0 = Instant::now();
        let mut c = clock(1);
        c.play(t0);
        assert_eq!(c.tick(t0 + ms(5000)), None);
        assert!(!c.is_playing());
        assert_eq!(c.current_step(), 0);
    }
}
