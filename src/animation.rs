//! Timed interpolation of the needle position and color.
//!
//! The controller owns the animated state and is driven by the host's frame
//! callback: `drive`/`stop_drive` install trajectories, `tick` advances them
//! by elapsed milliseconds and reports whether a redraw is needed. There is
//! never more than one trajectory per animated property; starting a new one
//! replaces the old one outright, keeping whatever value was last committed.

use tracing::debug;

use crate::config::Color;
use crate::geometry::MAX_SPEED;

/// Deceleration to zero always takes this long.
pub const STOP_DURATION_MS: u64 = 4000;
/// The fade back to a black needle while decelerating.
pub const STOP_COLOR_DURATION_MS: u64 = 2000;
/// The drive color trajectory runs longer than the speed trajectory.
const DRIVE_COLOR_DURATION_SCALE: f64 = 1.3;
/// The needle only reddens above this speed.
const COLOR_CHANGE_THRESHOLD: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Accelerating,
    Decelerating,
}

/// Keyframe profile for a drive, selected by the speed at the moment the
/// drive starts. The keyframes overshoot and fall back on purpose; the
/// wobble is part of the look.
struct DriveProfile {
    /// Inclusive upper bound of the starting-speed range.
    up_to: i32,
    duration_ms: u64,
    keyframes: &'static [i32],
}

/// Bounded profiles in ascending range order; any faster start falls through
/// to the short top-end profile.
static DRIVE_PROFILES: [DriveProfile; 3] = [
    DriveProfile {
        up_to: 40,
        duration_ms: 8000,
        keyframes: &[40, 35, 80, 75, 120, 115, 160],
    },
    DriveProfile {
        up_to: 80,
        duration_ms: 4000,
        keyframes: &[80, 75, 120, 115, 160],
    },
    DriveProfile {
        up_to: 120,
        duration_ms: 3000,
        keyframes: &[120, 115, 160],
    },
];

static TOP_SPEED_PROFILE: DriveProfile = DriveProfile {
    up_to: i32::MAX,
    duration_ms: 2000,
    keyframes: &[160],
};

fn profile_for(speed: i32) -> &'static DriveProfile {
    DRIVE_PROFILES
        .iter()
        .find(|profile| speed <= profile.up_to)
        .unwrap_or(&TOP_SPEED_PROFILE)
}

/// Piecewise-linear interpolation through a keyframe list over a fixed
/// duration. The starting value is keyframe zero; the remaining keyframes
/// split the duration evenly.
#[derive(Debug, Clone)]
struct Trajectory {
    keyframes: Vec<i32>,
    duration_ms: u64,
    elapsed_ms: u64,
}

impl Trajectory {
    fn new(start: i32, targets: &[i32], duration_ms: u64) -> Self {
        let mut keyframes = Vec::with_capacity(targets.len() + 1);
        keyframes.push(start);
        keyframes.extend_from_slice(targets);
        Self {
            keyframes,
            duration_ms,
            elapsed_ms: 0,
        }
    }

    fn advance(&mut self, dt_ms: u64) -> i32 {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms).min(self.duration_ms);
        self.sample()
    }

    fn sample(&self) -> i32 {
        // keyframes always holds at least the starting value
        let final_value = self.keyframes[self.keyframes.len() - 1];
        if self.duration_ms == 0 || self.elapsed_ms >= self.duration_ms {
            return final_value;
        }
        let spans = (self.keyframes.len() - 1) as f64;
        if spans < 1.0 {
            return final_value;
        }
        let progress = self.elapsed_ms as f64 / self.duration_ms as f64 * spans;
        let span_index = (progress.floor() as usize).min(self.keyframes.len() - 2);
        let t = progress - span_index as f64;
        let from = self.keyframes[span_index] as f64;
        let to = self.keyframes[span_index + 1] as f64;
        (from + (to - from) * t).round() as i32
    }

    fn finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Linear RGB fade over a fixed duration.
#[derive(Debug, Clone)]
struct ColorTrajectory {
    from: Color,
    to: Color,
    duration_ms: u64,
    elapsed_ms: u64,
}

impl ColorTrajectory {
    fn new(from: Color, to: Color, duration_ms: u64) -> Self {
        Self {
            from,
            to,
            duration_ms,
            elapsed_ms: 0,
        }
    }

    fn advance_time(&mut self, dt_ms: u64) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms).min(self.duration_ms);
    }

    fn sample(&self) -> Color {
        if self.duration_ms == 0 || self.elapsed_ms >= self.duration_ms {
            return self.to;
        }
        self.from
            .lerp(self.to, self.elapsed_ms as f64 / self.duration_ms as f64)
    }

    fn finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

/// Owns the animated speed and needle color.
#[derive(Debug)]
pub struct AnimationController {
    current_speed: i32,
    arrow_color: Color,
    phase: Phase,
    speed_anim: Option<Trajectory>,
    color_anim: Option<ColorTrajectory>,
    /// Drive fades only commit while the speed is above the threshold;
    /// stop fades are unconditional.
    color_gated: bool,
}

impl Default for AnimationController {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationController {
    pub fn new() -> Self {
        Self {
            current_speed: 0,
            arrow_color: Color::BLACK,
            phase: Phase::Idle,
            speed_anim: None,
            color_anim: None,
            color_gated: false,
        }
    }

    pub fn current_speed(&self) -> i32 {
        self.current_speed
    }

    pub fn arrow_color(&self) -> Color {
        self.arrow_color
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_animating(&self) -> bool {
        self.speed_anim.is_some() || self.color_anim.is_some()
    }

    /// Start (or restart) acceleration towards top speed.
    ///
    /// Any in-flight trajectory is replaced outright: the new one starts
    /// from whatever value was last committed, it does not resume the old
    /// one's progress.
    pub fn drive(&mut self) {
        let start = self.current_speed.clamp(0, MAX_SPEED);
        self.current_speed = start;
        let profile = profile_for(start);
        debug!(
            speed = start,
            duration_ms = profile.duration_ms,
            "starting drive trajectory"
        );
        self.speed_anim = Some(Trajectory::new(start, profile.keyframes, profile.duration_ms));
        let color_duration =
            (profile.duration_ms as f64 * DRIVE_COLOR_DURATION_SCALE).round() as u64;
        self.color_anim = Some(ColorTrajectory::new(
            self.arrow_color,
            Color::RED,
            color_duration,
        ));
        self.color_gated = true;
        self.phase = Phase::Accelerating;
        // zero-length trajectories must complete synchronously
        self.tick(0);
    }

    /// Decelerate to a stopped needle: speed to 0 over 4000 time-units,
    /// color to black over 2000.
    pub fn stop_drive(&mut self) {
        debug!(speed = self.current_speed, "starting stop trajectory");
        self.speed_anim = Some(Trajectory::new(self.current_speed, &[0], STOP_DURATION_MS));
        self.color_anim = Some(ColorTrajectory::new(
            self.arrow_color,
            Color::BLACK,
            STOP_COLOR_DURATION_MS,
        ));
        self.color_gated = false;
        self.phase = Phase::Decelerating;
        self.tick(0);
    }

    /// Advance the active trajectories by `dt_ms` and commit the sampled
    /// values. Returns true when anything visible changed.
    pub fn tick(&mut self, dt_ms: u64) -> bool {
        let mut changed = false;

        if let Some(anim) = self.speed_anim.as_mut() {
            let speed = anim.advance(dt_ms);
            if speed != self.current_speed {
                self.current_speed = speed;
                changed = true;
            }
            if anim.finished() {
                self.speed_anim = None;
            }
        }

        if let Some(anim) = self.color_anim.as_mut() {
            // time advances even while the gate holds the color steady
            anim.advance_time(dt_ms);
            if !self.color_gated || self.current_speed > COLOR_CHANGE_THRESHOLD {
                let color = anim.sample();
                if color != self.arrow_color {
                    self.arrow_color = color;
                    changed = true;
                }
            }
            if anim.finished() {
                self.color_anim = None;
            }
        }

        if !self.is_animating() {
            self.phase = Phase::Idle;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME_MS: u64 = 16;

    fn run_to_completion(controller: &mut AnimationController) {
        let mut frames = 0;
        while controller.is_animating() {
            controller.tick(FRAME_MS);
            frames += 1;
            assert!(frames < 100_000, "animation never settled");
        }
    }

    #[test]
    fn profile_ranges_are_inclusive() {
        assert_eq!(profile_for(0).duration_ms, 8000);
        assert_eq!(profile_for(40).duration_ms, 8000);
        assert_eq!(profile_for(41).duration_ms, 4000);
        assert_eq!(profile_for(80).duration_ms, 4000);
        assert_eq!(profile_for(81).duration_ms, 3000);
        assert_eq!(profile_for(120).duration_ms, 3000);
        assert_eq!(profile_for(121).duration_ms, 2000);
        assert_eq!(profile_for(160).duration_ms, 2000);
    }

    #[test]
    fn trajectory_visits_keyframes_in_order() {
        let mut trajectory = Trajectory::new(0, &[40, 35, 80, 75, 120, 115, 160], 7000);
        let expected = [40, 35, 80, 75, 120, 115, 160];
        for value in expected {
            assert_eq!(trajectory.advance(1000), value);
        }
        assert!(trajectory.finished());
    }

    #[test]
    fn trajectory_interpolates_within_a_span() {
        let mut trajectory = Trajectory::new(0, &[100], 1000);
        assert_eq!(trajectory.advance(250), 25);
        assert_eq!(trajectory.advance(250), 50);
        assert_eq!(trajectory.advance(10_000), 100);
    }

    #[test]
    fn zero_duration_completes_immediately() {
        let trajectory = Trajectory::new(42, &[0], 0);
        assert_eq!(trajectory.sample(), 0);
        assert!(trajectory.finished());
    }

    #[test]
    fn drive_from_rest_settles_at_top_speed() {
        let mut controller = AnimationController::new();
        controller.drive();
        assert_eq!(controller.phase(), Phase::Accelerating);
        run_to_completion(&mut controller);
        assert_eq!(controller.current_speed(), 160);
        assert_eq!(controller.arrow_color(), Color::RED);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn stop_drive_returns_to_zero_and_black() {
        let mut controller = AnimationController::new();
        controller.drive();
        run_to_completion(&mut controller);
        controller.stop_drive();
        assert_eq!(controller.phase(), Phase::Decelerating);
        run_to_completion(&mut controller);
        assert_eq!(controller.current_speed(), 0);
        assert_eq!(controller.arrow_color(), Color::BLACK);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn stop_cancels_drive_without_interleaving() {
        let mut controller = AnimationController::new();
        controller.drive();
        for _ in 0..20 {
            controller.tick(FRAME_MS);
        }
        controller.stop_drive();
        // after the stop begins, no drive keyframe may push the speed up
        let mut previous = controller.current_speed();
        while controller.is_animating() {
            controller.tick(FRAME_MS);
            assert!(
                controller.current_speed() <= previous,
                "drive trajectory leaked into the stop"
            );
            previous = controller.current_speed();
        }
        assert_eq!(controller.current_speed(), 0);
    }

    #[test]
    fn new_drive_replaces_in_flight_trajectory() {
        let mut controller = AnimationController::new();
        controller.drive();
        for _ in 0..50 {
            controller.tick(FRAME_MS);
        }
        let speed_at_restart = controller.current_speed();
        controller.drive();
        // the replacement starts from the committed speed, not from the old
        // trajectory's progress
        assert_eq!(controller.current_speed(), speed_at_restart);
        assert_eq!(controller.phase(), Phase::Accelerating);
        run_to_completion(&mut controller);
        assert_eq!(controller.current_speed(), 160);
    }

    #[test]
    fn drive_cancels_stop_without_interleaving() {
        let mut controller = AnimationController::new();
        controller.drive();
        run_to_completion(&mut controller);
        controller.stop_drive();
        for _ in 0..50 {
            controller.tick(FRAME_MS);
        }
        let speed_at_restart = controller.current_speed();
        assert!(speed_at_restart > 100 && speed_at_restart < 160);
        controller.drive();
        assert_eq!(controller.phase(), Phase::Accelerating);
        // after the drive begins, no stop keyframe may pull the speed down
        let mut previous = controller.current_speed();
        while controller.is_animating() {
            controller.tick(FRAME_MS);
            assert!(
                controller.current_speed() >= previous,
                "stop trajectory leaked into the drive"
            );
            previous = controller.current_speed();
        }
        assert_eq!(controller.current_speed(), 160);
        // the color fade retargets red instead of finishing its run to black
        assert_eq!(controller.arrow_color(), Color::RED);
    }

    #[test]
    fn color_holds_while_speed_is_at_or_below_threshold() {
        let mut controller = AnimationController::new();
        controller.drive();
        let mut color_before = controller.arrow_color();
        while controller.is_animating() {
            controller.tick(FRAME_MS);
            if controller.current_speed() <= 100 {
                assert_eq!(
                    controller.arrow_color(),
                    color_before,
                    "color moved at speed {}",
                    controller.current_speed()
                );
            }
            color_before = controller.arrow_color();
        }
        assert_eq!(controller.arrow_color(), Color::RED);
    }

    #[test]
    fn stop_color_fades_regardless_of_speed() {
        let mut controller = AnimationController::new();
        controller.drive();
        run_to_completion(&mut controller);
        controller.stop_drive();
        // color trajectory (2000ms) finishes before the speed one (4000ms)
        for _ in 0..((STOP_COLOR_DURATION_MS / FRAME_MS) + 1) {
            controller.tick(FRAME_MS);
        }
        assert_eq!(controller.arrow_color(), Color::BLACK);
        assert!(controller.current_speed() > 0);
    }

    #[test]
    fn drive_clamps_out_of_range_start() {
        let mut controller = AnimationController::new();
        controller.current_speed = 900;
        controller.drive();
        assert!(controller.current_speed() <= MAX_SPEED);
        run_to_completion(&mut controller);
        assert_eq!(controller.current_speed(), 160);
    }

    #[test]
    fn tick_is_quiet_when_idle() {
        let mut controller = AnimationController::new();
        assert!(!controller.tick(FRAME_MS));
        assert_eq!(controller.phase(), Phase::Idle);
    }
}
