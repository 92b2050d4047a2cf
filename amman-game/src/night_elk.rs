//! Night Elk sightings: the seeded nocturnal encounter.
use rand::Rng;

use crate::config::NightElkConfig;
use crate::state::GameState;

/// Whether the elk may appear right now, before any dice are rolled.
#[must_use]
pub fn sighting_possible(cfg: &NightElkConfig, state: &GameState) -> bool {
    !state.night_elk_active
        && cfg.night.contains(state.hotel.clock.hour_of_day())
        && state.progress.anomaly_level() >= cfg.min_anomaly
}

/// Roll once for a sighting. Consumes randomness only when one is possible,
/// so the stream stays aligned across seeds that never reach the night window.
pub fn roll_sighting<R: Rng>(cfg: &NightElkConfig, state: &GameState, rng: &mut R) -> bool {
    if !sighting_possible(cfg, state) {
        return false;
    }
    rng.r#gen::<f32>() < cfg.sighting_chance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ANOMALY_BANDS, SECS_PER_HOUR};
    use rand::rngs::mock::StepRng;

    fn night_state(anomaly: i32) -> GameState {
        let mut state = GameState::default();
        // 18:00 start; five hours later is 23:00.
        state.hotel.clock.advance(5 * SECS_PER_HOUR);
        state.progress.add_anomaly_level(anomaly, &ANOMALY_BANDS);
        state
    }

    #[test]
    fn low_roll_inside_the_night_sights_the_elk() {
        let cfg = NightElkConfig::default();
        let mut rng = StepRng::new(0, 0);
        assert!(roll_sighting(&cfg, &night_state(60), &mut rng));
    }

    #[test]
    fn high_roll_misses() {
        let cfg = NightElkConfig::default();
        let mut rng = StepRng::new(u64::MAX, 0);
        assert!(!roll_sighting(&cfg, &night_state(60), &mut rng));
    }

    #[test]
    fn calm_hotel_or_daytime_never_rolls() {
        let cfg = NightElkConfig::default();
        let mut rng = StepRng::new(0, 0);
        assert!(!roll_sighting(&cfg, &night_state(10), &mut rng));

        let mut evening = GameState::default();
        evening.progress.add_anomaly_level(90, &ANOMALY_BANDS);
        assert!(!roll_sighting(&cfg, &evening, &mut rng));
    }

    #[test]
    fn active_elk_is_not_sighted_twice() {
        let cfg = NightElkConfig::default();
        let mut state = night_state(60);
        state.night_elk_active = true;
        assert!(!sighting_possible(&cfg, &state));
    }
}
