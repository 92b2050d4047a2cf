use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::scenarios::{Scenario, StaySummary};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_summary: Option<StaySummary>,
}

/// Runs catalog scenarios across seeds and iterations.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioTester {
    verbose: bool,
}

impl ScenarioTester {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| self.run_seed(scenario, seed, iterations))
            .collect()
    }

    fn run_seed(&self, scenario: &Scenario, seed: u64, iterations: usize) -> ScenarioResult {
        let mut failures = Vec::new();
        let mut durations = Vec::with_capacity(iterations);
        let mut last_summary = None;

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(i as u64);
            let start_time = Instant::now();
            match (scenario.run)(iteration_seed) {
                Ok(summary) => {
                    let duration = start_time.elapsed();
                    durations.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) progress:{} anomaly:{} phase:{}",
                            i + 1,
                            iterations,
                            summary.puzzle_progress,
                            summary.anomaly_level,
                            summary.phase
                        );
                    }
                    last_summary = Some(summary);
                }
                Err(err) => {
                    let message = format!("seed {iteration_seed}: {err:#}");
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            message.red()
                        );
                    }
                    log::debug!("{} failed: {message}", scenario.key);
                    failures.push(message);
                }
            }
        }

        let successful_iterations = durations.len();
        ScenarioResult {
            scenario_name: scenario.key.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations,
            failures,
            average_duration: average(&durations),
            last_summary,
        }
    }
}

fn average(durations: &[Duration]) -> Duration {
    let Ok(count) = u32::try_from(durations.len()) else {
        return Duration::ZERO;
    };
    if count == 0 {
        return Duration::ZERO;
    }
    durations.iter().sum::<Duration>() / count
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amman_game::PuzzlePhase;
    use anyhow::bail;

    fn passes(_seed: u64) -> anyhow::Result<StaySummary> {
        Ok(StaySummary {
            puzzle_progress: 0,
            anomaly_level: 0,
            phase: PuzzlePhase::Discovery,
            notifications: 0,
            unlocked: 0,
        })
    }

    fn odd_seeds_fail(seed: u64) -> anyhow::Result<StaySummary> {
        if seed % 2 == 1 {
            bail!("odd");
        }
        passes(seed)
    }

    #[test]
    fn one_result_per_seed() {
        let scenario = Scenario {
            key: "passes",
            description: "",
            run: passes,
        };
        let results = ScenarioTester::new(false).run_scenario(&scenario, &[1, 2, 3], 2);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.passed && r.successful_iterations == 2));
        assert!(results[0].last_summary.is_some());
    }

    #[test]
    fn iterations_walk_consecutive_seeds() {
        let scenario = Scenario {
            key: "odd",
            description: "",
            run: odd_seeds_fail,
        };
        let results = ScenarioTester::new(false).run_scenario(&scenario, &[10], 4);
        let result = &results[0];
        assert!(!result.passed);
        assert_eq!(result.successful_iterations, 2);
        assert_eq!(result.failures, vec!["seed 11: odd", "seed 13: odd"]);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average(&[]), Duration::ZERO);
        assert_eq!(
            average(&[Duration::from_millis(10), Duration::from_millis(30)]),
            Duration::from_millis(20)
        );
    }

    #[test]
    fn durations_serialize_as_millis() {
        let scenario = Scenario {
            key: "passes",
            description: "",
            run: passes,
        };
        let mut result = ScenarioTester::new(false)
            .run_scenario(&scenario, &[1], 1)
            .remove(0);
        result.average_duration = Duration::from_millis(42);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 42);
        assert_eq!(json["scenario_name"], "passes");
    }
}
