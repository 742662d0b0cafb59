use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, read on every stencil pass.
///
/// [`crate::SimulationConfig::sim_params`] validates the ranges before building
/// one. Values assembled by hand or deserialized are taken as they are; the
/// report helpers treat a zero `report_interval_steps` as "report step 0 only".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    // Hares
    pub hare_birth_rate: f64,     // r_h
    pub hare_predation_rate: f64, // a
    pub hare_diffusion_rate: f64, // k_h
    pub hare_seed: u64,

    // Pumas
    pub puma_birth_rate: f64,      // r_p
    pub puma_starvation_rate: f64, // m
    pub puma_diffusion_rate: f64,  // k_p
    pub puma_seed: u64,

    // Time
    pub dt: f64,
    pub duration: f64,
    pub total_steps: u64, // floor(duration / dt)
    pub report_interval_steps: u64,
}

impl SimParams {
    /// Simulated time elapsed after `step` timesteps.
    pub fn time_at(&self, step: u64) -> f64 {
        step as f64 * self.dt
    }

    /// Whether the driver reports at step `step` (step 0 is always reported).
    pub fn is_report_step(&self, step: u64) -> bool {
        match step.checked_rem(self.report_interval_steps) {
            Some(rem) => rem == 0,
            None => step == 0,
        }
    }

    /// Number of reports a full run emits, including the one at step 0.
    pub fn expected_report_count(&self) -> u64 {
        match self.total_steps.saturating_sub(1).checked_div(self.report_interval_steps) {
            Some(periodic) => periodic + 1,
            None => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(total_steps: u64, report_interval_steps: u64) -> SimParams {
        SimParams {
            hare_birth_rate: 0.08,
            hare_predation_rate: 0.04,
            hare_diffusion_rate: 0.2,
            hare_seed: 1,
            puma_birth_rate: 0.02,
            puma_starvation_rate: 0.06,
            puma_diffusion_rate: 0.2,
            puma_seed: 1,
            dt: 0.5,
            duration: total_steps as f64 * 0.5,
            total_steps,
            report_interval_steps,
        }
    }

    #[test]
    fn report_steps_are_multiples_of_the_interval() {
        let p = params(20, 4);
        let steps: Vec<u64> = (0..20).filter(|&s| p.is_report_step(s)).collect();
        assert_eq!(steps, vec![0, 4, 8, 12, 16]);
        assert_eq!(p.expected_report_count(), 5);
    }

    #[test]
    fn zero_interval_reports_only_the_initial_state() {
        let p = params(20, 0);
        assert!(p.is_report_step(0));
        assert!((1..20).all(|s| !p.is_report_step(s)));
        assert_eq!(p.expected_report_count(), 1);
    }

    #[test]
    fn deserialized_zero_interval_does_not_panic() {
        let mut value = toml::Value::try_from(params(9, 3)).unwrap();
        value.as_table_mut().unwrap().insert("report_interval_steps".into(), toml::Value::Integer(0));
        let p: SimParams = value.try_into().unwrap();
        assert_eq!(p.report_interval_steps, 0);
        assert!(!p.is_report_step(3));
        assert_eq!(p.expected_report_count(), 1);
    }
}
