use crate::aggregate;
use crate::density::DensityField;
use crate::landscape::{Landscape, NeighborCounts};
use crate::stencil::{self, Rates};
use log::{debug, info, trace, warn};
use predator_prey_common::{AggregateSnapshot, SimParams, SimulationError};
use std::time::Instant;

/// Read-only view of the grid handed to report sinks.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub landscape: &'a Landscape,
    /// Current hare densities in storage order.
    pub hares: &'a [f64],
    /// Current puma densities in storage order.
    pub pumas: &'a [f64],
}

/// Destination of the reports a run emits.
pub trait ReportSink {
    /// Called once with the step-0 statistics, before any update.
    fn begin(&mut self, initial: &AggregateSnapshot) -> Result<(), SimulationError>;

    /// Called at every periodic report with the pre-update state of that step.
    fn report(&mut self, snapshot: &AggregateSnapshot, frame: &Frame<'_>) -> Result<(), SimulationError>;

    /// Called once after the final update.
    fn finish(&mut self) -> Result<(), SimulationError> {
        Ok(())
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn begin(&mut self, _initial: &AggregateSnapshot) -> Result<(), SimulationError> {
        Ok(())
    }

    fn report(&mut self, _snapshot: &AggregateSnapshot, _frame: &Frame<'_>) -> Result<(), SimulationError> {
        Ok(())
    }
}

/// Manages the state and execution of the predator-prey simulation.
pub struct PredatorPreySimulation {
    params: SimParams,
    rates: Rates,
    landscape: Landscape,
    /// Land-neighbour counts, fixed for the lifetime of the landscape.
    neighbors: NeighborCounts,
    hares: DensityField,
    pumas: DensityField,
    /// Number of stencil updates applied so far.
    updates_applied: u64,
    /// Stores every aggregate snapshot emitted so far.
    recorded_snapshots: Vec<AggregateSnapshot>,
}

impl PredatorPreySimulation {
    /// Creates a simulation with densities seeded from `params.hare_seed` and `params.puma_seed`.
    pub fn new(params: SimParams, landscape: Landscape) -> Self {
        let hares = DensityField::seeded(&landscape, params.hare_seed);
        let pumas = DensityField::seeded(&landscape, params.puma_seed);
        Self::with_fields(params, landscape, hares, pumas)
    }

    /// Creates a simulation from explicit initial densities.
    pub fn with_fields(params: SimParams, landscape: Landscape, hares: DensityField, pumas: DensityField) -> Self {
        let neighbors = landscape.neighbor_counts();
        let rates = Rates::from(&params);

        // Explicit Euler diffusion is only stable for dt * k * 4 <= 1.
        let max_diffusion = params.hare_diffusion_rate.max(params.puma_diffusion_rate);
        if params.dt * 4.0 * max_diffusion > 1.0 {
            warn!(
                "dt ({}) x diffusion rate ({}) exceeds the explicit-scheme stability limit; densities may oscillate.",
                params.dt, max_diffusion
            );
        }

        Self {
            params,
            rates,
            landscape,
            neighbors,
            hares,
            pumas,
            updates_applied: 0,
            recorded_snapshots: Vec::new(),
        }
    }

    /// Advances the simulation by one timestep (`dt`).
    pub fn step(&mut self) {
        stencil::update(&self.landscape, &self.neighbors, &self.rates, &mut self.hares, &mut self.pumas);

        // --- Swap generations: next becomes current ---
        self.hares.swap();
        self.pumas.swap();

        self.updates_applied += 1;
    }

    /// Computes the statistics of the current state, labels them with `step` and keeps a copy.
    pub fn record_snapshot(&mut self, step: u64) -> AggregateSnapshot {
        let snapshot = aggregate::capture(step, &self.params, &self.landscape, &self.hares, &self.pumas);
        info!(
            "Averages. Timestep: {} Time (s): {} Hares: {} Pumas: {}",
            snapshot.step, snapshot.time, snapshot.mean_hares, snapshot.mean_pumas
        );
        self.recorded_snapshots.push(snapshot);
        snapshot
    }

    /// Runs the full simulation from its initial state, feeding reports into `sink`.
    ///
    /// Step 0 is reported through [`ReportSink::begin`]. For every step `i` in
    /// `1..total_steps`, the state is reported first when `i` is a multiple of the
    /// report interval, and then updated once. Returns the number of reports emitted.
    pub fn run<S: ReportSink + ?Sized>(&mut self, sink: &mut S) -> Result<usize, SimulationError> {
        let total_steps = self.params.total_steps;
        let interval = self.params.report_interval_steps;
        debug!("Simulation Parameters: {:#?}", self.params);
        if total_steps <= 1 {
            warn!("Duration {} with dt {} leaves no update steps to run.", self.params.duration, self.params.dt);
        }
        info!(
            "Starting simulation loop for {} steps, reporting every {} steps ({} time units).",
            total_steps,
            interval,
            self.params.time_at(interval)
        );

        let reports_before = self.recorded_snapshots.len();
        let start_time = Instant::now();

        // --- Initial report (step 0) ---
        let initial = self.record_snapshot(0);
        sink.begin(&initial)?;

        for i in 1..total_steps {
            if self.params.is_report_step(i) {
                let snapshot = self.record_snapshot(i);
                sink.report(&snapshot, &self.frame())?;
            }

            let step_start_time = Instant::now();
            self.step();
            trace!(
                "Step [{}/{}] completed in {:.3} ms",
                i,
                total_steps,
                step_start_time.elapsed().as_secs_f64() * 1000.0
            );
        }

        sink.finish()?;

        let emitted = self.recorded_snapshots.len() - reports_before;
        info!(
            "Simulation finished: {} updates, {} reports in {:.3} seconds.",
            self.updates_applied,
            emitted,
            start_time.elapsed().as_secs_f64()
        );
        Ok(emitted)
    }

    /// View of the current generations.
    pub fn frame(&self) -> Frame<'_> {
        Frame {
            landscape: &self.landscape,
            hares: self.hares.current(),
            pumas: self.pumas.current(),
        }
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn landscape(&self) -> &Landscape {
        &self.landscape
    }

    pub fn hares(&self) -> &DensityField {
        &self.hares
    }

    pub fn pumas(&self) -> &DensityField {
        &self.pumas
    }

    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }

    /// Returns every snapshot recorded so far.
    pub fn get_recorded_snapshots(&self) -> &[AggregateSnapshot] {
        &self.recorded_snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use predator_prey_common::SimulationConfig;

    #[derive(Default)]
    struct Recorder {
        begun: Vec<AggregateSnapshot>,
        reports: Vec<AggregateSnapshot>,
        finished: bool,
    }

    impl ReportSink for Recorder {
        fn begin(&mut self, initial: &AggregateSnapshot) -> Result<(), SimulationError> {
            self.begun.push(*initial);
            Ok(())
        }

        fn report(&mut self, snapshot: &AggregateSnapshot, frame: &Frame<'_>) -> Result<(), SimulationError> {
            for (idx, &is_land) in frame.landscape.storage().iter().enumerate() {
                if !is_land {
                    assert_eq!(frame.hares[idx], 0.0);
                    assert_eq!(frame.pumas[idx], 0.0);
                }
            }
            self.reports.push(*snapshot);
            Ok(())
        }

        fn finish(&mut self) -> Result<(), SimulationError> {
            self.finished = true;
            Ok(())
        }
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn begin(&mut self, _initial: &AggregateSnapshot) -> Result<(), SimulationError> {
            Ok(())
        }

        fn report(&mut self, snapshot: &AggregateSnapshot, _frame: &Frame<'_>) -> Result<(), SimulationError> {
            Err(SimulationError::output_io(
                format!("map_{:04}.ppm", snapshot.step),
                std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            ))
        }
    }

    fn params(dt: f64, duration: f64, interval: u64) -> SimParams {
        let mut config = SimulationConfig::default();
        config.timing.dt = dt;
        config.timing.duration = duration;
        config.timing.report_interval_steps = interval;
        config.sim_params().unwrap()
    }

    fn lake() -> Landscape {
        Landscape::parse("5 4\n1 1 1 0 0\n1 0 1 1 0\n1 1 1 1 1\n0 0 1 1 1\n").unwrap()
    }

    #[test]
    fn report_cadence_matches_expected_count() {
        for (duration, interval) in [(25.0, 4), (24.0, 4), (10.0, 1), (1.0, 3), (7.0, 100)] {
            let params = params(1.0, duration, interval);
            let expected = params.expected_report_count() as usize;
            let mut sim = PredatorPreySimulation::new(params, lake());
            let mut sink = Recorder::default();

            let emitted = sim.run(&mut sink).unwrap();

            assert_eq!(emitted, expected, "duration {duration}, interval {interval}");
            assert_eq!(sink.begun.len(), 1);
            assert_eq!(sink.reports.len() + 1, expected);
            assert!(sink.finished);
            assert_eq!(sim.updates_applied(), (duration as u64).saturating_sub(1));
        }
    }

    #[test]
    fn reports_use_pre_update_state() {
        let mut sim = PredatorPreySimulation::new(params(1.0, 6.0, 2), lake());
        let mut sink = Recorder::default();
        sim.run(&mut sink).unwrap();

        let steps: Vec<u64> = sink.reports.iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![2, 4]);

        // Step i is reported before its own update, so the step-2 report sees one update.
        let mut replay = PredatorPreySimulation::new(params(1.0, 6.0, 2), lake());
        replay.step();
        let after_one = replay.record_snapshot(2);
        replay.step();
        let after_two = replay.record_snapshot(2);
        assert_eq!(after_one, sink.reports[0]);
        assert_ne!(after_two.mean_hares, sink.reports[0].mean_hares);
    }

    #[test]
    fn sink_errors_abort_the_run() {
        let mut sim = PredatorPreySimulation::new(params(1.0, 10.0, 3), lake());
        let err = sim.run(&mut FailingSink).unwrap_err();
        assert!(matches!(err, SimulationError::OutputIo { .. }));
        assert_eq!(sim.updates_applied(), 2);
    }

    #[test]
    fn recorded_snapshots_accumulate() {
        let mut sim = PredatorPreySimulation::new(params(0.5, 5.0, 3), lake());
        sim.run(&mut NullSink).unwrap();
        let steps: Vec<u64> = sim.get_recorded_snapshots().iter().map(|s| s.step).collect();
        assert_eq!(steps, vec![0, 3, 6, 9]);
        assert_eq!(sim.get_recorded_snapshots()[3].time, 4.5);
    }
}
