//! Benchmark runner: drives a scenario to completion and collects metrics.
//!
//! An optional export sink receives frames at the scenario's save points;
//! an optional telemetry bus receives per-step events, flushed after
//! every step.

use std::time::Instant;

use grove_io::{ExportSink, Frame, SaveSchedule};
use grove_solver::{Simulation, StepReport};
use grove_telemetry::{EventBus, EventKind};
use grove_types::GroveResult;

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioConfig, ScenarioKind, ScenarioSetup};

/// Runs scenarios and collects metrics.
#[derive(Default)]
pub struct BenchmarkRunner {
    sink: Option<Box<dyn ExportSink>>,
    bus: Option<EventBus>,
}

/// Running per-step statistics.
#[derive(Default)]
struct StepStats {
    times: Vec<f64>,
    iterations: u64,
    unconverged: u64,
}

impl StepStats {
    fn record(&mut self, report: &StepReport) {
        self.times.push(report.wall_time);
        self.iterations += u64::from(report.iterations);
        if !report.converged {
            self.unconverged += 1;
        }
    }
}

impl BenchmarkRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends frames to `sink` at the scenario's save points.
    pub fn with_sink(mut self, sink: Box<dyn ExportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Emits per-step events on `bus`.
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds and runs one scenario.
    pub fn run(&mut self, config: &ScenarioConfig) -> GroveResult<BenchmarkMetrics> {
        let setup = config.build()?;
        tracing::info!(
            scenario = setup.name(),
            particles = setup.particle_count(),
            resolution = config.resolution,
            "starting scenario"
        );
        let metrics = match setup {
            ScenarioSetup::Planar(scenario) => self.run_scenario(scenario, config)?,
            ScenarioSetup::Spatial(scenario) => self.run_scenario(scenario, config)?,
        };
        tracing::info!(
            scenario = %metrics.scenario,
            steps = metrics.steps,
            wall_time = metrics.total_wall_time,
            "finished scenario"
        );
        Ok(metrics)
    }

    /// Runs every scenario at `resolution`, each limited to `max_steps`
    /// when given.
    pub fn run_all(&mut self, resolution: f64, max_steps: Option<u64>) -> GroveResult<Vec<BenchmarkMetrics>> {
        ScenarioKind::all()
            .into_iter()
            .map(|kind| {
                let mut config = ScenarioConfig::new(kind).with_resolution(resolution);
                config.max_steps = max_steps;
                self.run(&config)
            })
            .collect()
    }

    /// Finalizes the export sink and the telemetry bus.
    pub fn finish(&mut self) -> GroveResult<()> {
        if let Some(sink) = &mut self.sink {
            sink.finalize()?;
        }
        if let Some(bus) = &mut self.bus {
            bus.finalize();
        }
        Ok(())
    }

    fn run_scenario<const D: usize>(
        &mut self,
        scenario: Scenario<D>,
        config: &ScenarioConfig,
    ) -> GroveResult<BenchmarkMetrics> {
        let Scenario {
            name,
            grid,
            particles,
            solver,
        } = scenario;
        let initial_position = particles.position.clone();
        let initial_momentum = particles.momentum();

        let mut sim = Simulation::new(grid, particles, solver);
        let end_time = config.end_time();
        let max_steps = config.max_steps.unwrap_or(u64::MAX);
        let mut schedule = SaveSchedule::from_fps(0.0, end_time, config.fps());
        let mut stats = StepStats::default();
        let mut frames = 0;

        frames += self.save(&sim, &mut schedule)?;

        let start = Instant::now();
        while sim.time() < end_time && sim.steps() < max_steps {
            let t_begin = sim.time();
            let report = sim.advance()?;
            stats.record(&report);
            self.emit_step(&sim, t_begin, &report);
            frames += self.save(&sim, &mut schedule)?;
        }
        let total_wall_time = start.elapsed().as_secs_f64();

        let particles = &sim.particles;
        let steps = sim.steps();
        let max_displacement = particles
            .position
            .iter()
            .zip(&initial_position)
            .map(|(x, x0)| (x - x0).norm())
            .fold(0.0, f64::max);
        let max_von_mises = (0..particles.len())
            .map(|p| particles.von_mises(p))
            .fold(0.0, f64::max);
        let (avg_step, min_step, max_step) = if stats.times.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                stats.times.iter().sum::<f64>() / stats.times.len() as f64,
                stats.times.iter().copied().fold(f64::MAX, f64::min),
                stats.times.iter().copied().fold(0.0, f64::max),
            )
        };

        Ok(BenchmarkMetrics {
            scenario: name.to_string(),
            solver: sim.solver_name().to_string(),
            dimension: D,
            particle_count: particles.len(),
            node_count: sim.grid.len(),
            steps,
            sim_time: sim.time(),
            total_wall_time,
            avg_step_time: avg_step,
            min_step_time: min_step,
            max_step_time: max_step,
            avg_iterations: if steps > 0 {
                stats.iterations as f64 / steps as f64
            } else {
                0.0
            },
            unconverged_steps: stats.unconverged,
            final_kinetic_energy: particles.kinetic_energy(),
            momentum_drift: (particles.momentum() - initial_momentum).norm(),
            max_displacement,
            max_von_mises,
            frames,
        })
    }

    /// Writes a frame if a save point was reached. Returns frames written.
    fn save<const D: usize>(&mut self, sim: &Simulation<D>, schedule: &mut SaveSchedule) -> GroveResult<usize> {
        let Some(sink) = self.sink.as_mut() else {
            return Ok(0);
        };
        if !schedule.due(sim.time()) {
            return Ok(0);
        }
        let frame = Frame::capture(sim.steps(), sim.time(), &sim.particles, &sim.grid);
        sink.write_frame(&frame)?;
        if let Some(bus) = &self.bus {
            bus.emit_kind(
                sim.steps(),
                EventKind::Export {
                    path: sink.name().to_string(),
                    frame: sink.frame_count() - 1,
                },
            );
        }
        Ok(1)
    }

    /// Events describing a step are emitted once it has completed.
    fn emit_step<const D: usize>(&mut self, sim: &Simulation<D>, t_begin: f64, report: &StepReport) {
        let Some(bus) = self.bus.as_mut() else {
            return;
        };
        let step = sim.steps() - 1;
        bus.emit_kind(
            step,
            EventKind::StepBegin {
                sim_time: t_begin,
                dt: report.dt,
            },
        );
        for (iteration, &residual) in report.residual_history.iter().enumerate().skip(1) {
            bus.emit_kind(
                step,
                EventKind::NewtonIteration {
                    iteration: iteration as u32,
                    residual,
                },
            );
        }
        if !report.residual_history.is_empty() {
            bus.emit_kind(
                step,
                EventKind::Convergence {
                    iterations: report.iterations,
                    final_residual: report.residual,
                    converged: report.converged,
                },
            );
        }
        bus.emit_kind(step, EventKind::Energy { kinetic: sim.particles.kinetic_energy() });
        bus.emit_kind(step, EventKind::Momentum { norm: sim.particles.momentum().norm() });
        bus.emit_kind(step, EventKind::StepEnd { wall_time: report.wall_time });
        bus.flush();
    }
}
