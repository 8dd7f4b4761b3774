//! Benchmark metrics: data collected during a scenario run.

use serde::{Deserialize, Serialize};

/// Metrics collected from one scenario run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub scenario: String,
    pub solver: String,
    pub dimension: usize,
    pub particle_count: usize,
    pub node_count: usize,
    /// Steps executed.
    pub steps: u64,
    /// Simulated time reached (seconds).
    pub sim_time: f64,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Per-step wall time statistics (seconds).
    pub avg_step_time: f64,
    pub min_step_time: f64,
    pub max_step_time: f64,
    /// Average Newton iterations per step (0 for explicit solvers).
    pub avg_iterations: f64,
    /// Steps that ended without Newton convergence.
    pub unconverged_steps: u64,
    pub final_kinetic_energy: f64,
    /// `|Σ m v − (Σ m v)₀|`.
    pub momentum_drift: f64,
    /// Largest particle displacement from its initial position.
    pub max_displacement: f64,
    /// Largest particle von Mises stress at the end of the run.
    pub max_von_mises: f64,
    /// Frames handed to the export sink.
    pub frames: usize,
}

impl BenchmarkMetrics {
    pub fn to_csv_header() -> String {
        "scenario,solver,dim,particles,nodes,steps,sim_time_s,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,avg_iterations,unconverged,final_ke,momentum_drift,max_displacement,max_von_mises,frames".to_string()
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{:.6e},{:.6},{:.4},{:.4},{:.4},{:.2},{},{:.6e},{:.6e},{:.6e},{:.6e},{}",
            self.scenario,
            self.solver,
            self.dimension,
            self.particle_count,
            self.node_count,
            self.steps,
            self.sim_time,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.min_step_time * 1000.0,
            self.max_step_time * 1000.0,
            self.avg_iterations,
            self.unconverged_steps,
            self.final_kinetic_energy,
            self.momentum_drift,
            self.max_displacement,
            self.max_von_mises,
            self.frames,
        )
    }

    /// Header plus one row per run.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
