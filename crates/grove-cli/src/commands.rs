//! CLI command implementations.

use grove_bench::{BenchmarkMetrics, BenchmarkRunner, ScenarioConfig, ScenarioKind};
use grove_io::validator::validate_frame;
use grove_io::JsonFrameExporter;
use grove_material::MaterialDatabase;
use grove_telemetry::{EventBus, TracingSink};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn load_config(path: &str) -> Result<ScenarioConfig, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let config: ScenarioConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Run a scenario from a config file.
pub fn simulate(config_path: &str, events: bool) -> CliResult {
    println!("Grove Simulation");
    println!("────────────────");
    println!("Config: {config_path}");
    println!();

    let config = load_config(config_path)?;
    let mut runner = BenchmarkRunner::new();
    if let Some(path) = &config.output {
        runner = runner.with_sink(Box::new(JsonFrameExporter::new(path)));
    }
    if events {
        runner = runner.with_bus(EventBus::new().with_sink(TracingSink::new()));
    }

    let metrics = runner
        .run(&config)
        .map_err(|e| format!("Simulation failed: {e}"))?;
    runner.finish()?;

    print_metrics(&metrics);
    if let Some(path) = &config.output {
        println!("Frames written to: {}", path.display());
    }
    Ok(())
}

/// Run benchmark scenarios.
pub fn benchmark(scenario_name: &str, resolution: f64, max_steps: Option<u64>, output_path: Option<&str>) -> CliResult {
    println!("Grove Benchmark Suite");
    println!("═════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all()
    } else {
        let kind = ScenarioKind::from_name(scenario_name).ok_or_else(|| {
            let available: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
            format!(
                "Unknown scenario: '{scenario_name}'. Available: {}, all",
                available.join(", ")
            )
        })?;
        vec![kind]
    };

    let mut runner = BenchmarkRunner::new();
    let mut all_metrics = Vec::new();
    for kind in scenarios {
        let mut config = ScenarioConfig::new(kind).with_resolution(resolution);
        config.max_steps = max_steps;

        println!(
            "Running: {} ({}-D, resolution {resolution})",
            config.scenario.name(),
            config.scenario.dimension()
        );
        let metrics = runner
            .run(&config)
            .map_err(|e| format!("Benchmark failed: {e}"))?;
        print_metrics(&metrics);
        all_metrics.push(metrics);
    }

    let csv = BenchmarkMetrics::to_csv(&all_metrics);
    if let Some(path) = output_path {
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{csv}");
    }
    Ok(())
}

fn print_metrics(metrics: &BenchmarkMetrics) {
    println!("  Particles:     {}", metrics.particle_count);
    println!("  Steps:         {} (t = {:.4e}s)", metrics.steps, metrics.sim_time);
    println!("  Wall time:     {:.3}s", metrics.total_wall_time);
    println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
    if metrics.avg_iterations > 0.0 {
        println!("  Newton iters:  {:.2}/step ({} unconverged)", metrics.avg_iterations, metrics.unconverged_steps);
    }
    println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
    println!("  Max displace:  {:.4e}m", metrics.max_displacement);
    println!();
}

/// Summarize an exported frame file.
pub fn inspect(path: &str) -> CliResult {
    println!("Grove Frame Inspector");
    println!("─────────────────────");
    println!();

    let frames = JsonFrameExporter::read(path)?;
    let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
        println!("No frames in {path}");
        return Ok(());
    };

    println!("Frames:       {}", frames.len());
    println!("Time span:    [{:.4e}, {:.4e}]s", first.time, last.time);
    println!("Steps:        {} → {}", first.step, last.step);
    println!("Particles:    {}", last.particle_count);
    println!("Nodes:        {}", last.node_count);

    for field in &last.particle_fields {
        let (min, max) = field
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        println!(
            "  {:<12} {} comp, range [{:.4e}, {:.4e}]",
            field.name, field.components, min, max
        );
    }
    Ok(())
}

/// Validate a scenario config or a frame file.
pub fn validate(path: &str) -> CliResult {
    println!("Grove Validator");
    println!("───────────────");
    println!();

    if path.ends_with(".toml") {
        println!("Validating config: {path}");
        let config = load_config(path)?;
        println!(
            "✅ Config is valid ({}, end time {}s).",
            config.scenario.name(),
            config.end_time()
        );
    } else if path.ends_with(".json") {
        println!("Validating frames: {path}");
        let frames = JsonFrameExporter::read(path)?;
        for frame in &frames {
            if let Err(e) = validate_frame(frame) {
                println!("❌ Frame {} is invalid: {e}", frame.step);
                return Err(e.into());
            }
        }
        println!("✅ {} frames are valid.", frames.len());
    } else {
        println!("Unsupported file format. Use .toml (config) or .json (frames).");
    }
    Ok(())
}

/// List the material presets.
pub fn materials() -> CliResult {
    let db = MaterialDatabase::with_defaults();
    for name in db.names() {
        if let Some(props) = db.get(name) {
            println!(
                "{name:<14} E = {:.4e}  ν = {:.3}  ρ = {:.1}",
                props.youngs_modulus(),
                props.poisson_ratio(),
                props.density
            );
        }
    }
    Ok(())
}
