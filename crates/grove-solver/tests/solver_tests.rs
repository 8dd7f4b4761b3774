//! Integration tests for grove-solver.

use approx::assert_relative_eq;

use grove_grid::{Grid, Side};
use grove_interp::{Interpolation, KernelCorrection, LinearBSpline, MpValues, QuadraticBSpline};
use grove_material::{ConstitutiveModel, LinearElastic, NeoHookean};
use grove_math::krylov::GmresConfig;
use grove_math::newton::NewtonConfig;
use grove_math::{Matrix, Vector};
use grove_solver::config::{
    ExplicitConfig, ImplicitConfig, InversionPolicy, LinearSolverKind, NonConvergencePolicy,
    TotalLagrangianConfig,
};
use grove_solver::implicit::{assemble_jacobian, jacobian_product, residual, NewmarkState, ResidualForm};
use grove_solver::timestep::cfl_timestep;
use grove_solver::transfer::{gather, p2g_internal_force, p2g_mass_momentum};
use grove_solver::update::update_cauchy_stress;
use grove_solver::{
    ExplicitSolver, ImplicitSolver, ParticleSet, Simulation, SolverStrategy, StressMeasure,
    TimeStepping, TotalLagrangianSolver, TransferScheme,
};
use grove_types::GroveError;
use nalgebra::DVector;

const DENSITY: f64 = 1000.0;
const LAMBDA: f64 = 5769.0;
const MU: f64 = 3846.0;

fn unit_grid(h: f64) -> Grid<2> {
    Grid::new(h, [(0.0, 1.0), (0.0, 1.0)]).unwrap()
}

/// Particles on a regular lattice filling `[lo, hi]²`, two per cell side.
fn block(lo: f64, hi: f64, h: f64) -> ParticleSet<2> {
    let dp = 0.5 * h;
    let n = ((hi - lo) / dp).round() as usize;
    let mut positions = Vec::new();
    for j in 0..n {
        for i in 0..n {
            positions.push(Vector::<2>::new(
                lo + (i as f64 + 0.5) * dp,
                lo + (j as f64 + 0.5) * dp,
            ));
        }
    }
    ParticleSet::with_uniform_volume(positions, dp * dp, DENSITY).unwrap()
}

fn explicit(config: ExplicitConfig) -> ExplicitSolver<2> {
    ExplicitSolver::new(
        config,
        Box::new(LinearBSpline),
        Box::new(NeoHookean::new(LAMBDA, MU)),
    )
    .unwrap()
}

fn fixed(dt: f64) -> TimeStepping {
    TimeStepping::Fixed { dt }
}

// ─── ParticleSet Tests ────────────────────────────────────────

#[test]
fn particle_set_initial_state() {
    let particles = block(0.4, 0.6, 0.1);
    assert_eq!(particles.len(), 16);
    assert!(particles.deformation_gradient.iter().all(|f| *f == Matrix::<2>::identity()));
    assert_relative_eq!(particles.total_mass(), 0.2 * 0.2 * DENSITY, epsilon = 1e-12);
    assert_eq!(particles.kinetic_energy(), 0.0);
    assert_eq!(particles.stress_measure, StressMeasure::Cauchy);
}

#[test]
fn particle_set_rejects_mismatched_volumes() {
    let positions = vec![Vector::<2>::new(0.5, 0.5); 3];
    let result = ParticleSet::new(positions, vec![1.0; 2], DENSITY);
    assert!(matches!(result, Err(GroveError::InvalidConfig(_))));
}

#[test]
fn particle_set_cauchy_from_kirchhoff() {
    let mut particles = ParticleSet::with_uniform_volume(vec![Vector::<2>::new(0.5, 0.5)], 1.0, 1.0).unwrap();
    particles.deformation_gradient[0] = Matrix::<2>::identity() * 2.0;
    particles.stress[0] = Matrix::<2>::identity() * 8.0;
    particles.stress_measure = StressMeasure::Kirchhoff;
    // J = 4
    assert_relative_eq!(particles.cauchy_stress(0), Matrix::<2>::identity() * 2.0, epsilon = 1e-12);
}

// ─── Transfer Tests ───────────────────────────────────────────

#[test]
fn p2g_conserves_mass() {
    let mut grid = unit_grid(0.1);
    let particles = block(0.3, 0.7, 0.1);
    let mut mp = MpValues::new(particles.len());
    mp.update_all(&LinearBSpline, &particles.position, &grid).unwrap();

    grid.clear();
    p2g_mass_momentum(&mut grid, &particles, &mp).unwrap();
    assert_relative_eq!(grid.total_mass(), particles.total_mass(), max_relative = 1e-12);
}

#[test]
fn uniform_velocity_round_trip() {
    let mut grid = unit_grid(0.1);
    let mut particles = block(0.3, 0.7, 0.1);
    let v = Vector::<2>::new(1.0, -2.0);
    particles.velocity.fill(v);

    let mut mp = MpValues::new(particles.len());
    mp.update_all(&QuadraticBSpline, &particles.position, &grid).unwrap();

    grid.clear();
    p2g_mass_momentum(&mut grid, &particles, &mp).unwrap();
    grid.update_mass_inverse();
    for i in 0..grid.len() {
        grid.velocity[i] = grid.momentum[i] * grid.mass_inv[i];
    }

    for m in mp.iter() {
        assert_relative_eq!(gather(&grid.velocity, m), v, epsilon = 1e-12);
    }
}

#[test]
fn internal_forces_sum_to_zero() {
    let mut grid = unit_grid(0.1);
    let mut particles = block(0.3, 0.7, 0.1);
    for (p, s) in particles.stress.iter_mut().enumerate() {
        *s = Matrix::<2>::new(1.0 + p as f64, 0.5, 0.5, -2.0);
    }
    let mut mp = MpValues::new(particles.len());
    mp.update_all(&LinearBSpline, &particles.position, &grid).unwrap();

    grid.clear();
    p2g_internal_force(&mut grid, &mp, &particles.volume, &particles.stress).unwrap();
    let total = grid.force.iter().fold(Vector::<2>::zeros(), |acc, f| acc + f);
    assert!(total.norm() < 1e-10, "net internal force {total}");
}

// ─── Timestep Tests ───────────────────────────────────────────

#[test]
fn cfl_timestep_uses_fastest_particle() {
    let mut particles = block(0.4, 0.6, 0.1);
    particles.velocity[3] = Vector::<2>::new(3.0, 4.0);
    let model = LinearElastic::new(LAMBDA, MU);
    let dt = cfl_timestep(&particles, &particles.volume, &model, 0.1, 0.5).unwrap();

    let c = ConstitutiveModel::<2>::wave_speed(&model, DENSITY);
    assert_relative_eq!(dt, 0.5 * 0.1 / (c + 5.0), max_relative = 1e-12);
}

#[test]
fn fixed_timestep_must_be_positive() {
    assert!(fixed(0.0).validate().is_err());
    assert!(TimeStepping::Cfl { courant: 0.0 }.validate().is_err());
    assert!(fixed(1e-3).validate().is_ok());
}

// ─── Explicit Solver Tests ────────────────────────────────────

#[test]
fn stationary_particle_stays_put() {
    let mut grid = unit_grid(0.1);
    let x0 = Vector::<2>::new(0.52, 0.47);
    let mut particles = ParticleSet::with_uniform_volume(vec![x0], 0.0025, DENSITY).unwrap();
    let mut solver = explicit(ExplicitConfig {
        timestep: fixed(1e-3),
        ..Default::default()
    });

    for _ in 0..10 {
        solver.step(&mut grid, &mut particles).unwrap();
    }
    assert_relative_eq!(particles.position[0], x0, epsilon = 1e-14);
    assert_relative_eq!(particles.velocity[0], Vector::<2>::zeros(), epsilon = 1e-14);
    assert_relative_eq!(particles.deformation_gradient[0], Matrix::<2>::identity(), epsilon = 1e-14);
}

#[test]
fn flip_conserves_momentum_of_colliding_pair() {
    let mut grid = unit_grid(0.1);
    let mut particles = ParticleSet::with_uniform_volume(
        vec![Vector::<2>::new(0.46, 0.5), Vector::<2>::new(0.54, 0.52)],
        0.0025,
        DENSITY,
    )
    .unwrap();
    particles.velocity[0] = Vector::<2>::new(0.5, 0.1);
    particles.velocity[1] = Vector::<2>::new(-0.5, -0.1);
    let p0 = particles.momentum();

    let mut solver = explicit(ExplicitConfig {
        transfer: TransferScheme::Flip { alpha: 1.0 },
        timestep: fixed(1e-4),
        ..Default::default()
    });
    for _ in 0..20 {
        solver.step(&mut grid, &mut particles).unwrap();
    }
    assert_relative_eq!(particles.momentum(), p0, epsilon = 1e-12);
}

#[test]
fn free_fall_matches_gravity() {
    let mut grid = unit_grid(0.1);
    let mut particles = block(0.4, 0.6, 0.1);
    let mut solver = explicit(ExplicitConfig {
        timestep: fixed(1e-3),
        gravity: vec![0.0, -9.81],
        ..Default::default()
    });

    for _ in 0..5 {
        solver.step(&mut grid, &mut particles).unwrap();
    }
    for v in &particles.velocity {
        assert_relative_eq!(v.y, -9.81 * 5e-3, max_relative = 1e-10);
        assert!(v.x.abs() < 1e-12);
    }
}

#[test]
fn apic_requires_affine_kernel() {
    let config = ExplicitConfig {
        transfer: TransferScheme::Apic,
        ..Default::default()
    };
    let linear = ExplicitSolver::<2>::new(
        config.clone(),
        Box::new(LinearBSpline),
        Box::new(NeoHookean::new(LAMBDA, MU)),
    );
    assert!(matches!(linear, Err(GroveError::InvalidConfig(_))));

    let quadratic = ExplicitSolver::<2>::new(
        config,
        Box::new(QuadraticBSpline),
        Box::new(NeoHookean::new(LAMBDA, MU)),
    );
    assert!(quadratic.is_ok());
}

#[test]
fn flip_blend_factor_out_of_range_rejected() {
    let scheme = TransferScheme::Flip { alpha: 1.5 };
    assert!(scheme.validate(None).is_err());
    assert!(TransferScheme::Tpic.validate(None).is_ok());
}

#[test]
fn apic_translation_keeps_affine_zero() {
    let mut grid = unit_grid(0.1);
    let mut particles = block(0.3, 0.7, 0.1);
    particles.velocity.fill(Vector::<2>::new(0.2, 0.0));
    let mut solver = ExplicitSolver::new(
        ExplicitConfig {
            transfer: TransferScheme::Apic,
            timestep: fixed(1e-3),
            ..Default::default()
        },
        Box::new(QuadraticBSpline),
        Box::new(NeoHookean::new(LAMBDA, MU)),
    )
    .unwrap();

    solver.step(&mut grid, &mut particles).unwrap();
    for (v, b) in particles.velocity.iter().zip(&particles.affine) {
        assert_relative_eq!(*v, Vector::<2>::new(0.2, 0.0), epsilon = 1e-12);
        assert!(b.norm() < 1e-12);
    }
}

#[test]
fn particle_outside_grid_is_reported() {
    let mut grid = unit_grid(0.1);
    let mut particles = ParticleSet::with_uniform_volume(vec![Vector::<2>::new(3.0, 3.0)], 0.0025, DENSITY).unwrap();
    let mut solver = explicit(ExplicitConfig {
        timestep: fixed(1e-3),
        ..Default::default()
    });
    let err = solver.step(&mut grid, &mut particles).unwrap_err();
    assert!(err.is_support_error());
}

#[test]
fn fixed_face_stops_particles() {
    let mut grid = unit_grid(0.1);
    grid.fix_face(1, Side::Min).unwrap();
    let mut particles = ParticleSet::with_uniform_volume(vec![Vector::<2>::new(0.5, 0.05)], 0.0025, DENSITY).unwrap();
    particles.velocity[0] = Vector::<2>::new(0.0, -1.0);
    let mut solver = explicit(ExplicitConfig {
        transfer: TransferScheme::Flip { alpha: 0.0 },
        timestep: fixed(1e-3),
        ..Default::default()
    });

    solver.step(&mut grid, &mut particles).unwrap();
    // Half the stencil sits on the fixed face.
    assert!(particles.velocity[0].y > -1.0);
}

#[test]
fn flip_particle_against_fixed_nodes_comes_to_rest() {
    let mut grid = unit_grid(0.1);
    for i in 0..grid.len() {
        grid.fix_node(i);
    }
    let x0 = Vector::<2>::new(0.52, 0.47);
    let mut particles = ParticleSet::with_uniform_volume(vec![x0], 0.0025, DENSITY).unwrap();
    particles.velocity[0] = Vector::<2>::new(1.0, 0.0);
    let mut solver = explicit(ExplicitConfig {
        transfer: TransferScheme::Flip { alpha: 1.0 },
        timestep: fixed(1e-3),
        ..Default::default()
    });

    for _ in 0..5 {
        solver.step(&mut grid, &mut particles).unwrap();
    }
    assert_relative_eq!(particles.velocity[0], Vector::<2>::zeros(), epsilon = 1e-12);
    assert_relative_eq!(particles.position[0], x0, epsilon = 1e-14);
}

/// Two particles moving toward each other, away from the boundary.
fn colliding_pair() -> ParticleSet<2> {
    let mut particles = ParticleSet::with_uniform_volume(
        vec![Vector::<2>::new(0.46, 0.5), Vector::<2>::new(0.54, 0.52)],
        0.0025,
        DENSITY,
    )
    .unwrap();
    particles.velocity[0] = Vector::<2>::new(0.5, 0.1);
    particles.velocity[1] = Vector::<2>::new(-0.5, -0.1);
    particles
}

fn solver_with(transfer: TransferScheme, interpolation: Box<dyn Interpolation<2>>) -> ExplicitSolver<2> {
    ExplicitSolver::new(
        ExplicitConfig {
            transfer,
            timestep: fixed(1e-4),
            ..Default::default()
        },
        interpolation,
        Box::new(NeoHookean::new(LAMBDA, MU)),
    )
    .unwrap()
}

#[test]
fn apic_conserves_momentum_of_colliding_pair() {
    let mut grid = unit_grid(0.1);
    let mut particles = colliding_pair();
    let p0 = particles.momentum();
    let mut solver = solver_with(TransferScheme::Apic, Box::new(QuadraticBSpline));

    for _ in 0..20 {
        solver.step(&mut grid, &mut particles).unwrap();
    }
    assert_relative_eq!(particles.momentum(), p0, epsilon = 1e-12);
    assert!(particles.affine.iter().any(|b| b.norm() > 0.0));
}

#[test]
fn tpic_conserves_momentum_of_colliding_pair() {
    let mut grid = unit_grid(0.1);
    let mut particles = colliding_pair();
    let p0 = particles.momentum();
    let mut solver = solver_with(TransferScheme::Tpic, Box::new(LinearBSpline));

    for _ in 0..20 {
        solver.step(&mut grid, &mut particles).unwrap();
    }
    assert_relative_eq!(particles.momentum(), p0, epsilon = 1e-12);
}

const OMEGA: f64 = 2.0;

/// Rigid rotation about the grid centre: `v = W (x − c)`.
fn spin() -> (Matrix<2>, Vector<2>) {
    (Matrix::<2>::new(0.0, -OMEGA, OMEGA, 0.0), Vector::<2>::new(0.5, 0.5))
}

fn angular_momentum(particles: &ParticleSet<2>, centre: &Vector<2>) -> f64 {
    particles
        .position
        .iter()
        .zip(&particles.velocity)
        .zip(&particles.mass)
        .map(|((x, v), m)| {
            let r = x - centre;
            m * (r.x * v.y - r.y * v.x)
        })
        .sum()
}

#[test]
fn apic_reproduces_rigid_rotation() {
    let h = 0.1;
    let mut grid = unit_grid(h);
    let mut particles = block(0.3, 0.7, h);
    let (w, c) = spin();
    for (v, x) in particles.velocity.iter_mut().zip(&particles.position) {
        *v = w * (x - c);
    }
    // Quadratic B-spline inertia is h²/4 I, so B = W h²/4 carries W to the grid.
    particles.affine.fill(w * (0.25 * h * h));
    let x_old = particles.position.clone();
    let l0 = angular_momentum(&particles, &c);
    let mut solver = solver_with(TransferScheme::Apic, Box::new(QuadraticBSpline));

    solver.step(&mut grid, &mut particles).unwrap();
    for p in 0..particles.len() {
        assert_relative_eq!(particles.velocity[p], w * (x_old[p] - c), epsilon = 1e-12);
        assert_relative_eq!(particles.affine[p], w * (0.25 * h * h), epsilon = 1e-12);
        assert_relative_eq!(particles.velocity_gradient[p], w, epsilon = 1e-10);
    }
    assert_relative_eq!(angular_momentum(&particles, &c), l0, max_relative = 1e-12);
}

#[test]
fn tpic_reproduces_rigid_rotation() {
    let h = 0.1;
    let mut grid = unit_grid(h);
    let mut particles = block(0.3, 0.7, h);
    let (w, c) = spin();
    for (v, x) in particles.velocity.iter_mut().zip(&particles.position) {
        *v = w * (x - c);
    }
    particles.velocity_gradient.fill(w);
    let x_old = particles.position.clone();
    let l0 = angular_momentum(&particles, &c);
    let mut solver = solver_with(TransferScheme::Tpic, Box::new(LinearBSpline));

    solver.step(&mut grid, &mut particles).unwrap();
    for p in 0..particles.len() {
        assert_relative_eq!(particles.velocity[p], w * (x_old[p] - c), epsilon = 1e-12);
        assert_relative_eq!(particles.velocity_gradient[p], w, epsilon = 1e-10);
    }
    assert_relative_eq!(angular_momentum(&particles, &c), l0, max_relative = 1e-12);
}

#[test]
fn tpic_without_gradient_loses_rotation() {
    let h = 0.1;
    let mut grid = unit_grid(h);
    let mut particles = block(0.3, 0.7, h);
    let (w, c) = spin();
    for (v, x) in particles.velocity.iter_mut().zip(&particles.position) {
        *v = w * (x - c);
    }
    let l0 = angular_momentum(&particles, &c);
    let mut solver = solver_with(TransferScheme::Tpic, Box::new(LinearBSpline));

    solver.step(&mut grid, &mut particles).unwrap();
    assert!(angular_momentum(&particles, &c) < l0 * (1.0 - 1e-6));
}

// ─── Stress Update Tests ──────────────────────────────────────

#[test]
fn inverted_particle_fails_by_default() {
    let mut particles = ParticleSet::with_uniform_volume(vec![Vector::<2>::new(0.5, 0.5)], 1.0, 1.0).unwrap();
    let dt = 0.1;
    particles.velocity_gradient[0] = Matrix::<2>::new(-2.0 / dt, 0.0, 0.0, 0.0);
    let model = LinearElastic::new(LAMBDA, MU);

    let mut failing = particles.clone();
    let err = update_cauchy_stress(&mut failing, &model, dt, InversionPolicy::Fail).unwrap_err();
    assert!(matches!(err, GroveError::InvertedDeformation { jacobian, .. } if jacobian < 0.0));

    let mut ignoring = particles;
    assert!(update_cauchy_stress(&mut ignoring, &model, dt, InversionPolicy::Ignore).is_ok());
    assert_relative_eq!(ignoring.volume[0], -1.0, epsilon = 1e-12);
}

#[test]
fn von_mises_uses_plane_strain_normal_stress() {
    let mut particles = ParticleSet::with_uniform_volume(vec![Vector::<2>::new(0.5, 0.5)], 1.0, 1.0).unwrap();
    let dt = 0.1;
    particles.velocity_gradient[0] = Matrix::<2>::new(2.0, 0.0, 0.0, 0.0);
    let model = NeoHookean::new(LAMBDA, MU);
    update_cauchy_stress(&mut particles, &model, dt, InversionPolicy::Fail).unwrap();

    // F = diag(1.2, 1), plane strain keeps F_zz = 1.
    let j: f64 = 1.2;
    let sigma_zz = LAMBDA * j.ln() / j;
    assert_relative_eq!(particles.out_of_plane_stress[0], sigma_zz, max_relative = 1e-12);
    let sigma = particles.cauchy_stress(0);
    let (a, b, c) = (sigma[(0, 0)], sigma[(1, 1)], sigma_zz);
    let expected = (0.5 * ((a - b).powi(2) + (b - c).powi(2) + (c - a).powi(2))).sqrt();
    assert_relative_eq!(particles.von_mises(0), expected, max_relative = 1e-12);
}

// ─── Implicit Solver Tests ────────────────────────────────────

fn implicit_setup() -> (Grid<2>, ParticleSet<2>) {
    let grid = unit_grid(0.1);
    let mut particles = block(0.3, 0.7, 0.1);
    for (v, x) in particles.velocity.iter_mut().zip(&particles.position) {
        *v = Vector::<2>::new(0.1 * (x.y - 0.5), 0.05);
    }
    (grid, particles)
}

fn implicit(config: ImplicitConfig, model: Box<dyn ConstitutiveModel<2>>) -> ImplicitSolver<2> {
    ImplicitSolver::new(config, Box::new(LinearBSpline), model).unwrap()
}

#[test]
fn implicit_linear_elastic_converges_in_one_iteration() {
    let (mut grid, mut particles) = implicit_setup();
    let mut solver = implicit(
        ImplicitConfig {
            dt: 1e-3,
            gravity: vec![0.0, -9.81],
            ..Default::default()
        },
        Box::new(LinearElastic::new(LAMBDA, MU)),
    );

    let report = solver.step(&mut grid, &mut particles).unwrap();
    assert!(report.converged);
    assert_eq!(report.iterations, 1);
    assert_eq!(report.residual_history.len(), 2);
    assert_eq!(particles.stress_measure, StressMeasure::Kirchhoff);
    assert_eq!(particles.tangent.len(), particles.len());
}

#[test]
fn implicit_jacobian_free_converges() {
    let (mut grid, mut particles) = implicit_setup();
    let mut solver = implicit(
        ImplicitConfig {
            dt: 1e-3,
            gravity: vec![0.0, -9.81],
            linear_solver: LinearSolverKind::JacobianFree {
                gmres: GmresConfig::default(),
            },
            ..Default::default()
        },
        Box::new(NeoHookean::new(LAMBDA, MU)),
    );

    for _ in 0..3 {
        let report = solver.step(&mut grid, &mut particles).unwrap();
        assert!(report.converged);
        assert!(report.iterations <= 4, "took {} iterations", report.iterations);
    }
}

#[test]
fn implicit_free_fall_velocity() {
    let (mut grid, mut particles) = implicit_setup();
    particles.velocity.fill(Vector::<2>::zeros());
    let dt = 1e-3;
    let mut solver = implicit(
        ImplicitConfig {
            dt,
            gravity: vec![0.0, -9.81],
            ..Default::default()
        },
        Box::new(NeoHookean::new(LAMBDA, MU)),
    );

    solver.step(&mut grid, &mut particles).unwrap();
    // Trapezoidal rule from rest: v = γ Δt g.
    for v in &particles.velocity {
        assert_relative_eq!(v.y, -0.5 * 9.81 * dt, max_relative = 1e-6);
    }
}

fn exhausted_newton() -> NewtonConfig {
    NewtonConfig {
        max_iterations: 0,
        ..Default::default()
    }
}

#[test]
fn nonconvergence_abort() {
    let (mut grid, mut particles) = implicit_setup();
    let mut solver = implicit(
        ImplicitConfig {
            newton: exhausted_newton(),
            on_nonconvergence: NonConvergencePolicy::Abort,
            ..Default::default()
        },
        Box::new(NeoHookean::new(LAMBDA, MU)),
    );
    let before = particles.position.clone();
    let err = solver.step(&mut grid, &mut particles).unwrap_err();
    assert!(matches!(err, GroveError::NonConvergence { iterations: 0, .. }));
    assert_eq!(particles.position, before);
}

#[test]
fn nonconvergence_accept_last_iterate() {
    let (mut grid, mut particles) = implicit_setup();
    let mut solver = implicit(
        ImplicitConfig {
            newton: exhausted_newton(),
            on_nonconvergence: NonConvergencePolicy::AcceptLastIterate,
            ..Default::default()
        },
        Box::new(NeoHookean::new(LAMBDA, MU)),
    );
    let report = solver.step(&mut grid, &mut particles).unwrap();
    assert!(!report.converged);
    assert_eq!(report.retries, 0);
    assert_eq!(particles.stress_measure, StressMeasure::Kirchhoff);
}

#[test]
fn nonconvergence_shrink_gives_up_after_retries() {
    let (mut grid, mut particles) = implicit_setup();
    let mut solver = implicit(
        ImplicitConfig {
            newton: exhausted_newton(),
            on_nonconvergence: NonConvergencePolicy::ShrinkTimestep {
                factor: 0.5,
                max_retries: 2,
            },
            ..Default::default()
        },
        Box::new(NeoHookean::new(LAMBDA, MU)),
    );
    let err = solver.step(&mut grid, &mut particles).unwrap_err();
    assert!(matches!(err, GroveError::NonConvergence { .. }));
}

#[test]
fn shrink_factor_must_be_fractional() {
    let config = ImplicitConfig {
        on_nonconvergence: NonConvergencePolicy::ShrinkTimestep {
            factor: 1.5,
            max_retries: 1,
        },
        ..Default::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn assembled_and_matrix_free_jacobians_agree() {
    let mut grid = unit_grid(0.1);
    grid.fix_face(0, Side::Min).unwrap();
    let particles = block(0.0, 0.4, 0.1);
    let interpolation = KernelCorrection::new(QuadraticBSpline);
    let mut mpvalues = MpValues::new(particles.len());
    mpvalues.update_all(&interpolation, &particles.position, &grid).unwrap();
    assert!(mpvalues.iter().any(|mp| mp.is_truncated()));

    grid.clear();
    p2g_mass_momentum(&mut grid, &particles, &mpvalues).unwrap();
    grid.update_mass_inverse();

    let model = NeoHookean::new(LAMBDA, MU);
    let (dt, beta) = (1e-3, 0.25);
    let mut state = NewmarkState::new(
        &mut grid,
        &particles,
        &mpvalues,
        &model,
        dt,
        beta,
        0.5,
        Vector::<2>::zeros(),
        InversionPolicy::Fail,
        ResidualForm::MassScaled {
            gmres: GmresConfig::default(),
        },
    );
    let n = state.ndofs();
    // Nonzero iterate so the tangent differs from the reference one.
    let u = DVector::from_fn(n, |k, _| 1e-3 * (k as f64).sin());
    residual(&u, &mut state).unwrap();

    let x = DVector::from_fn(n, |k, _| (0.7 * k as f64).cos());
    let mut assembled = vec![0.0; n];
    assemble_jacobian(&state).mul_vec(x.as_slice(), &mut assembled);
    let mut matrix_free = DVector::zeros(n);
    jacobian_product(&mut state, &x, &mut matrix_free);

    let scale = beta * dt * dt;
    for i in 0..state.grid.len() {
        for a in 0..2 {
            if let Some(k) = state.dofmap.dof(i, a) {
                let expected = scale * state.grid.mass_inv[i] * assembled[k];
                assert_relative_eq!(matrix_free[k], expected, epsilon = 1e-9, max_relative = 1e-9);
            }
        }
    }
}

// ─── Total-Lagrangian Solver Tests ────────────────────────────

#[test]
fn total_lagrangian_body_force_accelerates_block() {
    let mut grid = unit_grid(0.1);
    let mut particles = block(0.4, 0.6, 0.1);
    let mut solver = TotalLagrangianSolver::new(
        TotalLagrangianConfig::default(),
        Box::new(LinearBSpline),
        Box::new(NeoHookean::new(LAMBDA, MU)),
    )
    .unwrap()
    .with_body_force(|_time: f64, grid: &mut Grid<2>| {
        grid.body.fill(Vector::<2>::new(0.0, -1.0));
    });

    let report = solver.step(&mut grid, &mut particles).unwrap();
    assert_relative_eq!(solver.time(), report.dt);
    assert_eq!(particles.stress_measure, StressMeasure::FirstPiola);
    for v in &particles.velocity {
        assert_relative_eq!(v.y, -report.dt, max_relative = 1e-10);
    }
}

#[test]
fn total_lagrangian_weights_stay_at_reference() {
    let mut grid = unit_grid(0.1);
    let mut particles = block(0.4, 0.6, 0.1);
    particles.velocity.fill(Vector::<2>::new(0.3, 0.0));
    let mut solver = TotalLagrangianSolver::new(
        TotalLagrangianConfig::default(),
        Box::new(LinearBSpline),
        Box::new(NeoHookean::new(LAMBDA, MU)),
    )
    .unwrap();

    solver.step(&mut grid, &mut particles).unwrap();
    let first = solver.mpvalues().as_slice().to_vec();
    solver.step(&mut grid, &mut particles).unwrap();
    assert_eq!(solver.mpvalues().as_slice(), first.as_slice());
    assert!(particles.position[0].x > particles.reference_position[0].x);
}

#[test]
fn total_lagrangian_timestep_uses_current_density() {
    let h = 0.1;
    let mut grid = unit_grid(h);
    let mut particles = ParticleSet::with_uniform_volume(vec![Vector::<2>::new(0.52, 0.47)], 0.0025, DENSITY).unwrap();
    // Compressed to J = 1/4, so the current density is four times the reference one.
    particles.deformation_gradient[0] = Matrix::<2>::identity() * 0.5;
    particles.volume[0] = 0.25 * particles.initial_volume[0];
    let model = NeoHookean::new(LAMBDA, MU);
    let config = TotalLagrangianConfig::default();
    let courant = config.courant;
    let mut solver = TotalLagrangianSolver::new(config, Box::new(LinearBSpline), Box::new(model)).unwrap();

    let report = solver.step(&mut grid, &mut particles).unwrap();
    let c = ConstitutiveModel::<2>::wave_speed(&model, 4.0 * DENSITY);
    assert_relative_eq!(report.dt, courant * h / c, max_relative = 1e-12);
}

// ─── Simulation Tests ─────────────────────────────────────────

#[test]
fn simulation_tracks_time_and_steps() {
    let grid = unit_grid(0.1);
    let particles = block(0.4, 0.6, 0.1);
    let solver = explicit(ExplicitConfig {
        timestep: fixed(1e-3),
        ..Default::default()
    });
    let mut sim = Simulation::new(grid, particles, Box::new(solver));

    for _ in 0..5 {
        sim.advance().unwrap();
    }
    assert_eq!(sim.steps(), 5);
    assert_relative_eq!(sim.time(), 5e-3, epsilon = 1e-15);
    assert_eq!(sim.solver_name(), "explicit");
}

#[test]
fn simulation_run_until_calls_back() {
    let grid = unit_grid(0.1);
    let particles = block(0.4, 0.6, 0.1);
    let solver = explicit(ExplicitConfig {
        timestep: fixed(1e-3),
        ..Default::default()
    });
    let mut sim = Simulation::new(grid, particles, Box::new(solver));

    let mut calls = 0;
    sim.run_until(0.0095, |_, report| {
        calls += 1;
        assert_relative_eq!(report.dt, 1e-3);
        Ok(())
    })
    .unwrap();
    assert_eq!(calls, 10);
    assert_eq!(sim.steps(), 10);
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn explicit_config_from_toml() {
    let text = r#"
        gravity = [0.0, -9.81]

        [transfer]
        kind = "flip"
        alpha = 0.95

        [timestep]
        kind = "fixed"
        dt = 0.001
    "#;
    let config: ExplicitConfig = toml::from_str(text).unwrap();
    assert_eq!(config.transfer, TransferScheme::Flip { alpha: 0.95 });
    assert_eq!(config.timestep, fixed(0.001));
    assert_eq!(config.inversion, InversionPolicy::Fail);
}

#[test]
fn implicit_config_from_toml() {
    let text = r#"
        dt = 0.002
        beta = 0.25
        gamma = 0.5

        [linear_solver]
        kind = "jacobian_free"

        [on_nonconvergence]
        kind = "shrink_timestep"
        factor = 0.5
        max_retries = 3
    "#;
    let config: ImplicitConfig = toml::from_str(text).unwrap();
    assert!(config.validate().is_ok());
    assert!(matches!(
        config.linear_solver,
        LinearSolverKind::JacobianFree { ref gmres } if gmres.restart == 50
    ));
    assert_eq!(
        config.on_nonconvergence,
        NonConvergencePolicy::ShrinkTimestep {
            factor: 0.5,
            max_retries: 3
        }
    );
    assert_eq!(config.newton.max_iterations, 20);
}

#[test]
fn explicit_config_json_round_trip() {
    let config = ExplicitConfig::default();
    let json = serde_json::to_string(&config).unwrap();
    let back: ExplicitConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.transfer, config.transfer);
}
