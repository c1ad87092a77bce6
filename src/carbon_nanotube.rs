//! Carbon nanotube with a circumference of `4 * SIZE_X` atoms and `SIZE_Y`
//! atoms long, with hopping `t` and chemical potential `mu`.
//!
//! Diagonalizes the model and prints its density of states as two columns,
//! energy and count. An optional argument names a TOML file of
//! [`ModelParams`].

use std::process::ExitCode;
use tracing::{ error, info };
use tracing_subscriber::EnvFilter;
use tightbind::{
    DiagonalizationSolver,
    HoppingAmplitude,
    Model,
    ModelParams,
    PropertyExtractor,
};

const SIZE_X: i32 = 2;
const SIZE_Y: i32 = 20;

const MU: f64 = 0.0;
const T: f64 = 1.0;

const LOWER: f64 = -5.0;
const UPPER: f64 = 5.0;
const RESOLUTION: usize = 1000;

fn build(params: ModelParams) -> Model {
    let mut model = Model::new(params);
    for x in 0..SIZE_X {
        for y in 0..SIZE_Y {
            for s in 0..2 {
                for a in 0..4 {
                    model.add(HoppingAmplitude::new(-MU, [x, y, a, s], [x, y, a, s]));
                }
                model
                    .add_with_hc(HoppingAmplitude::new(-T, [x, y, 1, s], [x, y, 0, s]))
                    .add_with_hc(HoppingAmplitude::new(-T, [x, y, 2, s], [x, y, 1, s]))
                    .add_with_hc(HoppingAmplitude::new(-T, [x, y, 3, s], [x, y, 2, s]))
                    .add_with_hc(
                        HoppingAmplitude::new(-T, [(x + 1) % SIZE_X, y, 0, s], [x, y, 3, s]));
                if y + 1 < SIZE_Y {
                    model
                        .add_with_hc(HoppingAmplitude::new(-T, [x, y + 1, 0, s], [x, y, 1, s]))
                        .add_with_hc(HoppingAmplitude::new(-T, [x, y + 1, 3, s], [x, y, 2, s]));
                }
            }
        }
    }
    model
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let params: ModelParams
        = match std::env::args().nth(1) {
            Some(path) => match ModelParams::from_file(&path) {
                Ok(params) => params,
                Err(err) => {
                    error!("failed to read {path}: {err}");
                    return ExitCode::FAILURE;
                },
            },
            None => ModelParams::default(),
        };

    let mut model = build(params);
    model.construct();
    model.construct_coo();

    let solver = match DiagonalizationSolver::run(&model) {
        Ok(solver) => solver,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        },
    };
    let pe = PropertyExtractor::new(&solver);
    let ev = pe.eigenvalues();
    info!("{} eigenvalues in [{}, {}]",
        ev.len(),
        ev.data.iter().copied().fold(f64::INFINITY, f64::min),
        ev.data.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    );

    let dos = match pe.calculate_dos(LOWER, UPPER, RESOLUTION) {
        Ok(dos) => dos,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        },
    };
    for (energy, count) in dos.window.energies().iter().zip(&dos.data) {
        println!("{energy:.5} {count}");
    }
    ExitCode::SUCCESS
}
