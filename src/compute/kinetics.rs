//! Forward model - simulated mass-fraction curves for kinetic parameters.
//!
//! The search only depends on [`ForwardModel`]; [`ArrheniusModel`] is the
//! integrator used by the command-line driver.

use crate::schema::{ExperimentalDataset, KineticParams};

/// Universal gas constant (J/(mol K)).
pub const GAS_CONSTANT: f64 = 8.314;

/// Maps kinetic parameters to a simulated trajectory aligned with a dataset.
///
/// `trajectory[i]` is the predicted mass fraction at `dataset[i].time`.
/// Implementations must be deterministic and may write non-finite values when
/// the parameters drive the integration unstable.
pub trait ForwardModel {
    fn simulate(
        &self,
        params: &KineticParams,
        dataset: &ExperimentalDataset,
        trajectory: &mut [f64],
    );
}

impl<F> ForwardModel for F
where
    F: Fn(&KineticParams, &ExperimentalDataset, &mut [f64]),
{
    fn simulate(
        &self,
        params: &KineticParams,
        dataset: &ExperimentalDataset,
        trajectory: &mut [f64],
    ) {
        self(params, dataset, trajectory)
    }
}

/// Single-step Arrhenius decomposition with a residual mass fraction:
///
/// `dy/dt = -A exp(-E / (R T(t))) (1 - yinf) ((y - yinf) / (1 - yinf))^NS`
///
/// Temperature is interpolated linearly between samples and the initial mass
/// fraction is taken from the first sample. Integration uses the adaptive
/// Bogacki-Shampine 2(3) pair.
#[derive(Debug, Clone)]
pub struct ArrheniusModel {
    /// Relative error tolerance per step.
    pub rtol: f64,
    /// Absolute error tolerance per step.
    pub atol: f64,
    /// Step budget between two consecutive samples.
    pub max_steps_per_interval: usize,
}

impl Default for ArrheniusModel {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            max_steps_per_interval: 10_000,
        }
    }
}

/// Reaction rate at temperature `temperature` and mass fraction `y`.
#[inline]
fn rate(params: &KineticParams, temperature: f64, y: f64) -> f64 {
    let k = params.a * (-params.e / (GAS_CONSTANT * temperature)).exp();
    let span = 1.0 - params.yinf;
    // No decomposition once the residual fraction is reached.
    let conversion = ((y - params.yinf) / span).max(0.0);
    -k * span * conversion.powf(params.ns)
}

impl ArrheniusModel {
    /// Integrate from `t0` to `t1` with temperature ramping from `temp0` to `temp1`.
    ///
    /// Returns `None` when the state becomes non-finite or the step budget runs out.
    fn integrate_interval(
        &self,
        params: &KineticParams,
        (t0, temp0): (f64, f64),
        (t1, temp1): (f64, f64),
        mut y: f64,
    ) -> Option<f64> {
        let span = t1 - t0;
        let slope = (temp1 - temp0) / span;
        let temperature = |t: f64| temp0 + slope * (t - t0);
        let f = |t: f64, y: f64| rate(params, temperature(t), y);

        let mut t = t0;
        let mut h = span;
        let min_step = span * 1e-12;
        let mut k1 = f(t, y);

        for _ in 0..self.max_steps_per_interval {
            let last = h >= t1 - t;
            if last {
                h = t1 - t;
            }

            let k2 = f(t + 0.5 * h, y + 0.5 * h * k1);
            let k3 = f(t + 0.75 * h, y + 0.75 * h * k2);
            let y_next = y + h * (2.0 / 9.0 * k1 + 1.0 / 3.0 * k2 + 4.0 / 9.0 * k3);
            let k4 = f(t + h, y_next);
            let y_low = y + h * (7.0 / 24.0 * k1 + 0.25 * k2 + 1.0 / 3.0 * k3 + 0.125 * k4);

            let err = (y_next - y_low).abs();
            if !y_next.is_finite() || !err.is_finite() {
                return None;
            }

            let tol = self.atol + self.rtol * y.abs().max(y_next.abs());
            let accepted = err <= tol;
            if accepted {
                if last {
                    return Some(y_next);
                }
                t += h;
                y = y_next;
                // FSAL: the last stage is the first stage of the next step.
                k1 = k4;
            }

            let factor = if err == 0.0 {
                5.0
            } else {
                (0.9 * (tol / err).cbrt()).clamp(0.2, 5.0)
            };
            h *= factor;

            if !accepted && h < min_step {
                return None;
            }
        }

        None
    }
}

impl ForwardModel for ArrheniusModel {
    fn simulate(
        &self,
        params: &KineticParams,
        dataset: &ExperimentalDataset,
        trajectory: &mut [f64],
    ) {
        let records = dataset.records();
        let mut y = records[0].mass_fraction;
        trajectory[0] = y;

        for (i, pair) in records.windows(2).enumerate() {
            let start = (pair[0].time, pair[0].temperature);
            let end = (pair[1].time, pair[1].temperature);

            match self.integrate_interval(params, start, end, y) {
                Some(next) => {
                    y = next;
                    trajectory[i + 1] = y;
                }
                None => {
                    trajectory[i + 1..].fill(f64::NAN);
                    return;
                }
            }
        }
    }
}
