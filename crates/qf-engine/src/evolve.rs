use qf_core::{QfError, C64};
use qf_register::OperatorSet;
use tracing::debug;

use crate::linalg::{self, Channel};
use crate::state::{engine_error, RegisterState};

impl RegisterState {
    /// Integrates the master equation over `dt`.
    ///
    /// Takes one Euler step when `dt <= max_dt`, otherwise `ceil(dt / max_dt)`
    /// equal substeps. The state is hermitized and renormalized afterwards.
    /// Measurement flags are kept; operator sets built for this register
    /// leave measured axes out.
    pub fn evolve(&mut self, operators: &OperatorSet, dt: f64, max_dt: f64) -> Result<(), QfError> {
        self.ensure_ready()?;
        if !(dt > 0.0 && max_dt > 0.0) || !dt.is_finite() {
            return Err(QfError::Engine(
                engine_error("invalid-timestep", "dt and max_dt must be positive")
                    .with_context("dt", dt)
                    .with_context("max_dt", max_dt),
            ));
        }
        let dim = self.rho.nrows();
        if operators.dimension() != dim {
            return Err(QfError::Engine(
                engine_error("dimension-mismatch", "operator set was built for another register")
                    .with_context("operators", operators.dimension())
                    .with_context("state", dim),
            ));
        }

        let steps = if dt <= max_dt {
            1
        } else {
            (dt / max_dt).ceil() as usize
        };
        let sub_dt = C64::new(dt / steps as f64, 0.0);
        let channels: Vec<Channel<'_>> = operators
            .jumps
            .iter()
            .map(|jump| Channel::new(&jump.operator))
            .collect();
        for _ in 0..steps {
            let drho = linalg::lindblad_rate(&self.rho, Some(&operators.hamiltonian), &channels);
            self.rho += drho * sub_dt;
        }
        self.renormalize()?;
        self.touch();
        debug!(dt, steps, jumps = channels.len(), "register evolved");
        Ok(())
    }
}
