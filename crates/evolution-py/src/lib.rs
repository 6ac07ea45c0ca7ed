use evolution_core::persistence;
use evolution_core::{EnvParam, Mode, SimConfig, World};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::fmt::Display;

fn value_error(err: impl Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Python handle over a simulated world. Rejected actions raise `ValueError`.
#[pyclass(name = "World")]
struct PyWorld {
    inner: World,
}

#[pymethods]
impl PyWorld {
    #[new]
    #[pyo3(signature = (seed = 42, mode = "scientist"))]
    fn new(seed: u64, mode: &str) -> PyResult<Self> {
        let mode = mode.parse::<Mode>().map_err(value_error)?;
        let config = SimConfig {
            seed,
            mode,
            ..SimConfig::default()
        };
        let inner = World::try_new(config).map_err(value_error)?;
        Ok(Self { inner })
    }

    /// Restores a world saved with `to_json`.
    #[staticmethod]
    #[pyo3(signature = (text, seed = 42))]
    fn from_json(text: &str, seed: u64) -> PyResult<Self> {
        let config = SimConfig {
            seed,
            ..SimConfig::default()
        };
        let inner = persistence::from_json_str(text, config).map_err(value_error)?;
        Ok(Self { inner })
    }

    fn to_json(&self) -> PyResult<String> {
        persistence::to_json_string(&self.inner).map_err(value_error)
    }

    #[pyo3(signature = (n = 1))]
    fn tick(&mut self, n: u64) -> u64 {
        self.inner.tick(n)
    }

    /// Catches up on the ticks owed since the last checkpoint.
    fn fast_forward(&mut self) -> u64 {
        self.inner.fast_forward_now()
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn resume(&mut self) {
        self.inner.resume();
    }

    #[pyo3(signature = (action, target = None))]
    fn apply_intervention(&mut self, action: &str, target: Option<u64>) -> PyResult<String> {
        self.inner
            .apply_named_intervention(action, target)
            .map(|report| report.message)
            .map_err(value_error)
    }

    fn intervention_cost(&self, action: &str) -> PyResult<u64> {
        let action = action.parse().map_err(value_error)?;
        Ok(self.inner.intervention_cost(action))
    }

    fn set_environment(&mut self, param: &str, value: f64) -> PyResult<()> {
        let param = param.parse::<EnvParam>().map_err(value_error)?;
        self.inner.set_environment(param, value);
        Ok(())
    }

    fn environment(&self) -> Vec<(String, f64)> {
        self.inner
            .environment()
            .iter()
            .map(|(p, v)| (p.as_str().to_string(), v))
            .collect()
    }

    /// `(id, name, population, phase, extinct)` for every roster entry.
    fn species(&self) -> Vec<(u64, String, u64, String, bool)> {
        self.inner
            .species()
            .iter()
            .map(|s| {
                (
                    s.id,
                    s.name.clone(),
                    s.population(),
                    s.phase.as_str().to_string(),
                    s.is_extinct(),
                )
            })
            .collect()
    }

    fn events(&self) -> Vec<String> {
        self.inner.events().map(str::to_string).collect()
    }

    fn stats_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner.stats()).map_err(value_error)
    }

    #[getter]
    fn tick_count(&self) -> u64 {
        self.inner.tick_count()
    }

    #[getter]
    fn year(&self) -> u64 {
        self.inner.year()
    }

    #[getter]
    fn influence_points(&self) -> u64 {
        self.inner.influence_points()
    }

    #[getter]
    fn paused(&self) -> bool {
        self.inner.is_paused()
    }

    fn __repr__(&self) -> String {
        format!(
            "World(year={}, live_species={}, influence_points={})",
            self.inner.year(),
            self.inner.live_count(),
            self.inner.influence_points()
        )
    }
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_class::<PyWorld>()?;
    Ok(())
}
