use aircombat_shared::*;
use aircombat_sim::{ExternalInput, Simulation};
use numpy::{PyArray1, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

fn value_error(err: impl std::fmt::Display) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Gym-like environment: the red team is driven from Python, blue flies a
/// built-in policy.
///
/// Usage:
///     env = AirCombatEnv(team_size=2, seed=7, opponent="gravity")
///     obs = env.reset()                          # (2, obs_size) float32
///     obs, rewards, done, info = env.step(actions)  # actions: (2, 5) int64
#[pyclass(unsendable)]
struct AirCombatEnv {
    config: ArenaConfig,
    sim: Simulation,
    /// Roster slots of the red agents, in roster order.
    red: Vec<usize>,
    /// Cumulative reward of each red agent after the last step.
    banked: Vec<f32>,
}

impl AirCombatEnv {
    fn build(config: &ArenaConfig) -> PyResult<(Simulation, Vec<usize>)> {
        let sim = Simulation::new(config, SimConfig::training()).map_err(value_error)?;
        let red = sim
            .arena()
            .agents()
            .iter()
            .enumerate()
            .filter(|(_, a)| a.team() == Team::Red)
            .map(|(i, _)| i)
            .collect();
        Ok((sim, red))
    }

    fn red_observations<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f32>>> {
        let rows: Vec<Vec<f32>> = self
            .red
            .iter()
            .map(|&i| {
                self.sim
                    .observation(i)
                    .map(|o| o.data.clone())
                    .unwrap_or_default()
            })
            .collect();
        Ok(PyArray2::from_vec2_bound(py, &rows)?)
    }
}

#[pymethods]
impl AirCombatEnv {
    #[new]
    #[pyo3(signature = (team_size=1, seed=0, opponent="greedy"))]
    fn new(team_size: u32, seed: u64, opponent: &str) -> PyResult<Self> {
        let blue: PolicyKind = opponent.parse().map_err(value_error)?;
        let config = ArenaConfig::versus(PolicyKind::Learned, blue, team_size).with_seed(seed);
        let (sim, red) = Self::build(&config)?;
        let banked = vec![0.0; red.len()];
        Ok(Self {
            config,
            sim,
            red,
            banked,
        })
    }

    /// Start from a fresh arena. Returns observations (n_red, obs_size).
    #[pyo3(signature = (seed=None))]
    fn reset<'py>(&mut self, py: Python<'py>, seed: Option<u64>) -> PyResult<Bound<'py, PyArray2<f32>>> {
        if let Some(seed) = seed {
            self.config.seed = seed;
        }
        let (sim, red) = Self::build(&self.config)?;
        self.sim = sim;
        self.banked = vec![0.0; red.len()];
        self.red = red;
        self.red_observations(py)
    }

    /// Advance one tick with one discrete action row per red agent.
    ///
    /// Returns (obs, rewards, done, info). When an episode ends the arena is
    /// already reset, so `obs` belongs to the next episode.
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        actions: PyReadonlyArray2<i64>,
    ) -> PyResult<(
        Bound<'py, PyArray2<f32>>,
        Bound<'py, PyArray1<f32>>,
        bool,
        Bound<'py, PyDict>,
    )> {
        let actions = actions.as_array();
        if actions.shape() != [self.red.len(), ACTION_SIZE] {
            return Err(PyValueError::new_err(format!(
                "expected actions shape ({}, {}), got {:?}",
                self.red.len(),
                ACTION_SIZE,
                actions.shape()
            )));
        }

        for (row, &slot) in actions.rows().into_iter().zip(&self.red) {
            let action = ActionTuple::from_slice(&row.to_vec()).map_err(value_error)?;
            self.sim
                .submit_input(slot, ExternalInput::Learned(action))
                .map_err(value_error)?;
        }

        let summary = self.sim.step();

        // The arena resets as soon as an episode ends, so read the final
        // totals from the summary.
        let totals: Vec<f32> = match &summary {
            Some(s) => self.red.iter().map(|&i| s.agents[i].reward).collect(),
            None => self
                .red
                .iter()
                .map(|&i| self.sim.arena().agent(i).cumulative_reward())
                .collect(),
        };
        let rewards: Vec<f32> = totals
            .iter()
            .zip(&self.banked)
            .map(|(total, banked)| total - banked)
            .collect();
        self.banked = match summary {
            Some(_) => vec![0.0; self.red.len()],
            None => totals,
        };

        let info = PyDict::new_bound(py);
        info.set_item("tick", self.sim.tick())?;
        info.set_item("episode", self.sim.episode_index())?;
        if let Some(s) = &summary {
            info.set_item("result", format!("{:?}", s.result))?;
            info.set_item("reason", format!("{:?}", s.reason))?;
            info.set_item("final_tick", s.final_tick)?;
            info.set_item(
                "destroyed",
                self.red.iter().map(|&i| s.agents[i].destroyed).collect::<Vec<_>>(),
            )?;
        }

        Ok((
            self.red_observations(py)?,
            PyArray1::from_vec_bound(py, rewards),
            summary.is_some(),
            info,
        ))
    }

    #[getter]
    fn obs_size(&self) -> usize {
        observation_len(self.sim.arena().boundaries().len())
    }

    /// Choices per action branch: pitch, yaw, roll, throttle, fire.
    #[getter]
    fn action_branches(&self) -> Vec<u8> {
        ACTION_BRANCHES.to_vec()
    }

    #[getter]
    fn n_agents(&self) -> usize {
        self.red.len()
    }

    #[getter]
    fn current_tick(&self) -> u64 {
        self.sim.tick()
    }
}

#[pymodule]
fn aircombat_pyenv(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<AirCombatEnv>()?;
    m.add("ACTION_SIZE", ACTION_SIZE)?;
    m.add("MAX_AGENTS", MAX_AGENTS)?;
    Ok(())
}
