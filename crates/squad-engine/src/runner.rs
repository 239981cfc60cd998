//! Headless simulation loop.

use serde::Serialize;
use squad_ai::{AgentState, World};
use tracing::{debug, info, warn};

use crate::autopilot::Autopilot;
use crate::config::EngineConfig;
use crate::timing::FixedStep;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// The player was killed
    PlayerDied,
    /// No agent is left alive
    SquadEliminated,
    /// The configured duration ran out
    TimeUp,
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// World seed
    pub seed: u64,
    /// Why the run ended
    pub outcome: Outcome,
    /// Fixed steps taken
    pub ticks: u64,
    /// Simulated seconds
    pub elapsed: f64,
    /// Agents alive at the end
    pub living_agents: usize,
    /// Player health at the end
    pub player_health: f32,
    /// Events drained over the run
    pub events: usize,
}

/// A world plus the autopilot playing it.
pub struct Simulation {
    world: World,
    autopilot: Autopilot,
    seed: u64,
    tick_rate: u32,
    fixed_dt: f32,
    max_ticks: u64,
    status_interval: f64,
    next_status: f64,
    ticks: u64,
    events: usize,
}

impl Simulation {
    /// Build the world for `seed` from a validated config.
    #[must_use]
    pub fn new(config: &EngineConfig, seed: u64) -> Self {
        let fixed_dt = config.fixed_dt();
        let max_ticks = (f64::from(config.duration_secs) * f64::from(config.tick_rate)).round() as u64;
        let status_interval = f64::from(config.status_interval);

        Self {
            world: World::new(config.sim.clone(), seed),
            autopilot: Autopilot::new(config.autopilot.clone()),
            seed,
            tick_rate: config.tick_rate,
            fixed_dt,
            max_ticks,
            status_interval,
            next_status: status_interval,
            ticks: 0,
            events: 0,
        }
    }

    /// The simulated world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Advance one fixed step: autopilot input, player, then the squad.
    pub fn step(&mut self) {
        let input = self.autopilot.decide(&self.world);
        let effects = self.world.update_player(self.fixed_dt, &input);
        if !effects.is_empty() {
            debug!(count = effects.len(), "player abilities");
        }
        self.world.update(self.fixed_dt);
        self.ticks += 1;

        for event in self.world.drain_events() {
            debug!("{event:?}");
            self.events += 1;
        }

        if self.world.elapsed() >= self.next_status {
            self.next_status += self.status_interval;
            self.log_status();
        }
    }

    /// Why the run should stop now, if it should.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.world.player().alive {
            Some(Outcome::PlayerDied)
        } else if self.world.living_agents() == 0 {
            Some(Outcome::SquadEliminated)
        } else if self.ticks >= self.max_ticks {
            Some(Outcome::TimeUp)
        } else {
            None
        }
    }

    /// Run to completion as fast as possible.
    pub fn run(&mut self) -> RunSummary {
        loop {
            if let Some(outcome) = self.outcome() {
                return self.finish(outcome);
            }
            self.step();
        }
    }

    /// Run to completion at wall-clock speed.
    pub fn run_realtime(&mut self) -> RunSummary {
        let mut clock = FixedStep::new(self.tick_rate);
        loop {
            let dt = clock.delta_time();
            for _ in 0..clock.accumulate(dt) {
                if let Some(outcome) = self.outcome() {
                    return self.finish(outcome);
                }
                self.step();
            }
            if let Some(outcome) = self.outcome() {
                return self.finish(outcome);
            }
            clock.sleep_remainder();
        }
    }

    fn log_status(&self) {
        let count = |state: AgentState| self.world.agents().iter().filter(|a| a.state == state).count();
        info!(
            elapsed = format!("{:.1}", self.world.elapsed()),
            living = self.world.living_agents(),
            patrol = count(AgentState::Patrol),
            engage = count(AgentState::Engage),
            search = count(AgentState::Search),
            retreat = count(AgentState::Retreat),
            player_health = self.world.player().health,
            "squad status"
        );
    }

    fn finish(&self, outcome: Outcome) -> RunSummary {
        let summary = RunSummary {
            seed: self.seed,
            outcome,
            ticks: self.ticks,
            elapsed: self.world.elapsed(),
            living_agents: self.world.living_agents(),
            player_health: self.world.player().health,
            events: self.events,
        };
        let dropped = self.world.events().dropped();
        if dropped > 0 {
            warn!("Event bus overflowed, {dropped} events were dropped");
        }
        info!(
            "Run finished: {:?} after {} ticks ({:.1}s simulated)",
            summary.outcome, summary.ticks, summary.elapsed
        );
        summary
    }
}
