//! The simulation world.
//!
//! Owns the arena, the player, every agent, projectiles and pickups, the
//! seeded random source and the event bus. Agents live in one contiguous
//! collection and are addressed by [`AgentId`], which is their index; dead
//! agents stay in place so ids remain stable.
//!
//! One [`World::update`] runs, in order:
//! 1. pending deaths from damage dealt outside the tick
//! 2. each agent's update, then the squad orders it raised, then deaths
//! 3. projectiles, then deaths
//! 4. pickups
//! 5. the player-death announcement

use fastrand::Rng;
use squad_common::{AgentId, Vec2};
use tracing::{debug, info};

use crate::agent::{Agent, Role};
use crate::arena::Arena;
use crate::behavior::{self, SquadView, TickContext};
use crate::combat;
use crate::config::SimConfig;
use crate::events::{EventBus, Owner, PlayerAbility, SimEvent};
use crate::fsm::{self, AgentState, HookContext};
use crate::pickup::{self, Pickup};
use crate::player::{AbilityEffect, Player, PlayerInput};
use crate::projectile::{self, Projectile};
use crate::snapshot::{AgentSnapshot, ArenaSnapshot, PlayerSnapshot, ProjectileSnapshot, WorldSnapshot};
use crate::squad::{self, SquadOrder};

/// The complete simulation state.
#[derive(Debug)]
pub struct World {
    config: SimConfig,
    arena: Arena,
    player: Player,
    agents: Vec<Agent>,
    projectiles: Vec<Projectile>,
    pickups: Vec<Pickup>,
    rng: Rng,
    events: EventBus,
    elapsed: f64,
    player_death_reported: bool,
}

impl World {
    /// Builds a populated world: player, pickups, then the squad.
    ///
    /// The config is validated (clamped) first.
    #[must_use]
    pub fn new(config: SimConfig, seed: u64) -> Self {
        let mut world = Self::bare(config, seed);

        let spawn = world.config.spawn.clone();
        for _ in 0..spawn.pickup_count {
            let position = world
                .arena
                .find_free_position(spawn.pickup_radius, &spawn, &mut world.rng);
            world.spawn_pickup(position);
        }
        world.spawn_group(spawn.agent_count as usize);

        info!(
            seed,
            agents = world.agents.len(),
            pickups = world.pickups.len(),
            "world created"
        );
        world
    }

    /// Builds a world with only the player: no agents and no pickups.
    #[must_use]
    pub fn bare(mut config: SimConfig, seed: u64) -> Self {
        config.validate();
        let arena = Arena::new(&config.map);
        let mut rng = Rng::with_seed(seed);

        let center = arena.center();
        let start = if arena.is_free(center, config.player.radius, config.spawn.margin) {
            center
        } else {
            arena.find_free_position(config.player.radius, &config.spawn, &mut rng)
        };
        let player = Player::new(start, &config.player);

        Self {
            config,
            arena,
            player,
            agents: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            rng,
            events: EventBus::default(),
            elapsed: 0.0,
            player_death_reported: false,
        }
    }

    /// Adds an agent in Patrol with its role's stats.
    pub fn spawn_agent(&mut self, role: Role, position: Vec2) -> AgentId {
        let id = AgentId::from_index(self.agents.len());
        let mut agent = Agent::new(id, role, position, self.config.roles.get(role));
        let mut hooks = HookContext {
            config: &self.config,
            arena: &self.arena,
            rng: &mut self.rng,
            events: &self.events,
        };
        fsm::enter(&mut agent, AgentState::Patrol, &mut hooks);
        debug!(agent = %id, role = role.name(), x = position.x, y = position.y, "agent spawned");
        self.agents.push(agent);
        id
    }

    /// Spawns `count` agents with random roles at free positions.
    pub fn spawn_group(&mut self, count: usize) -> Vec<AgentId> {
        (0..count)
            .map(|_| {
                let role = Role::ALL[self.rng.usize(..Role::ALL.len())];
                let radius = self.config.roles.get(role).radius;
                let position = self
                    .arena
                    .find_free_position(radius, &self.config.spawn, &mut self.rng);
                self.spawn_agent(role, position)
            })
            .collect()
    }

    /// Adds a heart pickup.
    pub fn spawn_pickup(&mut self, position: Vec2) {
        self.pickups.push(Pickup::new(position));
    }

    /// Advances every agent, projectile and pickup by `dt` seconds.
    ///
    /// Non-positive or non-finite `dt` is ignored.
    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 || !dt.is_finite() {
            return;
        }
        self.elapsed += f64::from(dt);
        self.resolve_deaths();

        let mut orders = Vec::new();
        for index in 0..self.agents.len() {
            self.update_agent_at(index, dt, &mut orders);
            self.apply_orders(&mut orders);
            self.resolve_deaths();
        }

        projectile::advance_projectiles(
            &mut self.projectiles,
            &mut self.agents,
            &mut self.player,
            &self.arena,
            dt,
            &self.events,
        );
        self.resolve_deaths();

        pickup::collect(&mut self.pickups, &mut self.player, &self.config.spawn, &self.events);
        self.announce_player_death();
    }

    fn update_agent_at(&mut self, index: usize, dt: f32, orders: &mut Vec<SquadOrder>) {
        let Self {
            config,
            arena,
            player,
            agents,
            projectiles,
            rng,
            events,
            ..
        } = self;
        let (before, rest) = agents.split_at_mut(index);
        let Some((agent, after)) = rest.split_first_mut() else {
            return;
        };
        let mut ctx = TickContext {
            config,
            arena,
            player,
            squad: SquadView::new(before, after),
            projectiles,
            rng,
            events,
            orders,
        };
        behavior::update_agent(agent, dt, &mut ctx);
    }

    fn apply_orders(&mut self, orders: &mut Vec<SquadOrder>) {
        for order in orders.drain(..) {
            match order {
                SquadOrder::AlertEngage { spotter } => {
                    self.alert_engage(spotter);
                },
                SquadOrder::Heal {
                    healer,
                    target,
                    amount,
                } => {
                    let ceiling = self.config.combat.heal_ceiling;
                    let healed = squad::apply_heal(&mut self.agents, healer, target, amount, ceiling, &self.events);
                    debug!(healer = %healer, target = %target, healed, "heal");
                },
            }
        }
    }

    /// Moves every agent that died since the last check into Dead and
    /// sends the rest of the squad into Retreat. Returns the number of deaths.
    fn resolve_deaths(&mut self) -> usize {
        let mut deaths = 0;
        for index in 0..self.agents.len() {
            if !self.agents[index].death_pending() {
                continue;
            }
            let mut hooks = HookContext {
                config: &self.config,
                arena: &self.arena,
                rng: &mut self.rng,
                events: &self.events,
            };
            let agent = &mut self.agents[index];
            let id = agent.id;
            fsm::change_state(agent, AgentState::Dead, &mut hooks);
            info!(agent = %id, role = agent.role.name(), "agent died");
            hooks.events.publish(SimEvent::AgentDied { agent: id });
            squad::broadcast_retreat(&mut self.agents, Some(id), &mut hooks);
            deaths += 1;
        }
        deaths
    }

    fn announce_player_death(&mut self) {
        if self.player.alive || self.player_death_reported {
            return;
        }
        self.player_death_reported = true;
        info!(elapsed = self.elapsed, "player died");
        self.events.publish(SimEvent::PlayerDied);
    }

    /// Advances the player and applies the abilities it fired.
    pub fn update_player(&mut self, dt: f32, input: &PlayerInput) -> Vec<AbilityEffect> {
        if dt <= 0.0 || !dt.is_finite() {
            return Vec::new();
        }
        let effects = self
            .player
            .update(dt, input, &self.config.player, &self.arena);

        for effect in &effects {
            match *effect {
                AbilityEffect::Dash { .. } => {
                    self.events.publish(SimEvent::AbilityUsed {
                        ability: PlayerAbility::Dash,
                    });
                },
                AbilityEffect::Stun { center } => {
                    let mut hooks = HookContext {
                        config: &self.config,
                        arena: &self.arena,
                        rng: &mut self.rng,
                        events: &self.events,
                    };
                    let hit = combat::stun_burst(&mut self.agents, center, &self.config.player, &mut hooks);
                    debug!(hit, "stun burst");
                    self.events.publish(SimEvent::AbilityUsed {
                        ability: PlayerAbility::Stun,
                    });
                },
                AbilityEffect::Shoot { origin, velocity } => {
                    let player = &self.config.player;
                    self.projectiles.push(Projectile::new(
                        origin,
                        velocity,
                        player.projectile_damage,
                        Owner::Player,
                        player.projectile_ttl,
                    ));
                    self.events.publish(SimEvent::ProjectileFired {
                        owner: Owner::Player,
                        position: origin,
                    });
                    self.events.publish(SimEvent::AbilityUsed {
                        ability: PlayerAbility::Shoot,
                    });
                },
            }
        }

        self.resolve_deaths();
        effects
    }

    /// Propagates `spotter`'s sighting to nearby agents. Returns how many joined.
    pub fn alert_engage(&mut self, spotter: AgentId) -> usize {
        let mut hooks = HookContext {
            config: &self.config,
            arena: &self.arena,
            rng: &mut self.rng,
            events: &self.events,
        };
        squad::alert_engage(
            &mut self.agents,
            spotter,
            self.player.position(),
            self.config.squad.broadcast_radius,
            &mut hooks,
        )
    }

    /// Forces every live agent into Retreat.
    pub fn broadcast_retreat(&mut self) -> usize {
        let mut hooks = HookContext {
            config: &self.config,
            arena: &self.arena,
            rng: &mut self.rng,
            events: &self.events,
        };
        squad::broadcast_retreat(&mut self.agents, None, &mut hooks)
    }

    /// Damages an agent and resolves its death right away.
    ///
    /// Returns true if this blow killed it; unknown ids are ignored.
    pub fn damage_agent(&mut self, id: AgentId, amount: f32) -> bool {
        let fatal = self
            .agents
            .get_mut(id.index())
            .is_some_and(|agent| agent.apply_damage(amount));
        if fatal {
            self.resolve_deaths();
        }
        fatal
    }

    /// Agent by id.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    /// Mutable agent by id, for shells and tests that script agents directly.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.index())
    }

    /// Every agent, dead ones included.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Number of live agents.
    #[must_use]
    pub fn living_agents(&self) -> usize {
        self.agents.iter().filter(|a| a.alive).count()
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable player.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Projectiles in flight.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Remaining pickups.
    #[must_use]
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Level geometry.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Validated configuration.
    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Event bus, for shells that forward events elsewhere.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Takes every event published since the last drain.
    pub fn drain_events(&self) -> Vec<SimEvent> {
        self.events.drain()
    }

    /// Simulated seconds since construction.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Captures the current state.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            elapsed: self.elapsed,
            arena: ArenaSnapshot::from(&self.arena),
            player: PlayerSnapshot::from(&self.player),
            agents: self.agents.iter().map(AgentSnapshot::from).collect(),
            projectiles: self.projectiles.iter().map(ProjectileSnapshot::from).collect(),
            pickups: self.pickups.iter().map(|p| p.position).collect(),
        }
    }
}
