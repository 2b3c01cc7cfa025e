//! Fixed timestep match simulation
//!
//! `MatchSim` owns the authoritative offline `MatchState` together with the
//! simulation-only bookkeeping (latest inputs, jump contexts, shot debounce,
//! clock carry) and advances it one tick at a time.

use std::collections::BTreeMap;

use glam::DVec3;

use super::arena;
use super::ball::update_ball;
use super::car::update_car;
use super::collision::{clamp_ball_bounds, clamp_car_bounds, resolve_car_ball};
use super::input::{BotController, ControlInput, InputSource};
use super::jump::JumpContext;
use super::state::{BallState, CarState, EventKind, MatchEvent, MatchState, Rotator, Team};
use crate::consts::*;

/// Initial roster entry for a new match
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSpawn {
    pub player_id: String,
    pub display_name: String,
    pub team: Team,
}

impl PlayerSpawn {
    pub fn new(player_id: impl Into<String>, display_name: impl Into<String>, team: Team) -> Self {
        Self {
            player_id: player_id.into(),
            display_name: display_name.into(),
            team,
        }
    }
}

/// Deterministic match simulation
#[derive(Debug, Clone)]
pub struct MatchSim {
    state: MatchState,
    inputs: BTreeMap<String, ControlInput>,
    jumps: BTreeMap<String, JumpContext>,
    bot: BotController,
    /// Simulation milliseconds since the match started
    elapsed_ms: i64,
    /// Sub-millisecond remainder not yet taken off the clock
    clock_carry_ms: f64,
    last_shot_ms: BTreeMap<Team, i64>,
    finished: bool,
}

impl MatchSim {
    /// Create a match at kickoff
    ///
    /// Cars are placed per team in player-id order; the opening kickoff
    /// event is tagged orange.
    pub fn new(match_id: impl Into<String>, duration_ms: i64, spawns: &[PlayerSpawn]) -> Self {
        let mut state = MatchState::new(match_id, duration_ms);
        for spawn in spawns {
            let car = CarState::at_kickoff(
                spawn.player_id.clone(),
                spawn.display_name.clone(),
                spawn.team,
                false,
                0,
            );
            state.cars.insert(spawn.player_id.clone(), car);
        }

        let mut sim = Self {
            state,
            inputs: BTreeMap::new(),
            jumps: BTreeMap::new(),
            bot: BotController,
            elapsed_ms: 0,
            clock_carry_ms: 0.0,
            last_shot_ms: BTreeMap::new(),
            finished: false,
        };
        sim.place_kickoff();
        sim.push_event(MatchEvent::new(EventKind::Kickoff, Some(Team::Orange), 0));

        log::info!(
            "Match {} created: {} cars, {} ms on the clock",
            sim.state.match_id,
            sim.state.cars.len(),
            sim.state.score.time_remaining_ms
        );
        sim
    }

    /// Live state (read-only)
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Deep copy of the current state for publication
    pub fn snapshot(&self) -> MatchState {
        self.state.clone()
    }

    pub fn jump_context(&self, player_id: &str) -> Option<&JumpContext> {
        self.jumps.get(player_id)
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.elapsed_ms
    }

    /// Store the latest control input for a car
    ///
    /// Inputs for unknown cars are dropped.
    pub fn apply_input(&mut self, player_id: &str, input: ControlInput) {
        if !self.state.cars.contains_key(player_id) {
            log::debug!("Dropping input for unknown car {}", player_id);
            return;
        }
        self.inputs.insert(player_id.to_string(), input.sanitized());
    }

    /// Put the ball somewhere specific (drills, replays, tests)
    pub fn place_ball(&mut self, position: DVec3, velocity: DVec3) {
        self.state.ball.position = position;
        self.state.ball.velocity = velocity;
    }

    /// Advance the match by one fixed step
    ///
    /// Does nothing once the match is over.
    pub fn tick(&mut self, dt: f64) {
        if self.state.is_over() {
            return;
        }

        self.state.tick += 1;
        self.state.events.clear();
        self.compute_bot_inputs();
        self.run_clock(dt);

        for (id, car) in self.state.cars.iter_mut() {
            let input = self.inputs.get(id).copied().unwrap_or_default();
            let jump = self.jumps.entry(id.clone()).or_default();
            update_car(car, &input, jump, dt);
            clamp_car_bounds(car);
        }

        update_ball(&mut self.state.ball, dt);
        clamp_ball_bounds(&mut self.state.ball);
        for car in self.state.cars.values_mut() {
            resolve_car_ball(car, &mut self.state.ball);
        }

        self.detect_shot_on_goal();
        self.detect_goal();

        if self.state.is_over() && !self.finished {
            self.finished = true;
            log::info!(
                "Match {} over: orange {} - blue {} ({} wins)",
                self.state.match_id,
                self.state.score.orange,
                self.state.score.blue,
                self.state.winner().map(|t| t.as_str()).unwrap_or("nobody")
            );
        }
    }

    /// Reset ball and cars to kickoff and emit a kickoff event for `team`
    pub fn reset_kickoff(&mut self, team: Team) {
        self.place_kickoff();
        self.push_event(MatchEvent::new(EventKind::Kickoff, Some(team), self.elapsed_ms));
        log::debug!("Kickoff ({})", team.as_str());
    }

    /// Add a human player if missing and return their team
    ///
    /// New players join the team with fewer humans (orange on a tie) at the
    /// next free kickoff slot. Re-joining refreshes the display name.
    pub fn ensure_player(&mut self, player_id: &str, display_name: &str) -> Team {
        if let Some(car) = self.state.cars.get_mut(player_id) {
            if !display_name.is_empty() {
                car.display_name = display_name.to_string();
            }
            car.is_bot = false;
            let team = car.team;
            self.jumps.entry(player_id.to_string()).or_default();
            return team;
        }

        let humans_on = |team: Team| {
            self.state
                .cars
                .values()
                .filter(|c| !c.is_bot && c.team == team)
                .count()
        };
        let team = if humans_on(Team::Orange) > humans_on(Team::Blue) {
            Team::Blue
        } else {
            Team::Orange
        };

        self.add_car(CarState::at_kickoff(
            player_id,
            display_name,
            team,
            false,
            self.team_size(team),
        ));
        log::info!("Player {} joined {}", player_id, team.as_str());
        team
    }

    /// Make sure `player_id` has an opponent
    ///
    /// Adds a bot under `bot_id` to the opposing team when that team has no
    /// humans and no bot yet. Returns the opposing bot's id if one exists
    /// afterwards.
    pub fn ensure_bot_opponent(&mut self, player_id: &str, bot_id: &str) -> Option<String> {
        let opponent = self.state.car(player_id)?.team.opponent();

        let mut existing_bot = None;
        for car in self.state.cars.values().filter(|c| c.team == opponent) {
            if !car.is_bot {
                return None;
            }
            existing_bot.get_or_insert_with(|| car.player_id.clone());
        }
        if existing_bot.is_some() {
            return existing_bot;
        }

        self.add_car(CarState::at_kickoff(
            bot_id,
            BOT_DISPLAY_NAME,
            opponent,
            true,
            self.team_size(opponent),
        ));
        log::info!("Bot {} joined {}", bot_id, opponent.as_str());
        Some(bot_id.to_string())
    }

    /// Drop every bot car
    pub fn remove_all_bots(&mut self) {
        let bots: Vec<String> = self
            .state
            .cars
            .values()
            .filter(|c| c.is_bot)
            .map(|c| c.player_id.clone())
            .collect();
        for id in bots {
            self.remove_player(&id);
        }
    }

    /// Remove a car and its bookkeeping. Returns false if it was not present.
    pub fn remove_player(&mut self, player_id: &str) -> bool {
        let Some(car) = self.state.cars.remove(player_id) else {
            return false;
        };
        self.inputs.remove(player_id);
        self.jumps.remove(player_id);
        self.push_event(
            MatchEvent::new(EventKind::PlayerLeave, Some(car.team), self.elapsed_ms).with_player(player_id),
        );
        log::info!("{} {} left", if car.is_bot { "Bot" } else { "Player" }, player_id);
        true
    }

    pub fn human_count(&self) -> usize {
        self.state.cars.values().filter(|c| !c.is_bot).count()
    }

    /// First human car in id order
    pub fn first_human_id(&self) -> Option<&str> {
        self.state
            .cars
            .values()
            .find(|c| !c.is_bot)
            .map(|c| c.player_id.as_str())
    }

    fn team_size(&self, team: Team) -> usize {
        self.state.cars.values().filter(|c| c.team == team).count()
    }

    fn add_car(&mut self, car: CarState) {
        let id = car.player_id.clone();
        let team = car.team;
        self.state.cars.insert(id.clone(), car);
        self.jumps.insert(id.clone(), JumpContext::new());
        self.push_event(MatchEvent::new(EventKind::PlayerJoin, Some(team), self.elapsed_ms).with_player(id));
    }

    fn push_event(&mut self, event: MatchEvent) {
        self.state.events.push(event);
    }

    /// Ball to center, every car to its team's slot, all jump state cleared
    fn place_kickoff(&mut self) {
        self.state.ball = BallState::default();

        let mut slots: BTreeMap<Team, usize> = BTreeMap::new();
        for (id, car) in self.state.cars.iter_mut() {
            let slot = slots.entry(car.team).or_insert(0);
            let (position, yaw) = arena::kickoff_spawn(car.team, *slot);
            *slot += 1;

            car.position = position;
            car.velocity = DVec3::ZERO;
            car.rotation = Rotator::from_yaw(yaw);
            car.boost = BOOST_MAX;
            car.is_grounded = true;
            self.jumps.insert(id.clone(), JumpContext::new());
        }
    }

    fn compute_bot_inputs(&mut self) {
        let bots: Vec<String> = self
            .state
            .cars
            .values()
            .filter(|c| c.is_bot)
            .map(|c| c.player_id.clone())
            .collect();
        for id in bots {
            let input = self.bot.control_for(&id, &self.state);
            self.inputs.insert(id, input);
        }
    }

    fn run_clock(&mut self, dt: f64) {
        self.clock_carry_ms += dt.max(0.0) * 1000.0;
        let whole = self.clock_carry_ms.floor();
        self.clock_carry_ms -= whole;

        let elapsed = whole as i64;
        self.elapsed_ms += elapsed;
        self.state.score.run_clock(elapsed);
    }

    fn detect_shot_on_goal(&mut self) {
        let ball = &self.state.ball;
        if ball.position.y.abs() > GOAL_WIDTH * SHOT_WIDTH_FRACTION {
            return;
        }

        let zone = ARENA_LENGTH * SHOT_ZONE_FRACTION;
        let shooter = if ball.position.x > zone && ball.velocity.x > SHOT_MIN_SPEED {
            Some(Team::Orange)
        } else if ball.position.x < -zone && ball.velocity.x < -SHOT_MIN_SPEED {
            Some(Team::Blue)
        } else {
            None
        };
        let Some(team) = shooter else {
            return;
        };

        let now = self.elapsed_ms;
        if let Some(&last) = self.last_shot_ms.get(&team) {
            if now - last < SHOT_DEBOUNCE_MS {
                return;
            }
        }
        self.last_shot_ms.insert(team, now);
        self.push_event(MatchEvent::new(EventKind::ShotOnGoal, Some(team), now));
    }

    fn detect_goal(&mut self) {
        let Some(team) = arena::scoring_team(self.state.ball.position) else {
            return;
        };

        self.state.score.credit(team);
        self.push_event(MatchEvent::new(EventKind::Goal, Some(team), self.elapsed_ms));
        log::info!(
            "Goal {}: orange {} - blue {}",
            team.as_str(),
            self.state.score.orange,
            self.state.score.blue
        );
        self.reset_kickoff(team);
    }
}
