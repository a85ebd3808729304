use tracing::{debug, info};

use crate::core::component::{ComponentKind, Position, Render, Velocity};
use crate::core::engine::StopHandle;
use crate::core::input::{Command, Direction};
use crate::core::registry::{EntityId, EntityRegistry, RegistryError};
use crate::core::renderer::Snapshot;

/// Positions are clamped into `[0, WORLD_SIZE]` on both axes.
pub const WORLD_SIZE: f64 = 20.0;
/// Player speed in world units per second.
pub const PLAYER_SPEED: f64 = 5.0;
pub const COLLISION_DISTANCE: f64 = 1.0;
pub const COLLISION_REWARD: u32 = 10;
/// Obstacle jump per axis after a collision, wrapped by `WORLD_SIZE`.
pub const OBSTACLE_SHIFT: f64 = 5.0;

pub const PLAYER_ID: &str = "player";
pub const OBSTACLE_ID: &str = "obstacle";
pub const CONTROLS_MESSAGE: &str = "WASD to move, Q to quit";

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Quit,
    Won,
    TimeUp,
    /// The loop stopped without the session deciding it was over.
    Interrupted,
}

/// Optional end conditions on top of the quit key.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rules {
    pub target_score: Option<u32>,
    /// Limit in simulated seconds.
    pub time_limit: Option<f64>,
}

/// Player, obstacle, scoring and end conditions.
pub struct GameSession {
    name: String,
    rules: Rules,
    registry: EntityRegistry,
    score: u32,
    elapsed: f64,
    game_over: bool,
    outcome: Option<Outcome>,
    stop: Option<StopHandle>,
}

impl GameSession {
    pub fn new(name: impl Into<String>, rules: Rules) -> Self {
        let name = name.into();
        info!(name = %name, "game session created");
        Self {
            name,
            rules,
            registry: EntityRegistry::new(),
            score: 0,
            elapsed: 0.0,
            game_over: false,
            outcome: None,
            stop: None,
        }
    }

    /// Spawn the player and the obstacle.
    pub fn initialize(&mut self) -> Result<(), RegistryError> {
        self.registry
            .create(Some(PLAYER_ID.into()))?
            .with(Position::new(10.0, 10.0))
            .with(Velocity::default())
            .with(Render::sprite("player"));

        self.registry
            .create(Some(OBSTACLE_ID.into()))?
            .with(Position::new(15.0, 15.0))
            .with(Render::sprite("obstacle"));

        info!(entities = self.registry.len(), "game initialized with player and obstacle");
        Ok(())
    }

    /// Stop token of the loop driving this session; quitting or an end
    /// condition triggers it.
    pub fn attach_loop(&mut self, stop: StopHandle) {
        self.stop = Some(stop);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    /// Advance the simulation by one fixed tick.
    pub fn update(&mut self, delta: f64) {
        self.elapsed += delta;

        for entity in self.registry.query_mut(&[ComponentKind::Position, ComponentKind::Velocity]) {
            let Some(velocity) = entity.get::<Velocity>().copied() else {
                continue;
            };
            if let Some(pos) = entity.get_mut::<Position>() {
                pos.x = (pos.x + velocity.dx * delta).clamp(0.0, WORLD_SIZE);
                pos.y = (pos.y + velocity.dy * delta).clamp(0.0, WORLD_SIZE);
            }
        }

        self.check_collision();
        self.check_end_conditions();
    }

    fn check_collision(&mut self) {
        let Some(player) = self.position_of(PLAYER_ID) else {
            return;
        };
        let obstacle_id = EntityId::from(OBSTACLE_ID);
        let Some(obstacle) = self
            .registry
            .get_mut(&obstacle_id)
            .and_then(|entity| entity.get_mut::<Position>())
        else {
            return;
        };

        if player.distance(obstacle) < COLLISION_DISTANCE {
            obstacle.x = (obstacle.x + OBSTACLE_SHIFT) % WORLD_SIZE;
            obstacle.y = (obstacle.y + OBSTACLE_SHIFT) % WORLD_SIZE;
            self.score += COLLISION_REWARD;
            info!(score = self.score, x = obstacle.x, y = obstacle.y, "collision detected");
        }
    }

    fn check_end_conditions(&mut self) {
        if self.game_over {
            return;
        }
        if self.rules.target_score.is_some_and(|target| self.score >= target) {
            info!(score = self.score, "target score reached");
            self.finish(Outcome::Won);
        } else if self.rules.time_limit.is_some_and(|limit| self.elapsed >= limit) {
            info!(elapsed = self.elapsed, "time limit reached");
            self.finish(Outcome::TimeUp);
        }
    }

    fn position_of(&self, id: &str) -> Option<Position> {
        self.registry
            .get(&EntityId::from(id))
            .and_then(|entity| entity.get::<Position>())
            .copied()
    }

    /// Translate a keystroke and apply it. Unrecognized keys are ignored.
    pub fn handle_key(&mut self, key: char) -> Option<Command> {
        let command = Command::from_key(key)?;
        self.apply(command);
        Some(command)
    }

    pub fn apply(&mut self, command: Command) {
        if command == Command::Quit {
            info!("player quit the game");
            self.finish(Outcome::Quit);
            return;
        }

        let Some(velocity) = self
            .registry
            .get_mut(&EntityId::from(PLAYER_ID))
            .and_then(|player| player.get_mut::<Velocity>())
        else {
            return;
        };

        match command {
            Command::Move(Direction::Up) => velocity.dy = -PLAYER_SPEED,
            Command::Move(Direction::Down) => velocity.dy = PLAYER_SPEED,
            Command::Move(Direction::Left) => velocity.dx = -PLAYER_SPEED,
            Command::Move(Direction::Right) => velocity.dx = PLAYER_SPEED,
            Command::Stop => *velocity = Velocity::default(),
            Command::Quit => {}
        }
        debug!(?command, dx = velocity.dx, dy = velocity.dy, "player velocity changed");
    }

    /// Set the one-way game-over flag and stop the loop.
    pub fn finish(&mut self, outcome: Outcome) {
        if !self.game_over {
            self.game_over = true;
            self.outcome = Some(outcome);
        }
        if let Some(stop) = &self.stop {
            stop.stop();
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            title: Some(self.name.clone()),
            entities: self.registry.iter().collect(),
            stats: vec![
                ("Score".to_string(), self.score.to_string()),
                ("Time".to_string(), format!("{:.1}s", self.elapsed)),
                ("Entities".to_string(), self.registry.len().to_string()),
            ],
            message: Some(CONTROLS_MESSAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        let mut session = GameSession::new("test", Rules::default());
        session.initialize().unwrap();
        session
    }

    fn set_position(session: &mut GameSession, id: &str, x: f64, y: f64) {
        *session
            .registry_mut()
            .get_mut(&id.into())
            .unwrap()
            .get_mut::<Position>()
            .unwrap() = Position::new(x, y);
    }

    fn position(session: &GameSession, id: &str) -> Position {
        *session.registry().get(&id.into()).unwrap().get::<Position>().unwrap()
    }

    #[test]
    fn test_initialize_spawns_player_and_obstacle() {
        let session = session();
        assert_eq!(session.registry().len(), 2);
        assert_eq!(position(&session, PLAYER_ID), Position::new(10.0, 10.0));
        assert_eq!(position(&session, OBSTACLE_ID), Position::new(15.0, 15.0));
        let obstacle = session.registry().get(&OBSTACLE_ID.into()).unwrap();
        assert!(!obstacle.has(ComponentKind::Velocity));
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut session = session();
        assert!(matches!(session.initialize(), Err(RegistryError::DuplicateId(_))));
    }

    #[test]
    fn test_movement_integrates_velocity() {
        let mut session = session();
        session.handle_key('d');
        session.update(0.5);
        assert_eq!(position(&session, PLAYER_ID), Position::new(12.5, 10.0));
        assert_eq!(session.elapsed(), 0.5);
    }

    #[test]
    fn test_boundary_clamp() {
        let mut session = session();
        set_position(&mut session, PLAYER_ID, 19.9, 0.1);
        *session
            .registry_mut()
            .get_mut(&PLAYER_ID.into())
            .unwrap()
            .get_mut::<Velocity>()
            .unwrap() = Velocity::new(5.0, -5.0);

        session.update(1.0);

        assert_eq!(position(&session, PLAYER_ID), Position::new(20.0, 0.0));
    }

    #[test]
    fn test_collision_scores_and_relocates_obstacle() {
        let mut session = session();
        set_position(&mut session, PLAYER_ID, 10.0, 10.0);
        set_position(&mut session, OBSTACLE_ID, 10.5, 10.5);

        session.update(1.0 / 60.0);

        assert_eq!(session.score(), COLLISION_REWARD);
        assert_eq!(position(&session, OBSTACLE_ID), Position::new(15.5, 15.5));
    }

    #[test]
    fn test_obstacle_relocation_wraps() {
        let mut session = session();
        set_position(&mut session, PLAYER_ID, 18.0, 18.0);
        set_position(&mut session, OBSTACLE_ID, 18.0, 18.5);

        session.update(0.0);

        assert_eq!(position(&session, OBSTACLE_ID), Position::new(3.0, 3.5));
    }

    #[test]
    fn test_no_collision_when_far() {
        let mut session = session();
        session.update(1.0);
        assert_eq!(session.score(), 0);
        assert_eq!(position(&session, OBSTACLE_ID), Position::new(15.0, 15.0));
    }

    #[test]
    fn test_collision_skipped_without_obstacle() {
        let mut session = session();
        session.registry_mut().remove(&OBSTACLE_ID.into());
        session.update(1.0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn test_keys_set_velocity_per_axis() {
        let mut session = session();
        let velocity = |session: &GameSession| {
            *session.registry().get(&PLAYER_ID.into()).unwrap().get::<Velocity>().unwrap()
        };

        session.handle_key('W');
        session.handle_key('a');
        assert_eq!(velocity(&session), Velocity::new(-PLAYER_SPEED, -PLAYER_SPEED));

        session.handle_key('s');
        assert_eq!(velocity(&session), Velocity::new(-PLAYER_SPEED, PLAYER_SPEED));

        session.handle_key(' ');
        assert_eq!(velocity(&session), Velocity::default());

        assert_eq!(session.handle_key('x'), None);
        assert_eq!(velocity(&session), Velocity::default());
    }

    #[test]
    fn test_quit_sets_game_over_and_stops_loop() {
        let mut session = session();
        let stop = StopHandle::default();
        session.attach_loop(stop.clone());

        assert_eq!(session.handle_key('q'), Some(Command::Quit));

        assert!(session.is_game_over());
        assert_eq!(session.outcome(), Some(Outcome::Quit));
        assert!(stop.is_stopped());
    }

    #[test]
    fn test_game_over_is_one_way() {
        let mut session = session();
        session.finish(Outcome::Won);
        session.finish(Outcome::Quit);
        assert!(session.is_game_over());
        assert_eq!(session.outcome(), Some(Outcome::Won));
    }

    #[test]
    fn test_target_score_wins() {
        let mut session = GameSession::new("test", Rules { target_score: Some(10), time_limit: None });
        session.initialize().unwrap();
        set_position(&mut session, OBSTACLE_ID, 10.2, 10.0);

        session.update(0.1);

        assert_eq!(session.outcome(), Some(Outcome::Won));
    }

    #[test]
    fn test_time_limit_ends_session() {
        let mut session = GameSession::new("test", Rules { target_score: None, time_limit: Some(1.0) });
        session.initialize().unwrap();
        for _ in 0..9 {
            session.update(0.1);
        }
        assert!(!session.is_game_over());
        session.update(0.2);
        assert_eq!(session.outcome(), Some(Outcome::TimeUp));
    }

    #[test]
    fn test_snapshot_contents() {
        let mut session = session();
        session.update(1.5);
        let snapshot = session.snapshot();

        assert_eq!(snapshot.title.as_deref(), Some("test"));
        assert_eq!(snapshot.entities.len(), 2);
        assert_eq!(
            snapshot.stats,
            vec![
                ("Score".to_string(), "0".to_string()),
                ("Time".to_string(), "1.5s".to_string()),
                ("Entities".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(snapshot.message.as_deref(), Some(CONTROLS_MESSAGE));
    }
}
