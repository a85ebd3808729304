pub mod adventure;

/// Metadata about a game
#[derive(Clone, Debug)]
pub struct GameInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub author: &'static str,
}

/// Every game this binary can run. Add new entries here.
pub fn get_all_games() -> Vec<GameInfo> {
    vec![GameInfo {
        id: "adventure",
        name: "ZeroStart Adventure",
        description: "Steer the player into the obstacle to score; fixed-timestep sample",
        author: "ZeroStart Team",
    }]
}
