//! Tunable rules of an arena match.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AgentKind, Controller};

const DEFAULT_COLUMNS: u32 = 15;
const DEFAULT_ROWS: u32 = 11;
const DEFAULT_BLAST_RANGE: u32 = 3;
const DEFAULT_FUSE_TICKS: u32 = 8;
const DEFAULT_EXPLOSION_TICKS: u32 = 2;
const DEFAULT_TICKS_PER_STEP: u32 = 1;
const DEFAULT_COUNTDOWN_TICKS: u32 = 20;
const DEFAULT_STAGE_TICKS: u32 = 480;
const DEFAULT_DESTRUCTIBLE_DENSITY: f32 = 2.0 / 3.0;
const DEFAULT_SAFE_ZONE_RADIUS: u32 = 3;

/// Smallest board that still leaves room for four inset spawn corners.
const MIN_DIMENSION: u32 = 5;
/// Number of distinct spawn corners.
const MAX_AGENTS: usize = 4;

/// Describes one participant of the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Visual tag forwarded to presentation layers.
    pub kind: AgentKind,
    /// Source of the agent's intents.
    pub controller: Controller,
}

impl AgentSpec {
    /// Creates a bot-controlled participant.
    #[must_use]
    pub const fn bot(kind: AgentKind) -> Self {
        Self {
            kind,
            controller: Controller::Bot,
        }
    }

    /// Creates a human-controlled participant.
    #[must_use]
    pub const fn human(kind: AgentKind) -> Self {
        Self {
            kind,
            controller: Controller::Human,
        }
    }
}

/// Rules shared by the world and every planning system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArenaConfig {
    /// Board width in tiles, including the perimeter wall.
    pub columns: u32,
    /// Board height in tiles, including the perimeter wall.
    pub rows: u32,
    /// Maximum number of tiles a blast ray travels from the device.
    pub blast_range: u32,
    /// Ticks an armed device waits before detonating.
    pub fuse_ticks: u32,
    /// Ticks a detonating device lingers before removal.
    pub explosion_ticks: u32,
    /// Ticks an agent needs to cross one tile.
    pub ticks_per_step: u32,
    /// Ticks spent in the pre-round countdown.
    pub countdown_ticks: u32,
    /// Ticks a round lasts before the stage timer ends it.
    pub stage_ticks: u32,
    /// Share of eligible cells filled with destructible tiles.
    pub destructible_density: f32,
    /// Manhattan radius around each spawn corner kept free of destructibles.
    pub safe_zone_radius: u32,
    /// Participants in spawn order.
    pub agents: Vec<AgentSpec>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            blast_range: DEFAULT_BLAST_RANGE,
            fuse_ticks: DEFAULT_FUSE_TICKS,
            explosion_ticks: DEFAULT_EXPLOSION_TICKS,
            ticks_per_step: DEFAULT_TICKS_PER_STEP,
            countdown_ticks: DEFAULT_COUNTDOWN_TICKS,
            stage_ticks: DEFAULT_STAGE_TICKS,
            destructible_density: DEFAULT_DESTRUCTIBLE_DENSITY,
            safe_zone_radius: DEFAULT_SAFE_ZONE_RADIUS,
            agents: vec![
                AgentSpec::bot(AgentKind::Player),
                AgentSpec::bot(AgentKind::Dps),
                AgentSpec::bot(AgentKind::Healer),
                AgentSpec::bot(AgentKind::Tank),
            ],
        }
    }
}

impl ArenaConfig {
    /// Checks that the rules describe a playable arena.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns < MIN_DIMENSION || self.rows < MIN_DIMENSION {
            return Err(ConfigError::BoardTooSmall {
                columns: self.columns,
                rows: self.rows,
                minimum: MIN_DIMENSION,
            });
        }
        if i32::try_from(self.columns).is_err() || i32::try_from(self.rows).is_err() {
            return Err(ConfigError::BoardTooLarge {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if self.fuse_ticks == 0 {
            return Err(ConfigError::ZeroDuration { field: "fuse_ticks" });
        }
        if self.explosion_ticks == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "explosion_ticks",
            });
        }
        if self.ticks_per_step == 0 {
            return Err(ConfigError::ZeroDuration {
                field: "ticks_per_step",
            });
        }
        if !(0.0..=1.0).contains(&self.destructible_density) {
            return Err(ConfigError::DensityOutOfRange(self.destructible_density));
        }
        if self.agents.len() < 2 || self.agents.len() > MAX_AGENTS {
            return Err(ConfigError::AgentCount {
                count: self.agents.len(),
                maximum: MAX_AGENTS,
            });
        }
        let humans = self
            .agents
            .iter()
            .filter(|spec| spec.controller == Controller::Human)
            .count();
        if humans > 1 {
            return Err(ConfigError::MultipleHumans(humans));
        }
        Ok(())
    }
}

/// Reasons an [`ArenaConfig`] is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The board cannot hold the perimeter and four spawn corners.
    #[error("board {columns}x{rows} is smaller than the {minimum}x{minimum} minimum")]
    BoardTooSmall {
        /// Requested width.
        columns: u32,
        /// Requested height.
        rows: u32,
        /// Smallest accepted edge length.
        minimum: u32,
    },
    /// The board cannot be addressed with signed coordinates.
    #[error("board {columns}x{rows} exceeds the addressable size")]
    BoardTooLarge {
        /// Requested width.
        columns: u32,
        /// Requested height.
        rows: u32,
    },
    /// A timer that must elapse at least once was set to zero.
    #[error("`{field}` must be at least one tick")]
    ZeroDuration {
        /// Offending configuration field.
        field: &'static str,
    },
    /// The destructible density is not a share.
    #[error("destructible density {0} is outside 0.0..=1.0")]
    DensityOutOfRange(f32),
    /// The roster does not fit the spawn corners.
    #[error("arena needs between 2 and {maximum} agents, got {count}")]
    AgentCount {
        /// Number of configured agents.
        count: usize,
        /// Largest supported roster.
        maximum: usize,
    },
    /// Only one participant can be fed by the local input collaborator.
    #[error("at most one human-controlled agent is supported, got {0}")]
    MultipleHumans(usize),
    /// A fixed layout does not match the configured board size.
    #[error("layout is {actual_columns}x{actual_rows} but the config expects {columns}x{rows}")]
    LayoutMismatch {
        /// Configured width.
        columns: u32,
        /// Configured height.
        rows: u32,
        /// Width of the provided layout.
        actual_columns: u32,
        /// Height of the provided layout.
        actual_rows: u32,
    },
    /// A spawn tile is not open floor.
    #[error("spawn tile ({x}, {y}) is not empty")]
    SpawnBlocked {
        /// Spawn column.
        x: i32,
        /// Spawn row.
        y: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ArenaConfig::default().validate(), Ok(()));
    }

    #[test]
    fn zero_fuse_is_rejected() {
        let config = ArenaConfig {
            fuse_ticks: 0,
            ..ArenaConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration { field: "fuse_ticks" })
        );
    }

    #[test]
    fn roster_must_fit_spawn_corners() {
        let config = ArenaConfig {
            agents: vec![AgentSpec::bot(AgentKind::Tank); 5],
            ..ArenaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AgentCount { count: 5, .. })
        ));
    }

    #[test]
    fn second_human_is_rejected() {
        let config = ArenaConfig {
            agents: vec![
                AgentSpec::human(AgentKind::Player),
                AgentSpec::human(AgentKind::Tank),
            ],
            ..ArenaConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MultipleHumans(2)));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: ArenaConfig = toml::from_str(
            r#"
                columns = 13
                fuse_ticks = 6

                [[agents]]
                kind = "Player"
                controller = "Human"

                [[agents]]
                kind = "Tank"
                controller = "Bot"
            "#,
        )
        .expect("parse config");

        assert_eq!(config.columns, 13);
        assert_eq!(config.rows, DEFAULT_ROWS);
        assert_eq!(config.fuse_ticks, 6);
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.agents[0].controller, Controller::Human);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: Result<ArenaConfig, _> = toml::from_str("bomb_power = 9");
        assert!(parsed.is_err());
    }
}
