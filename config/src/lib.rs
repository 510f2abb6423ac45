#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Load-time balance tables for the Merge Defence simulation.
//!
//! The tables are read once at startup and never mutated afterwards. A
//! complete default table ships inside the crate; alternatives are parsed from
//! TOML and validated before a simulation may be built from them. Missing
//! archetypes, grades or sections surface as parse errors, so a validated
//! [`GameConfig`] always carries a stat block for every archetype and grade.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use merge_defence_core::{serde_seconds, EnemyKind, Grade, UnitKind, UnitStats};
use serde::Deserialize;
use thiserror::Error;

/// Raw TOML source of the built-in balance table.
pub const BUILTIN_CONFIG: &str = include_str!("../data/default.toml");

/// Allowed deviation of the summon weights from a total of one.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Failures raised while loading or validating a configuration table.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML source could not be parsed into the expected shape.
    #[error("failed to parse game config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration file could not be read.
    #[error("failed to read game config from {path:?}: {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// The wave list is empty.
    #[error("game config defines no waves")]
    NoWaves,
    /// A wave spawns no enemies.
    #[error("wave {wave} spawns no enemies")]
    EmptyWave {
        /// One-based wave number.
        wave: usize,
    },
    /// A spawn group declares enemies with zero health.
    #[error("wave {wave} declares enemies without health")]
    ZeroHealth {
        /// One-based wave number.
        wave: usize,
    },
    /// A summon weight is negative or not finite.
    #[error("summon weight for {grade:?} must be a finite non-negative number")]
    InvalidWeight {
        /// Grade carrying the offending weight.
        grade: Grade,
    },
    /// The summon weights do not add up to one.
    #[error("summon weights sum to {sum}, expected 1")]
    WeightSum {
        /// Observed total.
        sum: f64,
    },
    /// A value that must be strictly positive is zero, negative or not finite.
    #[error("{field} must be positive")]
    NonPositive {
        /// Dotted path of the offending field.
        field: String,
    },
    /// A value that must lie in `[0, 1]` is outside that range.
    #[error("{field} must lie between 0 and 1")]
    OutOfUnitRange {
        /// Dotted path of the offending field.
        field: String,
    },
    /// The map cannot hold a single placement cell or path row.
    #[error("map of {width}x{height} cannot hold a grid of {cell_size} cells")]
    MapTooSmall {
        /// Map width.
        width: f32,
        /// Map height.
        height: f32,
        /// Cell edge length.
        cell_size: f32,
    },
}

/// Root configuration table.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameConfig {
    /// Seed for the deterministic random number generator.
    pub seed: u64,
    /// Currency costs and rewards.
    pub economy: EconomyConfig,
    /// Player lives.
    pub player: PlayerConfig,
    /// Spawn and preparation timing shared by all waves.
    pub wave: WaveTiming,
    /// Ordered wave definitions.
    pub waves: Vec<WaveDefinition>,
    /// Enemy archetype table.
    pub enemies: EnemyTable,
    /// Unit stat blocks by archetype and grade.
    pub units: UnitTable,
    /// Summon roll parameters.
    pub summon: SummonConfig,
    /// Fixed combat constants.
    pub combat: CombatConstants,
    /// Map geometry.
    pub map: MapConfig,
}

impl GameConfig {
    /// Parses and validates the built-in balance table.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    /// Parses and validates a configuration from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }

    /// Checks the integrity rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waves.is_empty() {
            return Err(ConfigError::NoWaves);
        }
        for (index, wave) in self.waves.iter().enumerate() {
            let number = index + 1;
            if wave.enemy_count() == 0 {
                return Err(ConfigError::EmptyWave { wave: number });
            }
            if wave.groups.iter().any(|group| group.count > 0 && group.hp == 0) {
                return Err(ConfigError::ZeroHealth { wave: number });
            }
        }

        self.summon.grade_weights.validate()?;

        require_positive("wave.spawn_interval", self.wave.spawn_interval.as_secs_f32())?;
        require_positive("enemies.base_speed", self.enemies.base_speed)?;
        for kind in EnemyKind::ALL {
            require_positive(
                &format!("enemies.{}.speed_multiplier", enemy_key(kind)),
                self.enemies.stats(kind).speed_multiplier,
            )?;
        }

        for kind in UnitKind::ALL {
            for grade in Grade::ALL {
                let stats = self.units.stats(kind, grade);
                let prefix = format!("units.{}.{}", unit_key(kind), grade_key(grade));
                require_positive(
                    &format!("{prefix}.attack_interval"),
                    stats.attack_interval.as_secs_f32(),
                )?;
                require_positive(&format!("{prefix}.range"), stats.range)?;
                validate_abilities(&prefix, stats)?;
            }
        }

        self.combat.validate()?;
        self.map.validate()
    }
}

fn validate_abilities(prefix: &str, stats: &UnitStats) -> Result<(), ConfigError> {
    if let Some(crit) = stats.abilities.crit() {
        require_unit_range(&format!("{prefix}.critChance.chance"), crit.chance)?;
        require_positive(&format!("{prefix}.critChance.multiplier"), crit.multiplier)?;
    }
    if let Some(slow) = stats.abilities.slow() {
        require_unit_range(&format!("{prefix}.slow.percent"), slow.percent)?;
    }
    if let Some(reduce) = stats.abilities.armor_reduce() {
        require_unit_range(&format!("{prefix}.armorReduce.percent"), reduce.percent)?;
    }
    if let Some(dot) = stats.abilities.dot() {
        require_positive(&format!("{prefix}.dot.interval"), dot.interval.as_secs_f32())?;
    }
    if let Some(freeze) = stats.abilities.freeze() {
        require_positive(
            &format!("{prefix}.freeze.interval"),
            freeze.interval.as_secs_f32(),
        )?;
    }
    Ok(())
}

fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field: field.to_owned(),
        })
    }
}

fn require_unit_range(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange {
            field: field.to_owned(),
        })
    }
}

fn enemy_key(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Normal => "normal",
        EnemyKind::Fast => "fast",
        EnemyKind::Tank => "tank",
        EnemyKind::Flying => "flying",
        EnemyKind::Boss => "boss",
    }
}

fn unit_key(kind: UnitKind) -> &'static str {
    match kind {
        UnitKind::Warrior => "warrior",
        UnitKind::Archer => "archer",
        UnitKind::Mage => "mage",
        UnitKind::Supporter => "supporter",
        UnitKind::Special => "special",
    }
}

fn grade_key(grade: Grade) -> &'static str {
    match grade {
        Grade::Common => "common",
        Grade::Rare => "rare",
        Grade::Epic => "epic",
        Grade::Legend => "legend",
        Grade::Mythic => "mythic",
    }
}

/// Currency costs and rewards.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EconomyConfig {
    /// Gold available when the session starts.
    pub starting_gold: u32,
    /// Price of a single summon.
    pub summon_cost: u32,
    /// Gold refunded when a unit is sold.
    pub sell_return: u32,
    /// Gold granted for skipping a preparation delay.
    pub wave_skip_bonus: u32,
    /// Reward used for archetypes missing from the kill reward table.
    #[serde(default = "default_kill_reward")]
    pub default_kill_reward: u32,
    /// Per-archetype kill rewards.
    #[serde(default)]
    pub kill_reward: KillRewards,
}

fn default_kill_reward() -> u32 {
    5
}

impl EconomyConfig {
    /// Gold earned for killing an enemy of the provided kind.
    #[must_use]
    pub fn kill_reward(&self, kind: EnemyKind) -> u32 {
        self.kill_reward
            .get(kind)
            .unwrap_or(self.default_kill_reward)
    }
}

/// Optional per-archetype kill rewards.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KillRewards {
    /// Reward for normal enemies.
    pub normal: Option<u32>,
    /// Reward for fast enemies.
    pub fast: Option<u32>,
    /// Reward for tanks.
    pub tank: Option<u32>,
    /// Reward for flyers.
    pub flying: Option<u32>,
    /// Reward for bosses.
    pub boss: Option<u32>,
}

impl KillRewards {
    /// Configured reward for the provided kind, if any.
    #[must_use]
    pub fn get(&self, kind: EnemyKind) -> Option<u32> {
        match kind {
            EnemyKind::Normal => self.normal,
            EnemyKind::Fast => self.fast,
            EnemyKind::Tank => self.tank,
            EnemyKind::Flying => self.flying,
            EnemyKind::Boss => self.boss,
        }
    }
}

/// Player life settings.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerConfig {
    /// Lives available when the session starts.
    pub starting_lives: u32,
    /// Lives lost when a boss leaks.
    pub boss_life_damage: u32,
}

/// Timing shared by every wave.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveTiming {
    /// Delay between consecutive spawns.
    #[serde(with = "serde_seconds")]
    pub spawn_interval: Duration,
    /// Delay between a wave clear and the next wave.
    #[serde(with = "serde_seconds")]
    pub prepare_time: Duration,
}

/// A single wave: spawn groups plus the clear reward.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveDefinition {
    /// Gold granted when the wave is cleared.
    pub reward: u32,
    /// Spawn groups expanded into individual enemies.
    pub groups: Vec<SpawnGroup>,
}

impl WaveDefinition {
    /// Total number of enemies the wave spawns.
    #[must_use]
    pub fn enemy_count(&self) -> u32 {
        self.groups.iter().map(|group| group.count).sum()
    }
}

/// Group of identical enemies within a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpawnGroup {
    /// Archetype of every enemy in the group.
    pub kind: EnemyKind,
    /// Number of enemies.
    pub count: u32,
    /// Health of each enemy.
    pub hp: u32,
}

/// Movement and armour traits of an enemy archetype.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnemyStats {
    /// Multiplier applied to the shared base speed.
    pub speed_multiplier: f32,
    /// Flat damage reduction.
    pub armor: u32,
}

/// Enemy archetype table.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnemyTable {
    /// Shared movement speed in world units per second.
    pub base_speed: f32,
    /// Normal enemies.
    pub normal: EnemyStats,
    /// Fast enemies.
    pub fast: EnemyStats,
    /// Tanks.
    pub tank: EnemyStats,
    /// Flyers.
    pub flying: EnemyStats,
    /// Bosses.
    pub boss: EnemyStats,
}

impl EnemyTable {
    /// Stats of the provided archetype.
    #[must_use]
    pub fn stats(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Normal => &self.normal,
            EnemyKind::Fast => &self.fast,
            EnemyKind::Tank => &self.tank,
            EnemyKind::Flying => &self.flying,
            EnemyKind::Boss => &self.boss,
        }
    }
}

/// Stat blocks of a single archetype, one per grade.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradeTable {
    /// Common stats.
    pub common: UnitStats,
    /// Rare stats.
    pub rare: UnitStats,
    /// Epic stats.
    pub epic: UnitStats,
    /// Legend stats.
    pub legend: UnitStats,
    /// Mythic stats.
    pub mythic: UnitStats,
}

impl GradeTable {
    /// Stat block for the provided grade.
    #[must_use]
    pub fn get(&self, grade: Grade) -> &UnitStats {
        match grade {
            Grade::Common => &self.common,
            Grade::Rare => &self.rare,
            Grade::Epic => &self.epic,
            Grade::Legend => &self.legend,
            Grade::Mythic => &self.mythic,
        }
    }
}

/// Unit stat blocks by archetype.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitTable {
    /// Warrior grades.
    pub warrior: GradeTable,
    /// Archer grades.
    pub archer: GradeTable,
    /// Mage grades.
    pub mage: GradeTable,
    /// Supporter grades.
    pub supporter: GradeTable,
    /// Special grades.
    pub special: GradeTable,
}

impl UnitTable {
    /// Stat block for the provided archetype and grade.
    #[must_use]
    pub fn stats(&self, kind: UnitKind, grade: Grade) -> &UnitStats {
        let table = match kind {
            UnitKind::Warrior => &self.warrior,
            UnitKind::Archer => &self.archer,
            UnitKind::Mage => &self.mage,
            UnitKind::Supporter => &self.supporter,
            UnitKind::Special => &self.special,
        };
        table.get(grade)
    }
}

/// Summon roll parameters.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummonConfig {
    /// Probability of each grade.
    pub grade_weights: GradeWeights,
}

/// Probability table used to sample summon grades.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradeWeights {
    /// Probability of a common summon.
    pub common: f64,
    /// Probability of a rare summon.
    pub rare: f64,
    /// Probability of an epic summon.
    pub epic: f64,
    /// Probability of a legend summon.
    pub legend: f64,
    /// Probability of a mythic summon.
    pub mythic: f64,
}

impl GradeWeights {
    /// Weight of the provided grade.
    #[must_use]
    pub fn weight(&self, grade: Grade) -> f64 {
        match grade {
            Grade::Common => self.common,
            Grade::Rare => self.rare,
            Grade::Epic => self.epic,
            Grade::Legend => self.legend,
            Grade::Mythic => self.mythic,
        }
    }

    /// Sum of every weight.
    #[must_use]
    pub fn total(&self) -> f64 {
        Grade::ALL.iter().map(|grade| self.weight(*grade)).sum()
    }

    /// Ensures each weight is finite and non-negative and that they sum to one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for grade in Grade::ALL {
            let weight = self.weight(grade);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { grade });
            }
        }
        let sum = self.total();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

/// Fixed numeric constants of the combat model.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CombatConstants {
    /// Delay between consecutive multishot arrows.
    #[serde(with = "serde_seconds")]
    pub multishot_spacing: Duration,
    /// Damage ratio of multishot arrows relative to the primary shot.
    pub multishot_damage_ratio: f32,
    /// Radius around a pierced hit that receives propagated damage.
    pub pierce_radius: f32,
    /// Damage ratio of mage splash relative to the bolt.
    pub mage_splash_ratio: f32,
    /// Radius of mage splash around the hit point.
    pub mage_splash_radius: f32,
    /// Damage ratio of melee splash relative to the critical strike.
    pub melee_splash_ratio: f32,
    /// Distance at which a projectile counts as having hit its target.
    pub hit_radius: f32,
    /// Travel speeds of ranged archetypes.
    pub projectile_speed: ProjectileSpeeds,
}

impl CombatConstants {
    fn validate(&self) -> Result<(), ConfigError> {
        require_unit_range(
            "combat.multishot_damage_ratio",
            self.multishot_damage_ratio,
        )?;
        require_unit_range("combat.mage_splash_ratio", self.mage_splash_ratio)?;
        require_unit_range("combat.melee_splash_ratio", self.melee_splash_ratio)?;
        require_positive("combat.pierce_radius", self.pierce_radius)?;
        require_positive("combat.mage_splash_radius", self.mage_splash_radius)?;
        require_positive("combat.hit_radius", self.hit_radius)?;
        for kind in UnitKind::ALL {
            if let Some(speed) = self.projectile_speed.get(kind) {
                require_positive(
                    &format!("combat.projectile_speed.{}", unit_key(kind)),
                    speed,
                )?;
            }
        }
        Ok(())
    }
}

/// Travel speeds of ranged archetypes in world units per second.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectileSpeeds {
    /// Arrow speed.
    pub archer: f32,
    /// Bolt speed.
    pub mage: f32,
    /// Supporter shot speed.
    pub supporter: f32,
    /// Special shot speed.
    pub special: f32,
}

impl ProjectileSpeeds {
    /// Projectile speed of the archetype, or `None` for melee archetypes.
    #[must_use]
    pub fn get(&self, kind: UnitKind) -> Option<f32> {
        match kind {
            UnitKind::Warrior => None,
            UnitKind::Archer => Some(self.archer),
            UnitKind::Mage => Some(self.mage),
            UnitKind::Supporter => Some(self.supporter),
            UnitKind::Special => Some(self.special),
        }
    }
}

/// Geometry of the play field.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapConfig {
    /// Left edge of the map.
    pub x: f32,
    /// Top edge of the map.
    pub y: f32,
    /// Map width.
    pub width: f32,
    /// Map height.
    pub height: f32,
    /// Edge length of a placement cell.
    pub cell_size: f32,
    /// Number of horizontal passes of the path.
    pub path_rows: u32,
    /// Horizontal inset of the path from the map edges.
    pub path_margin: f32,
    /// Half of the path's width used when blocking cells.
    pub path_half_width: f32,
}

impl MapConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        require_positive("map.width", self.width)?;
        require_positive("map.height", self.height)?;
        require_positive("map.cell_size", self.cell_size)?;
        if self.path_half_width < 0.0 || !self.path_half_width.is_finite() {
            return Err(ConfigError::NonPositive {
                field: "map.path_half_width".to_owned(),
            });
        }
        let fits = self.width >= self.cell_size
            && self.height >= self.cell_size
            && self.path_rows > 0
            && self.width > 2.0 * self.path_margin;
        if fits {
            Ok(())
        } else {
            Err(ConfigError::MapTooSmall {
                width: self.width,
                height: self.height,
                cell_size: self.cell_size,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses_and_validates() {
        let config = GameConfig::builtin().expect("builtin config");
        assert_eq!(config.total_waves(), 10);
        assert_eq!(config.economy.starting_gold, 100);
        assert!((config.wave.spawn_interval.as_secs_f64() - 0.8).abs() < 1e-9);
        assert!((config.summon.grade_weights.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn every_archetype_and_grade_has_stats() {
        let config = GameConfig::builtin().expect("builtin config");
        for kind in UnitKind::ALL {
            for grade in Grade::ALL {
                let stats = config.units.stats(kind, grade);
                assert!(stats.attack > 0, "{kind:?} {grade:?}");
                assert!(stats.range > 0.0);
            }
        }
    }

    #[test]
    fn abilities_deserialize_from_tagged_records() {
        let config = GameConfig::builtin().expect("builtin config");
        let mythic_special = config.units.stats(UnitKind::Special, Grade::Mythic);
        let freeze = mythic_special.abilities.freeze().expect("freeze ability");
        assert_eq!(freeze.interval, Duration::from_secs(5));
        assert_eq!(freeze.duration, Duration::from_millis(1_500));

        let mythic_supporter = config.units.stats(UnitKind::Supporter, Grade::Mythic);
        assert!((mythic_supporter.abilities.global_attack_buff() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn kill_reward_falls_back_to_default() {
        let mut config = GameConfig::builtin().expect("builtin config");
        config.economy.kill_reward.tank = None;
        config.economy.default_kill_reward = 5;
        assert_eq!(config.economy.kill_reward(EnemyKind::Tank), 5);
        assert_eq!(config.economy.kill_reward(EnemyKind::Boss), 50);
    }

    #[test]
    fn weights_outside_tolerance_are_rejected() {
        let weights = GradeWeights {
            common: 0.5,
            rare: 0.2,
            epic: 0.1,
            legend: 0.05,
            mythic: 0.05,
        };
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::WeightSum { .. })
        ));
    }

    #[test]
    fn negative_weights_are_rejected() {
        let weights = GradeWeights {
            common: 1.1,
            rare: -0.1,
            epic: 0.0,
            legend: 0.0,
            mythic: 0.0,
        };
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::InvalidWeight { grade: Grade::Rare })
        ));
    }

    #[test]
    fn empty_wave_list_is_rejected() {
        let mut config = GameConfig::builtin().expect("builtin config");
        config.waves.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoWaves)));
    }
}
