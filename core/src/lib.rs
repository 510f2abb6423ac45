#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Merge Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Action`] values
//! on behalf of the player, the simulation resolves them into [`Command`]
//! values that the world executes via its `apply` entry point, and the world
//! then broadcasts [`Event`] values for downstream observers. Systems read
//! immutable snapshots and respond exclusively with plans and command batches.

use std::{
    ops::{Add, AddAssign},
    time::Duration,
};

pub use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Canonical banner emitted when a session boots.
pub const WELCOME_BANNER: &str = "Welcome to Merge Defence.";

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a placed unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a projectile in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Kinds of hostiles that traverse the path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    /// Baseline enemy without special traits.
    Normal,
    /// Quick enemy with a high speed multiplier.
    Fast,
    /// Slow, heavily armoured enemy.
    Tank,
    /// Airborne enemy that melee units cannot reach.
    Flying,
    /// Wave boss that costs extra lives when it leaks.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [Self; 5] = [Self::Normal, Self::Fast, Self::Tank, Self::Flying, Self::Boss];

    /// Reports whether the enemy flies over the path.
    #[must_use]
    pub const fn is_flying(self) -> bool {
        matches!(self, Self::Flying)
    }
}

/// Combat roles a unit may assume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// Melee unit dealing instant damage.
    Warrior,
    /// Ranged unit firing homing arrows.
    Archer,
    /// Caster firing slow splashing bolts.
    Mage,
    /// Support unit that buffs its neighbours.
    Supporter,
    /// Debuffing unit with an optional periodic freeze.
    Special,
}

impl UnitKind {
    /// Every unit kind in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Warrior,
        Self::Archer,
        Self::Mage,
        Self::Supporter,
        Self::Special,
    ];

    /// Reports whether the unit attacks in melee and therefore ignores flyers.
    #[must_use]
    pub const fn is_melee(self) -> bool {
        matches!(self, Self::Warrior)
    }
}

/// Power tier of a unit, promoted by merging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    /// Lowest tier.
    Common,
    /// Second tier.
    Rare,
    /// Third tier.
    Epic,
    /// Fourth tier.
    Legend,
    /// Highest tier; cannot be merged further.
    Mythic,
}

impl Grade {
    /// Every grade ordered from lowest to highest.
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Rare,
        Self::Epic,
        Self::Legend,
        Self::Mythic,
    ];

    /// Zero-based position of the grade within [`Grade::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Common => 0,
            Self::Rare => 1,
            Self::Epic => 2,
            Self::Legend => 3,
            Self::Mythic => 4,
        }
    }

    /// Grade produced by merging two units of this grade, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Common => Some(Self::Rare),
            Self::Rare => Some(Self::Epic),
            Self::Epic => Some(Self::Legend),
            Self::Legend => Some(Self::Mythic),
            Self::Mythic => None,
        }
    }

    /// Reports whether the grade is the top of the ladder.
    #[must_use]
    pub const fn is_max(self) -> bool {
        matches!(self, Self::Mythic)
    }
}

/// Location of a single placement cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Serde adapter that stores [`Duration`] values as fractional seconds.
///
/// Configuration tables express every timer in seconds; negative, NaN or
/// overflowing values are rejected while deserialising.
pub mod serde_seconds {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// Serialises the duration as fractional seconds.
    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    /// Deserialises fractional seconds into a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds)
            .map_err(|_| D::Error::custom(format!("invalid duration in seconds: {seconds}")))
    }
}

/// Tag used to look up an [`Ability`] within an [`AbilitySet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    /// Chance to multiply melee damage.
    CritChance,
    /// Stun applied on a critical melee hit.
    Stun,
    /// Splash applied around a critical melee hit.
    Splash,
    /// Additional delayed arrows per attack.
    Multishot,
    /// Arrow hits that propagate to nearby enemies.
    Pierce,
    /// Movement slow applied on hit.
    Slow,
    /// Damage-over-time applied on hit.
    Dot,
    /// Armour reduction applied on hit.
    ArmorReduce,
    /// Periodic freeze shot.
    Freeze,
    /// Adjacent attack buff.
    BuffAtk,
    /// Adjacent attack speed buff.
    BuffSpeed,
    /// Adjacent range buff.
    BuffRange,
    /// Attack buff applied to every placed unit.
    BuffAtkGlobal,
}

/// Critical strike parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CritSpec {
    /// Probability in `[0, 1]` that an attack is critical.
    pub chance: f32,
    /// Damage multiplier applied to critical attacks.
    pub multiplier: f32,
}

/// Movement slow parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlowSpec {
    /// Fraction of movement speed removed while active.
    pub percent: f32,
    /// Time the slow remains active.
    #[serde(with = "serde_seconds")]
    pub duration: Duration,
}

/// Armour reduction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmorReduceSpec {
    /// Fraction of base armour removed while active.
    pub percent: f32,
    /// Time the reduction remains active.
    #[serde(with = "serde_seconds")]
    pub duration: Duration,
}

/// Damage-over-time parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotSpec {
    /// Raw damage dealt by each tick.
    pub damage: u32,
    /// Time between consecutive ticks.
    #[serde(with = "serde_seconds")]
    pub interval: Duration,
    /// Total time the effect remains active.
    #[serde(with = "serde_seconds")]
    pub duration: Duration,
}

/// Periodic freeze parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreezeSpec {
    /// Time a frozen enemy stays frozen.
    #[serde(with = "serde_seconds")]
    pub duration: Duration,
    /// Accumulated attack time required before a freeze shot fires.
    #[serde(with = "serde_seconds")]
    pub interval: Duration,
}

/// Tagged ability record attached to a unit's grade-specific stat block.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Ability {
    /// Chance to land a critical melee hit.
    CritChance(CritSpec),
    /// Stun applied by critical melee hits.
    Stun {
        /// Time the target stays stunned.
        #[serde(with = "serde_seconds")]
        duration: Duration,
    },
    /// Splash applied by critical melee hits.
    Splash {
        /// Radius around the primary target that receives splash damage.
        radius: f32,
    },
    /// Additional delayed shots per archer attack.
    Multishot {
        /// Number of extra shots queued after the primary shot.
        shots: u32,
    },
    /// Lets an arrow hit spread to nearby enemies.
    Pierce {
        /// Number of additional enemies a single arrow may damage.
        count: u32,
    },
    /// Movement slow applied on hit.
    Slow(SlowSpec),
    /// Damage-over-time applied on hit.
    Dot(DotSpec),
    /// Armour reduction applied on hit.
    ArmorReduce(ArmorReduceSpec),
    /// Periodic freeze shot.
    Freeze(FreezeSpec),
    /// Attack bonus granted to orthogonal neighbours.
    BuffAtk {
        /// Additive attack fraction.
        value: f32,
    },
    /// Attack speed bonus granted to orthogonal neighbours.
    BuffSpeed {
        /// Additive interval reduction fraction.
        value: f32,
    },
    /// Range bonus granted to orthogonal neighbours.
    BuffRange {
        /// Additive range fraction.
        value: f32,
    },
    /// Attack bonus granted to every placed unit.
    BuffAtkGlobal {
        /// Additive attack fraction.
        value: f32,
    },
}

impl Ability {
    /// Tag identifying the ability variant.
    #[must_use]
    pub const fn kind(&self) -> AbilityKind {
        match self {
            Self::CritChance(_) => AbilityKind::CritChance,
            Self::Stun { .. } => AbilityKind::Stun,
            Self::Splash { .. } => AbilityKind::Splash,
            Self::Multishot { .. } => AbilityKind::Multishot,
            Self::Pierce { .. } => AbilityKind::Pierce,
            Self::Slow(_) => AbilityKind::Slow,
            Self::Dot(_) => AbilityKind::Dot,
            Self::ArmorReduce(_) => AbilityKind::ArmorReduce,
            Self::Freeze(_) => AbilityKind::Freeze,
            Self::BuffAtk { .. } => AbilityKind::BuffAtk,
            Self::BuffSpeed { .. } => AbilityKind::BuffSpeed,
            Self::BuffRange { .. } => AbilityKind::BuffRange,
            Self::BuffAtkGlobal { .. } => AbilityKind::BuffAtkGlobal,
        }
    }
}

/// Immutable list of abilities attached to a stat block.
///
/// Lookups return the first ability carrying the requested tag.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilitySet(Vec<Ability>);

impl AbilitySet {
    /// Creates a set from the provided abilities.
    #[must_use]
    pub fn new(abilities: Vec<Ability>) -> Self {
        Self(abilities)
    }

    /// Iterator over the abilities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Ability> {
        self.0.iter()
    }

    /// Reports whether the set carries no abilities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the first ability with the provided tag.
    #[must_use]
    pub fn get(&self, kind: AbilityKind) -> Option<&Ability> {
        self.0.iter().find(|ability| ability.kind() == kind)
    }

    /// Reports whether an ability with the provided tag is present.
    #[must_use]
    pub fn has(&self, kind: AbilityKind) -> bool {
        self.get(kind).is_some()
    }

    /// Critical strike parameters, if any.
    #[must_use]
    pub fn crit(&self) -> Option<CritSpec> {
        self.0.iter().find_map(|ability| match ability {
            Ability::CritChance(spec) => Some(*spec),
            _ => None,
        })
    }

    /// Stun duration applied on critical hits, if any.
    #[must_use]
    pub fn stun(&self) -> Option<Duration> {
        self.0.iter().find_map(|ability| match ability {
            Ability::Stun { duration } => Some(*duration),
            _ => None,
        })
    }

    /// Splash radius applied on critical hits, if any.
    #[must_use]
    pub fn splash_radius(&self) -> Option<f32> {
        self.0.iter().find_map(|ability| match ability {
            Ability::Splash { radius } => Some(*radius),
            _ => None,
        })
    }

    /// Number of extra shots queued per attack, if any.
    #[must_use]
    pub fn multishot(&self) -> Option<u32> {
        self.0.iter().find_map(|ability| match ability {
            Ability::Multishot { shots } => Some(*shots),
            _ => None,
        })
    }

    /// Number of additional enemies a hit may pierce into, if any.
    #[must_use]
    pub fn pierce(&self) -> Option<u32> {
        self.0.iter().find_map(|ability| match ability {
            Ability::Pierce { count } => Some(*count),
            _ => None,
        })
    }

    /// Slow parameters, if any.
    #[must_use]
    pub fn slow(&self) -> Option<SlowSpec> {
        self.0.iter().find_map(|ability| match ability {
            Ability::Slow(spec) => Some(*spec),
            _ => None,
        })
    }

    /// Damage-over-time parameters, if any.
    #[must_use]
    pub fn dot(&self) -> Option<DotSpec> {
        self.0.iter().find_map(|ability| match ability {
            Ability::Dot(spec) => Some(*spec),
            _ => None,
        })
    }

    /// Armour reduction parameters, if any.
    #[must_use]
    pub fn armor_reduce(&self) -> Option<ArmorReduceSpec> {
        self.0.iter().find_map(|ability| match ability {
            Ability::ArmorReduce(spec) => Some(*spec),
            _ => None,
        })
    }

    /// Periodic freeze parameters, if any.
    #[must_use]
    pub fn freeze(&self) -> Option<FreezeSpec> {
        self.0.iter().find_map(|ability| match ability {
            Ability::Freeze(spec) => Some(*spec),
            _ => None,
        })
    }

    /// Buff granted to orthogonal neighbours, or `None` when the set grants none.
    #[must_use]
    pub fn local_buff(&self) -> Option<Buff> {
        let mut buff = Buff::ZERO;
        let mut found = false;
        for ability in &self.0 {
            match ability {
                Ability::BuffAtk { value } => buff.attack_percent += value,
                Ability::BuffSpeed { value } => buff.speed_percent += value,
                Ability::BuffRange { value } => buff.range_percent += value,
                _ => continue,
            }
            found = true;
        }
        found.then_some(buff)
    }

    /// Sum of global attack buffs carried by the set.
    #[must_use]
    pub fn global_attack_buff(&self) -> f32 {
        self.0
            .iter()
            .map(|ability| match ability {
                Ability::BuffAtkGlobal { value } => *value,
                _ => 0.0,
            })
            .sum()
    }

    /// Debuffs applied to enemies struck by this set's owner.
    ///
    /// Only slow, armour reduction and damage-over-time are included; stun
    /// and freeze follow archetype-specific triggers.
    #[must_use]
    pub fn on_hit_effects(&self) -> Vec<StatusEffect> {
        let mut effects = Vec::new();
        if let Some(slow) = self.slow() {
            effects.push(StatusEffect::Slow(slow));
        }
        if let Some(reduce) = self.armor_reduce() {
            effects.push(StatusEffect::ArmorReduce(reduce));
        }
        if let Some(dot) = self.dot() {
            effects.push(StatusEffect::Dot(dot));
        }
        effects
    }
}

/// Additive stat multipliers accumulated by a unit during a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    /// Fraction added to the attack multiplier.
    pub attack_percent: f32,
    /// Fraction removed from the attack interval.
    pub speed_percent: f32,
    /// Fraction added to the range multiplier.
    pub range_percent: f32,
}

impl Buff {
    /// Neutral buff that leaves stats untouched.
    pub const ZERO: Self = Self {
        attack_percent: 0.0,
        speed_percent: 0.0,
        range_percent: 0.0,
    };

    /// Creates a buff that only raises attack.
    #[must_use]
    pub const fn attack(percent: f32) -> Self {
        Self {
            attack_percent: percent,
            speed_percent: 0.0,
            range_percent: 0.0,
        }
    }

    /// Reports whether every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for Buff {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            attack_percent: self.attack_percent + other.attack_percent,
            speed_percent: self.speed_percent + other.speed_percent,
            range_percent: self.range_percent + other.range_percent,
        }
    }
}

impl AddAssign for Buff {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Base combat stats of a unit at a given grade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Base damage per attack.
    pub attack: u32,
    /// Base time between attacks.
    #[serde(with = "serde_seconds")]
    pub attack_interval: Duration,
    /// Base targeting radius in world units.
    pub range: f32,
    /// Abilities attached to the stat block.
    #[serde(default)]
    pub abilities: AbilitySet,
}

impl UnitStats {
    /// Attack after applying the buff: `round(base × (1 + attack_percent))`.
    #[must_use]
    pub fn effective_attack(&self, buff: &Buff) -> u32 {
        let scaled = self.attack as f32 * (1.0 + buff.attack_percent);
        scaled.round().max(0.0) as u32
    }

    /// Interval after applying the buff: `base × (1 − speed_percent)`, never negative.
    #[must_use]
    pub fn effective_interval(&self, buff: &Buff) -> Duration {
        let factor = (1.0 - buff.speed_percent).max(0.0);
        self.attack_interval.mul_f32(factor)
    }

    /// Range after applying the buff: `base × (1 + range_percent)`, never negative.
    #[must_use]
    pub fn effective_range(&self, buff: &Buff) -> f32 {
        (self.range * (1.0 + buff.range_percent)).max(0.0)
    }
}

/// Timed status applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatusEffect {
    /// Reduces movement speed.
    Slow(SlowSpec),
    /// Reduces armour.
    ArmorReduce(ArmorReduceSpec),
    /// Deals periodic damage.
    Dot(DotSpec),
    /// Prevents movement for the duration.
    Stun(Duration),
    /// Freezes the enemy, implying a stun of at least the same duration.
    Freeze(Duration),
}

/// Damage and statuses that a single attack applies to one enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    /// Enemy receiving the impact.
    pub enemy: EnemyId,
    /// Raw damage before armour.
    pub damage: u32,
    /// Indicates whether the damage came from a critical strike.
    pub critical: bool,
    /// Statuses applied after the damage.
    pub effects: Vec<StatusEffect>,
}

impl Impact {
    /// Creates a plain damage impact without statuses.
    #[must_use]
    pub fn damage(enemy: EnemyId, damage: u32) -> Self {
        Self {
            enemy,
            damage,
            critical: false,
            effects: Vec::new(),
        }
    }
}

/// Value produced when a projectile reaches its target.
///
/// Consumers resolve the secondary effects from the carried source abilities;
/// the projectile itself never mutates enemies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    /// Projectile that produced the hit.
    pub projectile: ProjectileId,
    /// Unit that launched the projectile.
    pub source: UnitId,
    /// Archetype of the launching unit.
    pub source_kind: UnitKind,
    /// Enemy struck by the projectile.
    pub target: EnemyId,
    /// World position where the hit landed.
    pub position: Vec2,
    /// Raw damage carried by the projectile.
    pub damage: u32,
    /// Abilities of the launching unit at the time of firing.
    pub abilities: AbilitySet,
    /// Indicates whether the projectile is a periodic freeze shot.
    pub freeze_shot: bool,
}

/// Projectile requested by an attack plan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotPlan {
    /// Enemy the projectile homes onto.
    pub target: EnemyId,
    /// Raw damage carried by the projectile.
    pub damage: u32,
    /// Indicates whether the projectile is a periodic freeze shot.
    pub freeze_shot: bool,
}

/// Shot released after a delay, used by multishot bursts.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueuedShot {
    /// Time remaining before the shot is released.
    pub delay: Duration,
    /// Enemy the shot will home onto.
    pub target: EnemyId,
    /// Raw damage carried by the shot.
    pub damage: u32,
}

/// Outcome of a single unit's attack dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackPlan {
    /// Unit executing the attack.
    pub unit: UnitId,
    /// Instant impacts resolved without a projectile.
    pub strikes: Vec<Impact>,
    /// Projectiles launched immediately.
    pub shots: Vec<ShotPlan>,
    /// Projectiles released after a delay.
    pub queued: Vec<QueuedShot>,
    /// Freeze accumulator value after this attack.
    pub freeze_charge: Duration,
}

/// Buff computed for a single unit during propagation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitBuff {
    /// Unit receiving the buff.
    pub unit: UnitId,
    /// Total buff for the tick.
    pub buff: Buff,
}

/// Enemies a unit may attack this tick, primary target first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTarget {
    /// Unit that acquired the targets.
    pub unit: UnitId,
    /// In-range enemies ordered by path progress, furthest along first.
    pub enemies: Vec<EnemyId>,
}

/// Player intents submitted by adapters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Launches the first wave.
    Start,
    /// Pays for and places a randomly rolled unit.
    Summon,
    /// Sells the unit occupying the cell.
    Sell {
        /// Cell holding the unit to sell.
        cell: CellCoord,
    },
    /// Drops a unit onto another cell, moving, merging or swapping as appropriate.
    Drop {
        /// Cell the unit is picked up from.
        from: CellCoord,
        /// Cell the unit is dropped onto.
        to: CellCoord,
    },
    /// Merges the unit at `from` into the unit at `to`.
    Merge {
        /// Cell holding the first input.
        from: CellCoord,
        /// Cell holding the second input and receiving the result.
        to: CellCoord,
    },
    /// Skips the preparation delay between waves.
    SkipPrepare,
    /// Changes the multiplier applied to incoming frame time.
    SetTimeScale {
        /// Positive time multiplier.
        scale: f32,
    },
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts the first wave when the session is idle.
    StartGame,
    /// Advances the wave director, enemies and unit timers.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Skips the current preparation delay.
    SkipPrepare,
    /// Pays the summon cost and places a unit in the first empty cell.
    SummonUnit {
        /// Rolled archetype.
        kind: UnitKind,
        /// Rolled grade.
        grade: Grade,
    },
    /// Consumes the units at both cells and places the merged result at `to`.
    MergeUnits {
        /// Cell holding the first input.
        from: CellCoord,
        /// Cell holding the second input and receiving the result.
        to: CellCoord,
        /// Archetype of the merged result.
        kind: UnitKind,
        /// Grade of the merged result.
        grade: Grade,
    },
    /// Moves a unit, swapping with any occupant of the destination.
    MoveUnit {
        /// Cell holding the unit.
        from: CellCoord,
        /// Destination cell.
        to: CellCoord,
    },
    /// Removes a unit and refunds the sell return.
    SellUnit {
        /// Cell holding the unit.
        cell: CellCoord,
    },
    /// Replaces every unit's buff; units absent from the list are reset to zero.
    ApplyBuffs {
        /// Buffs computed for the tick.
        buffs: Vec<UnitBuff>,
    },
    /// Executes an attack plan and restarts the unit's cooldown.
    ExecuteAttack {
        /// Plan produced by the combat system.
        plan: AttackPlan,
    },
    /// Advances every projectile in flight.
    AdvanceProjectiles {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Applies damage and statuses to enemies.
    ApplyImpacts {
        /// Impacts to apply in order.
        impacts: Vec<Impact>,
    },
}

/// Reasons a placement-related request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum PlacementError {
    /// The cell lies outside the grid.
    #[error("cell is outside the placement grid")]
    OutOfBounds,
    /// The cell is covered by the enemy path.
    #[error("cell is blocked by the path")]
    Blocked,
    /// The cell already holds a unit.
    #[error("cell is already occupied")]
    Occupied,
    /// The cell does not hold a unit.
    #[error("cell holds no unit")]
    Empty,
    /// Source and destination are the same cell.
    #[error("source and destination are the same cell")]
    SameCell,
}

/// Reasons a merge request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum MergeError {
    /// Both inputs refer to the same unit.
    #[error("a unit cannot merge with itself")]
    SameUnit,
    /// The inputs have different grades.
    #[error("units have different grades")]
    GradeMismatch,
    /// The inputs are already at the highest grade.
    #[error("units are already at the highest grade")]
    MaxGrade,
    /// One of the cells does not hold a unit.
    #[error("merge input is missing")]
    MissingUnit,
}

/// Reasons a summon request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum SummonError {
    /// Gold balance is below the summon cost.
    #[error("not enough gold to summon")]
    InsufficientFunds,
    /// No empty placement cell remains.
    #[error("placement grid is full")]
    GridFull,
}

/// Reasons a preparation skip may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum SkipError {
    /// The director is not waiting between waves.
    #[error("no wave preparation is in progress")]
    NotPreparing,
}

/// Final result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every configured wave was cleared.
    Victory,
    /// Lives dropped to zero.
    Defeat,
}

/// Observable state of the wave director.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// No wave has started yet.
    Idle,
    /// The current wave's spawn queue is still being drained.
    Spawning,
    /// Spawning finished and enemies remain alive.
    Active,
    /// Waiting for the next wave to begin.
    Preparing,
    /// The final wave was cleared.
    AllWavesCleared,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave began spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of the spawned enemy.
        kind: EnemyKind,
        /// Starting health.
        health: u32,
    },
    /// Reports that an enemy died and was removed from the roster.
    EnemyKilled {
        /// Identifier of the killed enemy.
        enemy: EnemyId,
        /// Kind of the killed enemy.
        kind: EnemyKind,
        /// Position where the enemy died.
        position: Vec2,
    },
    /// Reports that an enemy reached the end of the path and was removed.
    EnemyReachedEnd {
        /// Identifier of the leaked enemy.
        enemy: EnemyId,
        /// Kind of the leaked enemy.
        kind: EnemyKind,
    },
    /// Announces that every enemy of the current wave is gone.
    WaveCleared {
        /// One-based number of the cleared wave.
        wave: u32,
        /// Gold granted for the clear.
        reward: u32,
    },
    /// Announces that the final wave was cleared.
    AllWavesCleared,
    /// Confirms that the preparation delay was skipped.
    PreparationSkipped {
        /// Gold granted for skipping.
        bonus: u32,
    },
    /// Reports the new gold balance.
    GoldChanged {
        /// Balance after the change.
        gold: u32,
    },
    /// Reports the new life total.
    LivesChanged {
        /// Lives after the change.
        lives: u32,
    },
    /// Reports the new score.
    ScoreChanged {
        /// Score after the change.
        score: u64,
    },
    /// Confirms that a unit was placed.
    UnitPlaced {
        /// Identifier assigned to the unit.
        unit: UnitId,
        /// Archetype of the unit.
        kind: UnitKind,
        /// Grade of the unit.
        grade: Grade,
        /// Cell occupied by the unit.
        cell: CellCoord,
    },
    /// Confirms that a unit changed cells.
    UnitMoved {
        /// Unit that moved.
        unit: UnitId,
        /// Previous cell.
        from: CellCoord,
        /// New cell.
        to: CellCoord,
    },
    /// Confirms that a unit left the grid.
    UnitRemoved {
        /// Unit that was removed.
        unit: UnitId,
        /// Cell the unit occupied.
        cell: CellCoord,
    },
    /// Confirms that two units merged into a new one.
    UnitsMerged {
        /// Units consumed by the merge.
        consumed: [UnitId; 2],
        /// Unit produced by the merge.
        result: UnitId,
        /// Grade of the produced unit.
        grade: Grade,
    },
    /// Confirms that a unit was sold.
    UnitSold {
        /// Unit that was sold.
        unit: UnitId,
        /// Gold refunded for the sale.
        refund: u32,
    },
    /// Reports that a unit attacked.
    UnitAttacked {
        /// Unit that attacked.
        unit: UnitId,
        /// Archetype of the attacker.
        kind: UnitKind,
    },
    /// Confirms that a projectile left its unit.
    ProjectileLaunched {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Unit that fired.
        unit: UnitId,
        /// Enemy targeted by the projectile.
        target: EnemyId,
    },
    /// Reports that a projectile reached its target.
    ProjectileHit {
        /// Hit awaiting resolution.
        hit: HitEvent,
    },
    /// Reports that a projectile lost its target and vanished.
    ProjectileCancelled {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Reports damage dealt to an enemy for presentation.
    DamageDealt {
        /// Position of the damaged enemy.
        position: Vec2,
        /// Damage dealt after armour.
        amount: u32,
        /// Indicates whether the damage was critical.
        critical: bool,
    },
    /// Reports that a summon request was rejected.
    SummonRejected {
        /// Reason for the rejection.
        reason: SummonError,
    },
    /// Reports that a merge request was rejected.
    MergeRejected {
        /// Reason for the rejection.
        reason: MergeError,
    },
    /// Reports that a placement request was rejected.
    PlacementRejected {
        /// Reason for the rejection.
        reason: PlacementError,
    },
    /// Reports that a skip request was rejected.
    SkipRejected {
        /// Reason for the rejection.
        reason: SkipError,
    },
    /// Announces the end of the session.
    SessionEnded {
        /// Final result.
        outcome: Outcome,
    },
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Current world position.
    pub position: Vec2,
    /// Normalised path progress in `[0, 1]`.
    pub progress: f32,
    /// Remaining health.
    pub health: u32,
    /// Health at spawn.
    pub max_health: u32,
    /// Armour after reductions.
    pub armor: u32,
    /// Indicates whether the enemy flies.
    pub flying: bool,
    /// Indicates whether the enemy is alive and still on the path.
    pub targetable: bool,
}

/// Read-only snapshot describing all enemies on the path.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided enemy.
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Archetype of the unit.
    pub kind: UnitKind,
    /// Grade of the unit.
    pub grade: Grade,
    /// Cell occupied by the unit.
    pub cell: CellCoord,
    /// World position of the cell centre.
    pub position: Vec2,
    /// Attack after buffs.
    pub attack: u32,
    /// Attack interval after buffs.
    pub attack_interval: Duration,
    /// Range after buffs.
    pub range: f32,
    /// Buff accumulated for the current tick.
    pub buff: Buff,
    /// Abilities of the unit's stat block.
    pub abilities: AbilitySet,
    /// Indicates whether the attack cooldown elapsed.
    pub ready: bool,
    /// Time accumulated toward the next freeze shot.
    pub freeze_charge: Duration,
}

/// Read-only snapshot describing all placed units.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided unit.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&UnitSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}

/// Occupancy state of a single placement cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridCell {
    /// Indicates whether the path covers the cell.
    pub blocked: bool,
    /// Unit occupying the cell, if any.
    pub unit: Option<UnitId>,
}

/// Read-only view into the dense placement grid.
#[derive(Clone, Copy, Debug)]
pub struct GridView<'a> {
    cells: &'a [GridCell],
    columns: u32,
    rows: u32,
}

impl<'a> GridView<'a> {
    /// Captures a new grid view backed by the provided row-major cell slice.
    #[must_use]
    pub fn new(cells: &'a [GridCell], columns: u32, rows: u32) -> Self {
        Self {
            cells,
            columns,
            rows,
        }
    }

    /// Provides the dimensions of the underlying grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Returns the state of the provided cell, if it lies inside the grid.
    #[must_use]
    pub fn cell(&self, cell: CellCoord) -> Option<GridCell> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Returns the unit occupying the provided cell, if any.
    #[must_use]
    pub fn unit_at(&self, cell: CellCoord) -> Option<UnitId> {
        self.cell(cell).and_then(|state| state.unit)
    }

    /// Orthogonal, in-bounds, non-blocked neighbours of the provided cell.
    ///
    /// Neighbours are reported in up, down, left, right order.
    #[must_use]
    pub fn adjacent(&self, cell: CellCoord) -> Vec<CellCoord> {
        let column = i64::from(cell.column());
        let row = i64::from(cell.row());
        [(0, -1), (0, 1), (-1, 0), (1, 0)]
            .into_iter()
            .filter_map(|(dc, dr)| {
                let next_column = u32::try_from(column + dc).ok()?;
                let next_row = u32::try_from(row + dr).ok()?;
                let neighbour = CellCoord::new(next_column, next_row);
                let state = self.cell(neighbour)?;
                (!state.blocked).then_some(neighbour)
            })
            .collect()
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.column() < self.columns && cell.row() < self.rows {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}

/// Totals exposed to external score persistence once a session ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Highest wave number reached.
    pub wave: u32,
    /// Number of configured waves.
    pub total_waves: u32,
    /// Enemies killed.
    pub kills: u32,
    /// Merges performed.
    pub merges: u32,
    /// Final score.
    pub score: u64,
    /// Gold remaining.
    pub gold: u32,
    /// Lives remaining.
    pub lives: u32,
    /// Highest grade reached by summon or merge.
    pub highest_grade: Option<Grade>,
    /// Final result, if the session ended.
    pub outcome: Option<Outcome>,
}
