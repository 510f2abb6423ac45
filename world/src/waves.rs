//! Wave sequencing and ownership of the live enemy roster.

use std::{collections::VecDeque, time::Duration};

use merge_defence_config::{EnemyTable, GameConfig, WaveDefinition, WaveTiming};
use merge_defence_core::{EnemyId, EnemyKind, Event, WavePhase};
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, info};

use crate::{enemy::Enemy, path::Path};

/// Single enemy awaiting its spawn slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SpawnEntry {
    kind: EnemyKind,
    health: u32,
}

/// Wave that finished during an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveClear {
    /// One-based wave number.
    pub wave: u32,
    /// Gold granted for the clear.
    pub reward: u32,
    /// Indicates whether the cleared wave was the last one.
    pub final_wave: bool,
}

/// Lifecycle changes observed during one director update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WaveReport {
    /// Kinds of enemies that died and were removed.
    pub killed: Vec<EnemyKind>,
    /// Kinds of enemies that reached the end and were removed.
    pub leaked: Vec<EnemyKind>,
    /// Wave that cleared during the update, if any.
    pub cleared: Option<WaveClear>,
}

/// State machine sequencing spawn batches, clears and preparation delays.
///
/// The director exclusively owns the live enemy list. Enemies are removed in
/// the same reverse scan that detects their death or leak, so each enemy is
/// reported exactly once.
#[derive(Clone, Debug)]
pub struct WaveDirector {
    waves: Vec<WaveDefinition>,
    timing: WaveTiming,
    enemy_table: EnemyTable,
    enemies: Vec<Enemy>,
    queue: VecDeque<SpawnEntry>,
    current_wave: u32,
    spawning: bool,
    preparing: bool,
    prepare_remaining: Duration,
    spawn_accumulator: Duration,
    all_cleared: bool,
    next_enemy_id: u32,
}

impl WaveDirector {
    /// Creates an idle director for the configured waves.
    #[must_use]
    pub fn new(config: &GameConfig) -> Self {
        Self::with_waves(config.waves.clone(), config.wave, config.enemies.clone())
    }

    /// Creates an idle director for an explicit wave list.
    #[must_use]
    pub fn with_waves(waves: Vec<WaveDefinition>, timing: WaveTiming, enemy_table: EnemyTable) -> Self {
        Self {
            waves,
            timing,
            enemy_table,
            enemies: Vec::new(),
            queue: VecDeque::new(),
            current_wave: 0,
            spawning: false,
            preparing: false,
            prepare_remaining: Duration::ZERO,
            spawn_accumulator: Duration::ZERO,
            all_cleared: false,
            next_enemy_id: 0,
        }
    }

    /// One-based number of the most recently started wave, or zero.
    #[must_use]
    pub fn current_wave(&self) -> u32 {
        self.current_wave
    }

    /// Number of configured waves.
    #[must_use]
    pub fn total_waves(&self) -> u32 {
        u32::try_from(self.waves.len()).unwrap_or(u32::MAX)
    }

    /// Reports whether the final wave has been cleared.
    #[must_use]
    pub fn is_all_waves_cleared(&self) -> bool {
        self.all_cleared
    }

    /// Reports whether the spawn queue is still being drained.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    /// Reports whether the director waits between waves.
    #[must_use]
    pub fn is_preparing(&self) -> bool {
        self.preparing
    }

    /// Time left before the next wave starts automatically.
    #[must_use]
    pub fn prepare_remaining(&self) -> Duration {
        if self.preparing {
            self.prepare_remaining
        } else {
            Duration::ZERO
        }
    }

    /// Observable phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> WavePhase {
        if self.all_cleared {
            WavePhase::AllWavesCleared
        } else if self.preparing {
            WavePhase::Preparing
        } else if self.spawning {
            WavePhase::Spawning
        } else if self.current_wave == 0 {
            WavePhase::Idle
        } else {
            WavePhase::Active
        }
    }

    /// Live enemies in spawn order.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// Mutable access to a live enemy.
    pub fn enemy_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|enemy| enemy.id() == id)
    }

    /// Builds and shuffles the next wave's spawn queue and spawns its first enemy.
    ///
    /// Returns `false` when a wave is still spawning or no wave remains.
    pub fn start_next_wave<R>(&mut self, rng: &mut R, path: &dyn Path, out: &mut Vec<Event>) -> bool
    where
        R: Rng + ?Sized,
    {
        if self.spawning || self.all_cleared {
            return false;
        }
        let Some(definition) = self.waves.get(self.current_wave as usize) else {
            return false;
        };

        let mut entries: Vec<SpawnEntry> = definition
            .groups
            .iter()
            .flat_map(|group| {
                (0..group.count).map(move |_| SpawnEntry {
                    kind: group.kind,
                    health: group.hp,
                })
            })
            .collect();
        entries.shuffle(rng);

        self.queue = entries.into();
        self.current_wave += 1;
        self.preparing = false;
        self.prepare_remaining = Duration::ZERO;
        self.spawning = true;
        self.spawn_accumulator = Duration::ZERO;

        info!(
            wave = self.current_wave,
            enemies = self.queue.len(),
            "wave started"
        );
        out.push(Event::WaveStarted {
            wave: self.current_wave,
        });
        self.spawn_next(path, out);
        true
    }

    /// Cancels the preparation delay and starts the next wave immediately.
    ///
    /// Returns `false` without any effect unless the director is preparing.
    pub fn skip_prepare<R>(&mut self, rng: &mut R, path: &dyn Path, out: &mut Vec<Event>) -> bool
    where
        R: Rng + ?Sized,
    {
        if !self.preparing {
            return false;
        }
        debug!(wave = self.current_wave + 1, "preparation skipped");
        self.start_next_wave(rng, path, out)
    }

    /// Advances preparation, spawning, enemy movement and clear detection.
    pub fn update<R>(
        &mut self,
        dt: Duration,
        rng: &mut R,
        path: &dyn Path,
        out: &mut Vec<Event>,
    ) -> WaveReport
    where
        R: Rng + ?Sized,
    {
        let mut report = WaveReport::default();

        if self.preparing {
            self.prepare_remaining = self.prepare_remaining.saturating_sub(dt);
            if self.prepare_remaining.is_zero() {
                let _ = self.start_next_wave(rng, path, out);
            }
        } else if self.spawning {
            self.spawn_accumulator += dt;
            while self.spawning && self.spawn_accumulator >= self.timing.spawn_interval {
                self.spawn_accumulator -= self.timing.spawn_interval;
                self.spawn_next(path, out);
            }
        }

        for index in (0..self.enemies.len()).rev() {
            let enemy = &mut self.enemies[index];
            let dot = enemy.advance(path, dt);
            if dot > 0 {
                out.push(Event::DamageDealt {
                    position: enemy.position(),
                    amount: dot,
                    critical: false,
                });
            }

            if enemy.is_dead() {
                let enemy = self.enemies.remove(index);
                out.push(Event::EnemyKilled {
                    enemy: enemy.id(),
                    kind: enemy.kind(),
                    position: enemy.position(),
                });
                report.killed.push(enemy.kind());
            } else if enemy.reached_end() {
                let enemy = self.enemies.remove(index);
                out.push(Event::EnemyReachedEnd {
                    enemy: enemy.id(),
                    kind: enemy.kind(),
                });
                report.leaked.push(enemy.kind());
            }
        }

        report.cleared = self.detect_clear(out);
        report
    }

    fn detect_clear(&mut self, out: &mut Vec<Event>) -> Option<WaveClear> {
        let cleared = !self.spawning
            && self.enemies.is_empty()
            && self.current_wave > 0
            && !self.preparing
            && !self.all_cleared;
        if !cleared {
            return None;
        }

        let reward = self
            .waves
            .get(self.current_wave as usize - 1)
            .map_or(0, |wave| wave.reward);
        let final_wave = self.current_wave >= self.total_waves();
        info!(wave = self.current_wave, reward, "wave cleared");
        out.push(Event::WaveCleared {
            wave: self.current_wave,
            reward,
        });

        if final_wave {
            self.all_cleared = true;
            info!(waves = self.current_wave, "all waves cleared");
            out.push(Event::AllWavesCleared);
        } else {
            self.preparing = true;
            self.prepare_remaining = self.timing.prepare_time;
        }

        Some(WaveClear {
            wave: self.current_wave,
            reward,
            final_wave,
        })
    }

    fn spawn_next(&mut self, path: &dyn Path, out: &mut Vec<Event>) {
        if let Some(entry) = self.queue.pop_front() {
            let stats = self.enemy_table.stats(entry.kind);
            let id = EnemyId::new(self.next_enemy_id);
            self.next_enemy_id += 1;
            self.enemies.push(Enemy::new(
                id,
                entry.kind,
                entry.health,
                stats.armor,
                self.enemy_table.base_speed,
                stats.speed_multiplier,
                path.point_at(0.0),
            ));
            out.push(Event::EnemySpawned {
                enemy: id,
                kind: entry.kind,
                health: entry.health,
            });
        }
        if self.queue.is_empty() {
            self.spawning = false;
        }
    }
}
