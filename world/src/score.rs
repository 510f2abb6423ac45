//! Score and progression counters.

/// Score awarded per wave number when a wave is cleared.
pub const WAVE_CLEAR_SCORE: u64 = 100;
/// Score awarded per kill.
pub const KILL_SCORE: u64 = 10;
/// Score awarded per merge.
pub const MERGE_SCORE: u64 = 50;

/// Accumulates the session score alongside kill, merge and clear counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreLedger {
    score: u64,
    kills: u32,
    merges: u32,
    waves_cleared: u32,
}

impl ScoreLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            kills: 0,
            merges: 0,
            waves_cleared: 0,
        }
    }

    /// Records a kill and returns the new score.
    pub fn record_kill(&mut self) -> u64 {
        self.kills = self.kills.saturating_add(1);
        self.add(KILL_SCORE)
    }

    /// Records a merge and returns the new score.
    pub fn record_merge(&mut self) -> u64 {
        self.merges = self.merges.saturating_add(1);
        self.add(MERGE_SCORE)
    }

    /// Records a cleared wave and returns the new score.
    pub fn record_wave_clear(&mut self, wave: u32) -> u64 {
        self.waves_cleared = self.waves_cleared.saturating_add(1);
        self.add(WAVE_CLEAR_SCORE * u64::from(wave))
    }

    /// Awards the victory bonus of one extra clear of the final wave.
    pub fn record_victory(&mut self, final_wave: u32) -> u64 {
        self.add(WAVE_CLEAR_SCORE * u64::from(final_wave))
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Enemies killed.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// Merges performed.
    #[must_use]
    pub const fn merges(&self) -> u32 {
        self.merges
    }

    /// Waves cleared.
    #[must_use]
    pub const fn waves_cleared(&self) -> u32 {
        self.waves_cleared
    }

    fn add(&mut self, points: u64) -> u64 {
        self.score = self.score.saturating_add(points);
        self.score
    }
}
