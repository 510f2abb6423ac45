//! Currency ledger gating summons.

/// Tracks the player's gold balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EconomyLedger {
    gold: u32,
}

impl EconomyLedger {
    /// Creates a ledger holding the starting balance.
    #[must_use]
    pub const fn new(starting_gold: u32) -> Self {
        Self {
            gold: starting_gold,
        }
    }

    /// Current balance.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Reports whether the balance covers the cost.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.gold >= cost
    }

    /// Deducts the cost when affordable and reports whether it did.
    ///
    /// An unaffordable spend leaves the balance unchanged.
    #[must_use]
    pub fn spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.gold -= cost;
        true
    }

    /// Adds gold to the balance and returns the new balance.
    pub fn earn(&mut self, amount: u32) -> u32 {
        self.gold = self.gold.saturating_add(amount);
        self.gold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spending_beyond_balance_is_rejected_without_change() {
        let mut ledger = EconomyLedger::new(15);
        assert!(!ledger.spend(20));
        assert_eq!(ledger.gold(), 15);
        assert!(ledger.spend(15));
        assert_eq!(ledger.gold(), 0);
    }

    #[test]
    fn earning_accumulates() {
        let mut ledger = EconomyLedger::new(0);
        assert_eq!(ledger.earn(5), 5);
        assert_eq!(ledger.earn(7), 12);
        assert!(ledger.can_afford(12));
        assert!(!ledger.can_afford(13));
    }
}
