//! Table configuration.

use serde::{Deserialize, Serialize};

use crate::game::chips::Chips;
use crate::game::MAX_SEATS;

/// Stakes and seating limits for one table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub name: String,
    pub max_seats: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Main Table".to_string(),
            max_seats: 9,
            small_blind: Chips::ONE,
            big_blind: Chips::TWO,
            min_buy_in: Chips::from(40),
            max_buy_in: Chips::from(200),
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("table name must not be empty".to_string());
        }
        if self.max_seats < 2 || self.max_seats > MAX_SEATS {
            return Err(format!("max seats must be between 2 and {MAX_SEATS}"));
        }
        if self.small_blind <= Chips::ZERO {
            return Err("small blind must be positive".to_string());
        }
        if self.big_blind <= self.small_blind {
            return Err("big blind must be greater than the small blind".to_string());
        }
        if self.min_buy_in < self.big_blind {
            return Err("min buy-in must cover at least the big blind".to_string());
        }
        if self.max_buy_in <= self.min_buy_in {
            return Err("max buy-in must be greater than the min buy-in".to_string());
        }
        Ok(())
    }

    /// True when `amount` is an acceptable buy-in or re-buy.
    pub fn buy_in_in_range(&self, amount: Chips) -> bool {
        amount >= self.min_buy_in && amount <= self.max_buy_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(TableConfig::default().validate(), Ok(()));
    }

    #[test]
    fn blind_ordering_is_enforced() {
        let config = TableConfig {
            small_blind: dec!(2),
            big_blind: dec!(2),
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn buy_in_limits_are_enforced() {
        let config = TableConfig {
            min_buy_in: dec!(200),
            max_buy_in: dec!(100),
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TableConfig::default();
        assert!(config.buy_in_in_range(dec!(40)));
        assert!(config.buy_in_in_range(dec!(200)));
        assert!(!config.buy_in_in_range(dec!(39.99)));
        assert!(!config.buy_in_in_range(dec!(200.01)));
    }

    #[test]
    fn seat_count_bounds() {
        let config = TableConfig {
            max_seats: 1,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
        let config = TableConfig {
            max_seats: MAX_SEATS + 1,
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_name_is_rejected() {
        let config = TableConfig {
            name: "   ".into(),
            ..TableConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
