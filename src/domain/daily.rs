//! Daily rollup records and the bucket arithmetic behind their ids.

use super::{ActionKind, Address, Amount};
use serde::Serialize;

/// Length of one rollup bucket in seconds.
pub const DAY_SECONDS: i64 = 60 * 60 * 24;

/// Start of the UTC day containing `timestamp` (seconds).
pub fn bucket_of(timestamp: i64) -> i64 {
    timestamp.div_euclid(DAY_SECONDS) * DAY_SECONDS
}

/// `<scope>-day-<bucket>`; the protocol scope is the empty prefix.
fn daily_id(scope: Option<&str>, timestamp: i64) -> String {
    match scope {
        Some(scope) => format!("{}-day-{}", scope, bucket_of(timestamp)),
        None => format!("day-{}", bucket_of(timestamp)),
    }
}

pub fn pool_daily_id(pool: &Address, timestamp: i64) -> String {
    daily_id(Some(pool.as_str()), timestamp)
}

pub fn protocol_daily_id(timestamp: i64) -> String {
    daily_id(None, timestamp)
}

pub fn user_daily_id(user: &Address, timestamp: i64) -> String {
    daily_id(Some(user.as_str()), timestamp)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDailyData {
    pub id: String,
    pub pool: Address,
    /// Bucket start.
    pub timestamp: i64,
    pub pool_value: Amount,
    pub total_supply: Amount,
    pub swap_volume: Amount,
    pub swap_fee: Amount,
    pub mint_lp_value: Amount,
    pub mint_lp_fee: Amount,
    pub burn_lp_value: Amount,
    pub burn_lp_fee: Amount,
    pub liquidated_value: Amount,
    pub liquidated_fee: Amount,
    pub trading_volume: Amount,
    pub trading_fee: Amount,
    /// Pooled value per whitelisted token, indexed like the pool's whitelist.
    pub token_distributions: Vec<Amount>,
    pub total_long_positions: Amount,
    pub total_short_positions: Amount,
}

impl PoolDailyData {
    pub fn new(pool: Address, timestamp: i64, token_count: usize) -> Self {
        Self {
            id: pool_daily_id(&pool, timestamp),
            pool,
            timestamp: bucket_of(timestamp),
            pool_value: Amount::zero(),
            total_supply: Amount::zero(),
            swap_volume: Amount::zero(),
            swap_fee: Amount::zero(),
            mint_lp_value: Amount::zero(),
            mint_lp_fee: Amount::zero(),
            burn_lp_value: Amount::zero(),
            burn_lp_fee: Amount::zero(),
            liquidated_value: Amount::zero(),
            liquidated_fee: Amount::zero(),
            trading_volume: Amount::zero(),
            trading_fee: Amount::zero(),
            token_distributions: vec![Amount::zero(); token_count],
            total_long_positions: Amount::zero(),
            total_short_positions: Amount::zero(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolDailyData {
    pub id: String,
    pub timestamp: i64,
    pub swap_volume: Amount,
    pub swap_fee: Amount,
    pub mint_lp_value: Amount,
    pub mint_lp_fee: Amount,
    pub burn_lp_value: Amount,
    pub burn_lp_fee: Amount,
    pub liquidated_value: Amount,
    pub liquidated_fee: Amount,
    pub trading_volume: Amount,
    pub trading_fee: Amount,
    pub total_long_positions: Amount,
    pub total_short_positions: Amount,
    pub profit: Amount,
    pub loss: Amount,
    pub cumulative_loss: Amount,
    pub cumulative_profit: Amount,
    pub cumulative_volume: Amount,
    pub cumulative_fee: Amount,
    pub swap_count: i32,
    pub burn_lp_count: i32,
    pub mint_lp_count: i32,
    pub trade_count: i32,
    pub unique_swap_count: i32,
    pub unique_mint_lp_count: i32,
    pub unique_burn_lp_count: i32,
    pub unique_trade_count: i32,
    pub unique_user_count: i32,
}

impl ProtocolDailyData {
    pub fn new(timestamp: i64) -> Self {
        Self {
            id: protocol_daily_id(timestamp),
            timestamp: bucket_of(timestamp),
            swap_volume: Amount::zero(),
            swap_fee: Amount::zero(),
            mint_lp_value: Amount::zero(),
            mint_lp_fee: Amount::zero(),
            burn_lp_value: Amount::zero(),
            burn_lp_fee: Amount::zero(),
            liquidated_value: Amount::zero(),
            liquidated_fee: Amount::zero(),
            trading_volume: Amount::zero(),
            trading_fee: Amount::zero(),
            total_long_positions: Amount::zero(),
            total_short_positions: Amount::zero(),
            profit: Amount::zero(),
            loss: Amount::zero(),
            cumulative_loss: Amount::zero(),
            cumulative_profit: Amount::zero(),
            cumulative_volume: Amount::zero(),
            cumulative_fee: Amount::zero(),
            swap_count: 0,
            burn_lp_count: 0,
            mint_lp_count: 0,
            trade_count: 0,
            unique_swap_count: 0,
            unique_mint_lp_count: 0,
            unique_burn_lp_count: 0,
            unique_trade_count: 0,
            unique_user_count: 0,
        }
    }

    /// Count one action; `first_today` also bumps the matching unique counter.
    pub fn count_action(&mut self, kind: ActionKind, first_today: bool) {
        let (count, unique) = match kind {
            ActionKind::Swap => (&mut self.swap_count, &mut self.unique_swap_count),
            ActionKind::Mint => (&mut self.mint_lp_count, &mut self.unique_mint_lp_count),
            ActionKind::Burn => (&mut self.burn_lp_count, &mut self.unique_burn_lp_count),
            ActionKind::Trade => (&mut self.trade_count, &mut self.unique_trade_count),
        };
        if first_today {
            *unique += 1;
        }
        *count += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDailyData {
    pub id: String,
    pub address: Address,
    pub timestamp: i64,
    pub swap_count: i32,
    pub burn_lp_count: i32,
    pub mint_lp_count: i32,
    pub trade_count: i32,
}

impl UserDailyData {
    pub fn new(address: Address, timestamp: i64) -> Self {
        Self {
            id: user_daily_id(&address, timestamp),
            address,
            timestamp: bucket_of(timestamp),
            swap_count: 0,
            burn_lp_count: 0,
            mint_lp_count: 0,
            trade_count: 0,
        }
    }

    fn counter_mut(&mut self, kind: ActionKind) -> &mut i32 {
        match kind {
            ActionKind::Swap => &mut self.swap_count,
            ActionKind::Mint => &mut self.mint_lp_count,
            ActionKind::Burn => &mut self.burn_lp_count,
            ActionKind::Trade => &mut self.trade_count,
        }
    }

    pub fn count(&self, kind: ActionKind) -> i32 {
        match kind {
            ActionKind::Swap => self.swap_count,
            ActionKind::Mint => self.mint_lp_count,
            ActionKind::Burn => self.burn_lp_count,
            ActionKind::Trade => self.trade_count,
        }
    }

    /// Count one action and report whether it was the first of its kind today.
    pub fn count_action(&mut self, kind: ActionKind) -> bool {
        let counter = self.counter_mut(kind);
        let first_today = *counter == 0;
        *counter += 1;
        first_today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_of_floors_to_day() {
        assert_eq!(bucket_of(0), 0);
        assert_eq!(bucket_of(86_399), 0);
        assert_eq!(bucket_of(86_400), 86_400);
        assert_eq!(bucket_of(1_700_000_000), 1_699_920_000);
    }

    #[test]
    fn test_bucket_of_idempotent_and_monotone() {
        let samples = [0, 1, 86_399, 86_400, 100_000, 1_700_000_000, 1_700_086_399];
        for t in samples {
            assert_eq!(bucket_of(bucket_of(t)), bucket_of(t));
        }
        for pair in samples.windows(2) {
            assert!(bucket_of(pair[0]) <= bucket_of(pair[1]));
        }
    }

    #[test]
    fn test_daily_ids() {
        let pool = Address::parse("0x1111111111111111111111111111111111111111").unwrap();
        assert_eq!(
            pool_daily_id(&pool, 90_000),
            "0x1111111111111111111111111111111111111111-day-86400"
        );
        assert_eq!(protocol_daily_id(90_000), "day-86400");
    }

    #[test]
    fn test_user_daily_count_action_reports_first() {
        let user = Address::parse("0x2222222222222222222222222222222222222222").unwrap();
        let mut daily = UserDailyData::new(user, 10);
        assert!(daily.count_action(ActionKind::Swap));
        assert!(!daily.count_action(ActionKind::Swap));
        assert!(daily.count_action(ActionKind::Mint));
        assert_eq!(daily.count(ActionKind::Swap), 2);
    }

    #[test]
    fn test_protocol_daily_count_action() {
        let mut daily = ProtocolDailyData::new(10);
        daily.count_action(ActionKind::Trade, true);
        daily.count_action(ActionKind::Trade, false);
        assert_eq!(daily.trade_count, 2);
        assert_eq!(daily.unique_trade_count, 1);
    }

    #[test]
    fn test_pool_daily_new_sizes_distributions() {
        let pool = Address::parse("0x1111111111111111111111111111111111111111").unwrap();
        let daily = PoolDailyData::new(pool, 90_000, 3);
        assert_eq!(daily.token_distributions.len(), 3);
        assert_eq!(daily.timestamp, 86_400);
    }
}
