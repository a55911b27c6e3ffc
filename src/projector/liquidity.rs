//! Pool-level swaps and liquidity moves. Amounts are converted to USD through the pool's
//! price feed; when a price cannot be read the event still counts as a user action but
//! adds nothing to the totals.

use super::{Projector, ProjectorError};
use crate::domain::{
    ActionKind, Address, Amount, Pool, PoolDailyData, Protocol, ProtocolDailyData,
};
use crate::events::{AddLiquidity, EventMeta, PoolSwap, RemoveLiquidity};
use tracing::{debug, warn};

/// Scale of the pool's admin fee ratio.
const FEE_PRECISION_DECIMALS: u32 = 10;

/// Everything a liquidity handler mutates.
struct Books {
    pool: Pool,
    protocol: Protocol,
    pool_daily: PoolDailyData,
    protocol_daily: ProtocolDailyData,
}

impl Books {
    fn add_fee(&mut self, fee: &Amount) {
        self.pool.total_fee = self.pool.total_fee.increment(fee);
        self.protocol.total_fee = self.protocol.total_fee.increment(fee);
        self.protocol_daily.cumulative_fee = self.protocol.total_fee.clone();
    }

    /// Liquidity fees stay with the pool; the protocol total is only mirrored.
    fn add_pool_fee(&mut self, fee: &Amount) {
        self.pool.total_fee = self.pool.total_fee.increment(fee);
        self.protocol_daily.cumulative_fee = self.protocol.total_fee.clone();
    }

    fn add_volume(&mut self, volume: &Amount) {
        self.pool.total_volume = self.pool.total_volume.increment(volume);
        self.protocol.total_volume = self.protocol.total_volume.increment(volume);
        self.protocol_daily.cumulative_volume = self.protocol.total_volume.clone();
    }
}

impl Projector {
    async fn open_books(
        &self,
        meta: &EventMeta,
        event: &'static str,
    ) -> Result<Option<Books>, ProjectorError> {
        let Some(pool) = self.repo.load_pool(&meta.address).await? else {
            debug!(pool = %meta.address, event, "event on unknown pool ignored");
            return Ok(None);
        };
        let Some(protocol) = self.repo.load_protocol().await? else {
            debug!(event, "event before protocol exists ignored");
            return Ok(None);
        };
        let pool_daily = self.refresh_pool_daily(&pool, meta.block_timestamp).await?;
        let protocol_daily = self
            .load_or_create_protocol_daily(meta.block_timestamp)
            .await?;
        Ok(Some(Books {
            pool,
            protocol,
            pool_daily,
            protocol_daily,
        }))
    }

    async fn close_books(
        &self,
        mut books: Books,
        meta: &EventMeta,
        kind: ActionKind,
    ) -> Result<(), ProjectorError> {
        self.record_user_action(
            &mut books.protocol_daily,
            &meta.tx_from,
            kind,
            meta.block_timestamp,
        )
        .await?;
        self.repo.save_pool_daily(&books.pool_daily).await?;
        self.repo.save_protocol_daily(&books.protocol_daily).await?;
        self.repo.save_pool(&books.pool).await?;
        self.repo.save_protocol(&books.protocol).await?;
        Ok(())
    }

    /// Price of `token` from the feed configured on `pool`.
    async fn pool_token_price(&self, pool: &Address, token: &Address) -> Option<Amount> {
        let oracle = match self.chain.oracle(pool).await {
            Ok(oracle) => oracle,
            Err(e) => {
                warn!(%pool, error = %e, "oracle read failed");
                return None;
            }
        };
        match self.chain.get_price(&oracle, token).await {
            Ok(price) => Some(price),
            Err(e) => {
                warn!(%oracle, %token, error = %e, "price read failed");
                None
            }
        }
    }

    pub(super) async fn handle_pool_swap(
        &self,
        meta: &EventMeta,
        event: &PoolSwap,
    ) -> Result<(), ProjectorError> {
        let Some(mut books) = self.open_books(meta, "Swap").await? else {
            return Ok(());
        };

        let price_in = self.pool_token_price(&meta.address, &event.token_in).await;
        let price_out = self.pool_token_price(&meta.address, &event.token_out).await;
        if let (Some(price_in), Some(price_out)) = (price_in, price_out) {
            let volume = (&event.amount_in * &price_in + &event.amount_out * &price_out)
                .checked_div(&Amount::from(2i64))
                .unwrap_or_default();
            let fee = &event.fee * &price_out;

            books.add_volume(&volume);
            books.add_fee(&fee);
            books.pool_daily.swap_volume = books.pool_daily.swap_volume.increment(&volume);
            books.pool_daily.swap_fee = books.pool_daily.swap_fee.increment(&fee);
            books.protocol_daily.swap_volume = books.protocol_daily.swap_volume.increment(&volume);
            books.protocol_daily.swap_fee = books.protocol_daily.swap_fee.increment(&fee);
            debug!(pool = %meta.address, %volume, %fee, "swap booked");
        }

        self.close_books(books, meta, ActionKind::Swap).await
    }

    pub(super) async fn handle_add_liquidity(
        &self,
        meta: &EventMeta,
        event: &AddLiquidity,
    ) -> Result<(), ProjectorError> {
        let Some(mut books) = self.open_books(meta, "AddLiquidity").await? else {
            return Ok(());
        };

        if let Some(price) = self.pool_token_price(&meta.address, &event.token).await {
            let value = &event.amount * &price;
            let fee = &event.fee * &price;

            books.add_pool_fee(&fee);
            books.pool_daily.mint_lp_value = books.pool_daily.mint_lp_value.increment(&value);
            books.pool_daily.mint_lp_fee = books.pool_daily.mint_lp_fee.increment(&fee);
            books.protocol_daily.mint_lp_value =
                books.protocol_daily.mint_lp_value.increment(&value);
            books.protocol_daily.mint_lp_fee = books.protocol_daily.mint_lp_fee.increment(&fee);
            debug!(pool = %meta.address, %value, %fee, "liquidity added");
        }

        self.close_books(books, meta, ActionKind::Mint).await
    }

    pub(super) async fn handle_remove_liquidity(
        &self,
        meta: &EventMeta,
        event: &RemoveLiquidity,
    ) -> Result<(), ProjectorError> {
        let Some(mut books) = self.open_books(meta, "RemoveLiquidity").await? else {
            return Ok(());
        };

        if let Some(price) = self.pool_token_price(&meta.address, &event.token).await {
            let value = &event.amount_out * &price;
            let fee = match self.chain.admin_fee(&meta.address).await {
                Ok(admin_fee) => {
                    let scaled = &(&event.fee * &Amount::pow10(FEE_PRECISION_DECIMALS)) * &price;
                    scaled.checked_div(&admin_fee).unwrap_or_else(|| {
                        warn!(pool = %meta.address, "admin fee is zero, burn fee skipped");
                        Amount::zero()
                    })
                }
                Err(e) => {
                    warn!(pool = %meta.address, error = %e, "admin fee read failed");
                    Amount::zero()
                }
            };

            books.add_pool_fee(&fee);
            books.pool_daily.burn_lp_value = books.pool_daily.burn_lp_value.increment(&value);
            books.pool_daily.burn_lp_fee = books.pool_daily.burn_lp_fee.increment(&fee);
            books.protocol_daily.burn_lp_value =
                books.protocol_daily.burn_lp_value.increment(&value);
            books.protocol_daily.burn_lp_fee = books.protocol_daily.burn_lp_fee.increment(&fee);
            debug!(pool = %meta.address, %value, %fee, "liquidity removed");
        }

        self.close_books(books, meta, ActionKind::Burn).await
    }
}
