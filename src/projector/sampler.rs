//! Per-block persistence and LP token price sampling.

use super::{Projector, ProjectorError};
use crate::domain::Block;
use tracing::{debug, warn};

impl Projector {
    /// Store the block header, then refresh LP token prices.
    ///
    /// Tokens are visited in configured order. The first token still inside its skip window,
    /// or whose reads fail, ends sampling for the whole block.
    pub async fn handle_block(&self, block: &Block) -> Result<(), ProjectorError> {
        self.repo.save_block(block).await?;

        for lp_token in &self.config.lp_tokens {
            let mut token = self.load_or_create_token(lp_token).await?;
            if block.number - token.last_updated_block <= self.config.skip_blocks {
                debug!(
                    token = %lp_token,
                    block = block.number,
                    last_updated_block = token.last_updated_block,
                    "inside skip window, sampling stopped"
                );
                return Ok(());
            }

            let pool = match self.chain.minter(lp_token).await {
                Ok(pool) => pool,
                Err(e) => {
                    warn!(token = %lp_token, error = %e, "minter read failed, sampling stopped");
                    return Ok(());
                }
            };
            let pool_value = match self.chain.pool_value(&pool).await {
                Ok(value) => value,
                Err(e) => {
                    warn!(%pool, error = %e, "pool value read failed, sampling stopped");
                    return Ok(());
                }
            };
            let supply = match self.chain.total_supply(lp_token).await {
                Ok(supply) if supply.is_positive() => supply,
                Ok(_) => {
                    debug!(token = %lp_token, "zero supply, sampling stopped");
                    return Ok(());
                }
                Err(e) => {
                    warn!(token = %lp_token, error = %e, "supply read failed, sampling stopped");
                    return Ok(());
                }
            };

            let Some(price) = pool_value.checked_div(&supply) else {
                return Ok(());
            };
            token.price = price;
            token.last_updated_block = block.number;
            self.repo.save_token(&token).await?;
            debug!(
                token = %lp_token,
                block = block.number,
                price = %token.price,
                "lp price sampled"
            );
        }
        Ok(())
    }
}
