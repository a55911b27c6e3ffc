mod common;

use common::*;
use perpindex::chain::{MockChainReader, SwapOrder};
use perpindex::config::ProjectorConfig;
use perpindex::domain::{
    Direction, HistoryStatus, OrderStatus, OrderType, Side, UpdateType,
};
use perpindex::events::{
    EventKind, OrderCancelled, OrderExecuted, OrderExecutedWithOrder, OrderExpired,
    OrderManagerSwap, PlacedOrder, SwapOrderExecuted, SwapOrderPlaced,
};

fn priced_chain() -> MockChainReader {
    let oracle = addr('0');
    MockChainReader::new()
        .with_oracle(order_manager(), oracle.clone())
        .with_price(oracle, addr('c'), amt(3))
}

#[tokio::test]
async fn test_limit_order_place_then_cancel() {
    let mut h = Harness::new(priced_chain()).await;
    h.add_pool().await;

    h.apply(order_manager(), T0 + 10, 0, order_placed('5', Side::Long, 0, 1900, 0))
        .await;

    let k = key('5');
    let order = h.repo.load_order(k.as_str()).await.unwrap().unwrap();
    assert_eq!(order.order_type, OrderType::Limit);
    assert_eq!(order.update_type, UpdateType::Increase);
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.collateral_value, Some(amt(30)));
    assert_eq!(order.submission_timestamp, T0 + 10);
    let index = h.repo.load_order_index(k.as_str()).await.unwrap().unwrap();
    assert_eq!(index.direction, Direction::Bid);
    assert_eq!(index.trigger_price, amt(1900));
    assert_eq!(
        h.repo.load_user(&trader()).await.unwrap().unwrap().order_count,
        1
    );

    h.apply(
        order_manager(),
        T0 + 20,
        0,
        EventKind::OrderCancelled(OrderCancelled { key: k.clone() }),
    )
    .await;

    let order = h.repo.load_order(k.as_str()).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    let index = h.repo.load_order_index(k.as_str()).await.unwrap().unwrap();
    assert_eq!(index.status, OrderStatus::Cancelled);
    assert_eq!(
        h.repo.load_user(&trader()).await.unwrap().unwrap().order_count,
        0
    );

    let histories = h.repo.list_histories_for_key(k.as_str()).await.unwrap();
    let statuses: Vec<_> = histories.iter().map(|h| h.status).collect();
    assert_eq!(statuses, vec![HistoryStatus::Open, HistoryStatus::Cancelled]);
}

#[tokio::test]
async fn test_market_order_leaves_order_count_alone() {
    let mut h = Harness::new(priced_chain()).await;
    h.add_pool().await;

    h.apply(order_manager(), T0, 1, order_placed('5', Side::Short, 1, 1900, T0 + 60))
        .await;

    let order = h.repo.load_order(key('5').as_str()).await.unwrap().unwrap();
    assert_eq!(order.order_type, OrderType::Market);
    assert_eq!(order.update_type, UpdateType::Decrease);
    // decreases keep the raw collateral
    assert_eq!(order.collateral_value, Some(amt(10)));
    let index = h
        .repo
        .load_order_index(key('5').as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(index.direction, Direction::Ask);
    assert!(h.repo.load_user(&trader()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_collateral_value_zero_without_price() {
    let mut h = Harness::new(MockChainReader::new()).await;
    h.apply(order_manager(), T0, 0, order_placed('5', Side::Long, 0, 1900, 0))
        .await;

    let order = h.repo.load_order(key('5').as_str()).await.unwrap().unwrap();
    assert_eq!(order.collateral_value, Some(amt(0)));
}

#[tokio::test]
async fn test_execution_shapes() {
    let mut h = Harness::new(priced_chain()).await;
    h.add_pool().await;
    h.apply(order_manager(), T0, 1, order_placed('5', Side::Long, 0, 1900, 0))
        .await;
    h.apply(order_manager(), T0, 2, order_placed('6', Side::Long, 0, 1800, 0))
        .await;

    h.apply(
        order_manager(),
        T0 + 30,
        0,
        EventKind::OrderExecuted(OrderExecuted {
            key: key('5'),
            fill_price: amt(1895),
        }),
    )
    .await;
    let filled = h.repo.load_order(key('5').as_str()).await.unwrap().unwrap();
    assert_eq!(filled.status, OrderStatus::Filled);
    assert_eq!(filled.execution_price, amt(1895));
    assert_eq!(filled.execution_timestamp, T0 + 30);

    h.apply(
        order_manager(),
        T0 + 40,
        0,
        EventKind::OrderExecutedWithOrder(OrderExecutedWithOrder {
            key: key('6'),
            order: PlacedOrder {
                owner: trader(),
                pool: pool(),
                index_token: addr('d'),
                collateral_token: addr('c'),
                pay_token: addr('c'),
                expires_at: amt(0),
                submission_block: 100,
                price: amt(1799),
                execution_fee: amt(1),
                trigger_above_threshold: false,
            },
        }),
    )
    .await;
    let filled = h.repo.load_order(key('6').as_str()).await.unwrap().unwrap();
    assert_eq!(filled.execution_price, amt(1799));
    assert_eq!(
        h.repo
            .load_order_index(key('6').as_str())
            .await
            .unwrap()
            .unwrap()
            .status,
        OrderStatus::Filled
    );
    assert_eq!(
        h.repo.load_user(&trader()).await.unwrap().unwrap().order_count,
        0
    );
}

#[tokio::test]
async fn test_redelivered_terminal_event_does_not_double_decrement() {
    let mut h = Harness::new(priced_chain()).await;
    h.add_pool().await;
    h.apply(order_manager(), T0, 1, order_placed('5', Side::Long, 0, 1900, 0))
        .await;

    for ts in [T0 + 10, T0 + 20] {
        h.apply(
            order_manager(),
            ts,
            0,
            EventKind::OrderExpired(OrderExpired { key: key('5') }),
        )
        .await;
    }

    assert_eq!(
        h.repo.load_user(&trader()).await.unwrap().unwrap().order_count,
        0
    );
    let histories = h.repo.list_histories_for_key(key('5').as_str()).await.unwrap();
    assert_eq!(histories.len(), 3);
    assert_eq!(histories[2].status, HistoryStatus::Expired);
}

#[tokio::test]
async fn test_same_second_history_rows_are_kept() {
    let mut h = Harness::new(priced_chain()).await;
    h.add_pool().await;
    h.apply(order_manager(), T0 + 5, 3, order_placed('5', Side::Long, 0, 1900, 0))
        .await;
    h.apply(
        order_manager(),
        T0 + 5,
        4,
        EventKind::OrderCancelled(OrderCancelled { key: key('5') }),
    )
    .await;

    let histories = h.repo.list_histories_for_key(key('5').as_str()).await.unwrap();
    assert_eq!(histories.len(), 2);
    let base = format!("{}-{}", key('5'), T0 + 5);
    assert!(histories.iter().any(|h| h.id == base));
    assert!(histories.iter().any(|h| h.id == format!("{}-4", base)));
}

#[tokio::test]
async fn test_cancel_of_unknown_order_is_noop() {
    let mut h = Harness::new(MockChainReader::new()).await;
    h.apply(
        order_manager(),
        T0,
        0,
        EventKind::OrderCancelled(OrderCancelled { key: key('7') }),
    )
    .await;

    assert!(h.repo.load_order(key('7').as_str()).await.unwrap().is_none());
    assert!(h
        .repo
        .list_histories_for_key(key('7').as_str())
        .await
        .unwrap()
        .is_empty());
}

fn swap_order() -> SwapOrder {
    SwapOrder {
        owner: trader(),
        pool: pool(),
        token_in: addr('c'),
        token_out: addr('d'),
        amount_in: amt(100),
        min_amount_out: amt(90),
        price: amt(42),
        execution_fee: amt(1),
    }
}

#[tokio::test]
async fn test_swap_order_lifecycle() {
    let chain = MockChainReader::new().with_swap_order(order_manager(), key('8'), swap_order());
    let mut h = Harness::new(chain).await;
    h.add_pool().await;

    h.apply(
        order_manager(),
        T0 + 10,
        0,
        EventKind::SwapOrderPlaced(SwapOrderPlaced { key: key('8') }),
    )
    .await;

    let id = format!("{}-SWAP", key('8'));
    let order = h.repo.load_order(&id).await.unwrap().unwrap();
    assert_eq!(order.update_type, UpdateType::Swap);
    assert_eq!(order.order_type, OrderType::Limit);
    assert_eq!(order.submission_block, (T0 + 10) / 12);
    assert!(h.repo.load_order_index(&id).await.unwrap().is_none());
    assert_eq!(
        h.repo.load_user(&trader()).await.unwrap().unwrap().order_count,
        1
    );

    h.apply(
        order_manager(),
        T0 + 20,
        0,
        EventKind::SwapOrderExecuted(SwapOrderExecuted {
            key: key('8'),
            amount_out: amt(95),
        }),
    )
    .await;

    let order = h.repo.load_order(&id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.amount_out, Some(amt(95)));
    assert_eq!(
        h.repo.load_user(&trader()).await.unwrap().unwrap().order_count,
        0
    );

    let histories = h.repo.list_histories_for_key(key('8').as_str()).await.unwrap();
    assert_eq!(histories.len(), 2);
    assert_eq!(histories[0].trigger_price, Some(amt(42)));
    assert_eq!(histories[1].execution_price, Some(amt(42)));
    assert_eq!(histories[1].amount_out, Some(amt(95)));
}

#[tokio::test]
async fn test_swap_order_without_readable_struct_is_skipped() {
    let mut h = Harness::new(MockChainReader::new()).await;
    h.apply(
        order_manager(),
        T0,
        0,
        EventKind::SwapOrderPlaced(SwapOrderPlaced { key: key('8') }),
    )
    .await;

    let id = format!("{}-SWAP", key('8'));
    assert!(h.repo.load_order(&id).await.unwrap().is_none());
    assert!(h.repo.load_user(&trader()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_order_manager_swap_writes_history_only() {
    let mut h = Harness::new(MockChainReader::new()).await;
    h.apply(
        order_manager(),
        T0,
        2,
        EventKind::OrderManagerSwap(OrderManagerSwap {
            account: trader(),
            token_in: addr('c'),
            token_out: addr('d'),
            amount_in: amt(10),
            amount_out: amt(9),
        }),
    )
    .await;

    let id = format!("{}-{}", order_manager(), T0);
    let history = h.repo.load_history(&id).await.unwrap().unwrap();
    assert_eq!(history.status, HistoryStatus::Filled);
    assert_eq!(history.order_type, Some(OrderType::Market));
    assert_eq!(history.update_type, Some(UpdateType::Swap));
    assert_eq!(history.amount_out, Some(amt(9)));
    assert!(h
        .repo
        .load_protocol_daily(&format!("day-{}", T0))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unconfigured_order_manager_is_ignored() {
    let config = ProjectorConfig {
        order_managers: vec![order_manager()],
        ..ProjectorConfig::default()
    };
    let mut h = Harness::with_config(MockChainReader::new(), config).await;

    h.apply(addr('8'), T0, 0, order_placed('5', Side::Long, 0, 1900, 0))
        .await;
    assert!(h.repo.load_order(key('5').as_str()).await.unwrap().is_none());

    h.apply(order_manager(), T0, 1, order_placed('5', Side::Long, 0, 1900, 0))
        .await;
    assert!(h.repo.load_order(key('5').as_str()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_new_users_are_counted_on_protocol() {
    let mut h = Harness::new(priced_chain()).await;
    h.add_pool().await;
    h.apply(order_manager(), T0, 1, order_placed('5', Side::Long, 0, 1900, 0))
        .await;
    h.apply(order_manager(), T0, 2, order_placed('6', Side::Long, 0, 1900, 0))
        .await;

    let protocol = h.repo.load_protocol().await.unwrap().unwrap();
    assert_eq!(protocol.total_users, 1);
    assert_eq!(protocol.address, order_manager());
}
