//! Session-related types.

use chrono::{DateTime, Utc};
use roomily_core::OrderId;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session keys for storefront data.
pub mod keys {
    /// Key for the shopping cart.
    pub const CART: &str = "cart";

    /// Key for the orders placed in this session.
    pub const PLACED_ORDERS: &str = "placed_orders";
}

/// Orders remembered per session.
const MAX_PLACED_ORDERS: usize = 20;

/// An order this session placed.
///
/// Order pages show names and addresses, so they are only served to the
/// session that created the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub placed_at: DateTime<Utc>,
}

/// Remember a freshly placed order.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn remember_order(
    session: &Session,
    order: PlacedOrder,
) -> Result<(), tower_sessions::session::Error> {
    let mut orders = placed_orders(session).await;
    orders.retain(|placed| placed.id != order.id);
    orders.push(order);
    if orders.len() > MAX_PLACED_ORDERS {
        orders.drain(..orders.len() - MAX_PLACED_ORDERS);
    }
    session.insert(keys::PLACED_ORDERS, orders).await
}

/// Look up an order placed by this session.
pub async fn placed_order(session: &Session, id: OrderId) -> Option<PlacedOrder> {
    placed_orders(session)
        .await
        .into_iter()
        .find(|placed| placed.id == id)
}

async fn placed_orders(session: &Session) -> Vec<PlacedOrder> {
    session
        .get::<Vec<PlacedOrder>>(keys::PLACED_ORDERS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_remember_and_find_order() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let order = PlacedOrder {
            id: OrderId::new(42),
            placed_at: Utc::now(),
        };

        assert!(placed_order(&session, order.id).await.is_none());
        remember_order(&session, order).await.unwrap();
        assert_eq!(placed_order(&session, order.id).await, Some(order));
    }

    #[tokio::test]
    async fn test_keeps_most_recent_orders() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        for id in 0..25 {
            remember_order(
                &session,
                PlacedOrder {
                    id: OrderId::new(id),
                    placed_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        }

        assert!(placed_order(&session, OrderId::new(0)).await.is_none());
        assert!(placed_order(&session, OrderId::new(24)).await.is_some());
    }
}
