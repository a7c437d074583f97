use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use domain::placement::price_placement;
use domain::user::username_from_email;
use domain::{
    NewProduct, Order, OrderStatus, OrderSummary, PlacementReceipt, PlacementRequest, Product,
    ProductListing, ProductRead, User,
};
use tokio::sync::{Mutex, RwLock};

use crate::{Result, store::Store};

/// In-memory store implementation for testing and local runs.
///
/// Provides the same interface and the same placement discipline as the
/// PostgreSQL implementation: a per-product `tokio` mutex plays the role
/// of the row-level lock, acquired in the global product order, and the
/// commit happens under a single state write lock so the order, its
/// lines, and the stock decrements become visible together.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
    reservations: Arc<Mutex<HashMap<ProductId, Arc<Mutex<()>>>>>,
}

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    stock: HashMap<ProductId, i64>,
    users: HashMap<UserId, User>,
    orders: Vec<Order>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of committed orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the current stock for a product, if it exists.
    pub async fn stock_quantity(&self, product_id: ProductId) -> Option<i64> {
        self.state.read().await.stock.get(&product_id).copied()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn place_order(&self, request: PlacementRequest) -> Result<PlacementReceipt> {
        request.validate()?;

        // Acquire the per-product reservations in the global lock order.
        // Holding them pins price and stock for every referenced product
        // until the commit below.
        let mut guards = Vec::new();
        for product_id in request.lock_order() {
            let slot = {
                let mut reservations = self.reservations.lock().await;
                reservations.entry(product_id).or_default().clone()
            };
            guards.push(slot.lock_owned().await);
        }

        let reads: Vec<ProductRead> = {
            let state = self.state.read().await;
            request
                .lock_order()
                .into_iter()
                .filter_map(|product_id| {
                    let product = state.products.get(&product_id)?;
                    Some(ProductRead {
                        product_id,
                        price: product.price,
                        stock_quantity: state.stock.get(&product_id).copied().unwrap_or(0),
                    })
                })
                .collect()
        };

        let draft = price_placement(&request, &reads)?;

        let order = Order {
            order_id: OrderId::new(),
            user_id: request.user_id,
            total_amount: draft.total_amount,
            status: OrderStatus::Created,
            created_at: Utc::now(),
            lines: draft.lines.clone(),
        };
        let receipt = PlacementReceipt {
            order_id: order.order_id,
            total_amount: order.total_amount,
            lines: draft.lines,
        };

        // Commit: everything becomes visible under one write lock.
        {
            let mut state = self.state.write().await;
            for (product_id, quantity) in &draft.demand {
                if let Some(stock) = state.stock.get_mut(product_id) {
                    *stock -= quantity;
                    debug_assert!(*stock >= 0);
                }
            }
            state.orders.push(order);
        }

        Ok(receipt)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .map(|o| OrderSummary {
                order_id: o.order_id,
                total_amount: o.total_amount,
                status: o.status,
                created_at: o.created_at,
            })
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<ProductListing>> {
        let state = self.state.read().await;
        let mut listings: Vec<ProductListing> = state
            .products
            .values()
            .map(|p| ProductListing {
                product_id: p.product_id,
                name: p.name.clone(),
                description: p.description.clone(),
                price: p.price,
                currency: p.currency.clone(),
                stock_quantity: state.stock.get(&p.product_id).copied().unwrap_or(0),
            })
            .collect();
        listings.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listings)
    }

    async fn add_product(&self, new_product: NewProduct) -> Result<Product> {
        let product = Product {
            product_id: ProductId::new(),
            name: new_product.name,
            description: new_product.description,
            price: new_product.price,
            currency: new_product.currency,
        };

        let mut state = self.state.write().await;
        state
            .stock
            .insert(product.product_id, new_product.stock_quantity);
        state.products.insert(product.product_id, product.clone());
        Ok(product)
    }

    async fn find_or_create_user(&self, email: &str) -> Result<(User, bool)> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.values().find(|u| u.email == email) {
            return Ok((user.clone(), false));
        }

        let user = User {
            user_id: UserId::new(),
            email: email.to_string(),
            username: username_from_email(email),
            created_at: Utc::now(),
        };
        state.users.insert(user.user_id, user.clone());
        Ok((user, true))
    }
}
