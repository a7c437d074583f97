use async_trait::async_trait;
use common::UserId;
use domain::{NewProduct, OrderSummary, PlacementReceipt, PlacementRequest, Product, ProductListing, User};

use crate::Result;

/// Core trait for storefront storage backends.
///
/// All implementations must be thread-safe (`Send + Sync`); handlers run
/// on arbitrary tokio tasks.
#[async_trait]
pub trait Store: Send + Sync {
    /// Places an order atomically.
    ///
    /// Validates the request, reserves every referenced product in the
    /// deterministic lock order, checks accumulated demand against
    /// stock, and commits the order row, its lines, and the stock
    /// decrements together. On any failure the whole unit rolls back as
    /// if never attempted; no partial state is ever observable.
    ///
    /// Returns the new order id, the exact total charged, and the
    /// per-line prices captured at placement.
    async fn place_order(&self, request: PlacementRequest) -> Result<PlacementReceipt>;

    /// Lists a user's past orders, oldest first.
    ///
    /// A read-only operation; a user with no orders yields an empty list.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>>;

    /// Lists all products joined with their current stock.
    async fn list_products(&self) -> Result<Vec<ProductListing>>;

    /// Inserts a product together with its opening inventory row.
    async fn add_product(&self, new_product: NewProduct) -> Result<Product>;

    /// Looks a user up by email, creating them if absent.
    ///
    /// Returns the user and `true` if a new row was created, `false` if
    /// the email already existed.
    async fn find_or_create_user(&self, email: &str) -> Result<(User, bool)>;
}
