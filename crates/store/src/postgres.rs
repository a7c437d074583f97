use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, UserId};
use domain::placement::price_placement;
use domain::user::username_from_email;
use domain::{
    Money, NewProduct, OrderStatus, OrderSummary, PlacementReceipt, PlacementRequest, Product,
    ProductListing, ProductRead, User,
};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{Result, StoreError, store::Store};

/// PostgreSQL-backed store implementation.
///
/// Placement runs inside a single transaction: each referenced inventory
/// row is locked with `SELECT ... FOR UPDATE` in the global product
/// order, and the order, its lines, and the stock decrements commit
/// together. Dropping the transaction on any error path rolls everything
/// back, so a failed placement leaves no residue.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_user(row: PgRow) -> Result<User> {
        Ok(User {
            user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
            email: row.try_get("email")?,
            username: row.try_get("username")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }
}

/// Maps transient concurrency failures to [`StoreError::Conflict`].
///
/// Serialization failures (40001), deadlocks (40P01), and a trip of the
/// non-negative stock check all mean the unit rolled back with no effect
/// and the identical request may be retried.
fn conflict_or_db(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        let transient = matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
            || db.kind() == sqlx::error::ErrorKind::CheckViolation;
        if transient {
            return StoreError::Conflict {
                reason: db.message().to_string(),
            };
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl Store for PostgresStore {
    #[tracing::instrument(skip(self, request), fields(user_id = %request.user_id))]
    async fn place_order(&self, request: PlacementRequest) -> Result<PlacementReceipt> {
        request.validate()?;

        let mut tx = self.pool.begin().await?;

        // Lock each referenced inventory row in the global product order
        // and read price and stock under that lock. Missing products
        // simply produce no read; pricing reports them.
        let mut reads = Vec::new();
        for product_id in request.lock_order() {
            let row = sqlx::query(
                r#"
                SELECT p.price_cents, i.stock_quantity
                FROM products p
                JOIN inventory i ON i.product_id = p.product_id
                WHERE p.product_id = $1
                FOR UPDATE OF i
                "#,
            )
            .bind(product_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

            if let Some(row) = row {
                reads.push(ProductRead {
                    product_id,
                    price: Money::from_cents(row.try_get("price_cents")?),
                    stock_quantity: row.try_get("stock_quantity")?,
                });
            }
        }

        // Any pricing error drops `tx`, rolling the locks back.
        let draft = price_placement(&request, &reads)?;

        let order_id = OrderId::new();
        let created_at = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO orders (order_id, user_id, total_cents, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(request.user_id.as_uuid())
        .bind(draft.total_amount.cents())
        .bind(OrderStatus::Created.to_string())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for line in &draft.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price_at_time_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(i64::from(line.quantity))
            .bind(line.price_at_time.cents())
            .execute(&mut *tx)
            .await?;
        }

        for (product_id, quantity) in &draft.demand {
            sqlx::query(
                "UPDATE inventory SET stock_quantity = stock_quantity - $1 WHERE product_id = $2",
            )
            .bind(*quantity)
            .bind(product_id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(conflict_or_db)?;
        }

        tx.commit().await.map_err(conflict_or_db)?;

        Ok(PlacementReceipt {
            order_id,
            total_amount: draft.total_amount,
            lines: draft.lines,
        })
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, total_cents, status, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(OrderSummary {
                    order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
                    total_amount: Money::from_cents(row.try_get("total_cents")?),
                    status: status.parse::<OrderStatus>().map_err(StoreError::InvalidRow)?,
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                })
            })
            .collect()
    }

    async fn list_products(&self) -> Result<Vec<ProductListing>> {
        let rows = sqlx::query(
            r#"
            SELECT p.product_id, p.name, p.description, p.price_cents, p.currency,
                   COALESCE(i.stock_quantity, 0) AS stock_quantity
            FROM products p
            LEFT JOIN inventory i ON i.product_id = p.product_id
            ORDER BY p.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ProductListing {
                    product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                    name: row.try_get("name")?,
                    description: row.try_get("description")?,
                    price: Money::from_cents(row.try_get("price_cents")?),
                    currency: row.try_get("currency")?,
                    stock_quantity: row.try_get("stock_quantity")?,
                })
            })
            .collect()
    }

    async fn add_product(&self, new_product: NewProduct) -> Result<Product> {
        let product = Product {
            product_id: ProductId::new(),
            name: new_product.name,
            description: new_product.description,
            price: new_product.price,
            currency: new_product.currency,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO products (product_id, name, description, price_cents, currency)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(product.product_id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(&product.currency)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO inventory (product_id, stock_quantity) VALUES ($1, $2)")
            .bind(product.product_id.as_uuid())
            .bind(new_product.stock_quantity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(product)
    }

    async fn find_or_create_user(&self, email: &str) -> Result<(User, bool)> {
        let existing = sqlx::query(
            "SELECT user_id, email, username, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = existing {
            return Ok((Self::row_to_user(row)?, false));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (user_id, email, username, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING user_id, email, username, created_at
            "#,
        )
        .bind(UserId::new().as_uuid())
        .bind(email)
        .bind(username_from_email(email))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(row) => Ok((Self::row_to_user(row)?, true)),
            None => {
                // Lost the insert race; the row now exists.
                let row = sqlx::query(
                    "SELECT user_id, email, username, created_at FROM users WHERE email = $1",
                )
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
                Ok((Self::row_to_user(row)?, false))
            }
        }
    }
}
