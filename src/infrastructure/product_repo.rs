use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product, ProductPatch};
use crate::schema::products;

use super::models::{NewProductRow, ProductChangeset, ProductRow};

pub struct DieselProductRepository {
    pool: DbPool,
}

impl DieselProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ProductRepository for DieselProductRepository {
    fn create(&self, product: &NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(products::table)
            .values(&NewProductRow::from(product))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)?;
        Ok(row.into())
    }

    fn find_by_id(&self, id: i32) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .find(id)
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn list(&self) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = products::table
            .select(ProductRow::as_select())
            .order(products::id.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    fn update(&self, id: i32, patch: &ProductPatch) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::update(products::table.find(id))
            .set(&ProductChangeset::new(patch, Utc::now()))
            .returning(ProductRow::as_returning())
            .get_result(&mut conn)
            .optional()?;
        Ok(row.map(Product::from))
    }

    fn delete(&self, id: i32) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        match diesel::delete(products::table.find(id)).execute(&mut conn) {
            Ok(deleted) => Ok(deleted > 0),
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                Err(DomainError::InvalidInput(format!(
                    "product {id} is referenced by existing order lines"
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::DieselProductRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::order::{NewOrder, PricedLine, ShippingDetails, STATUS_PENDING};
    use crate::domain::ports::{OrderRepository, ProductRepository};
    use crate::domain::product::{NewProduct, ProductPatch};
    use crate::infrastructure::order_repo::DieselOrderRepository;
    use crate::infrastructure::test_db::setup_db;

    fn bolt() -> NewProduct {
        NewProduct {
            name: "Perno 3/8".into(),
            sale_price: 450,
            gross_price: 300,
            last_restocked: NaiveDate::from_ymd_opt(2024, 3, 10).expect("date"),
        }
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn create_update_and_delete_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselProductRepository::new(pool);

        let created = repo.create(&bolt()).expect("create failed");
        assert!(created.available);
        assert_eq!(repo.find_by_id(created.id).expect("find"), Some(created.clone()));

        let updated = repo
            .update(
                created.id,
                &ProductPatch {
                    sale_price: Some(500),
                    available: Some(false),
                    ..Default::default()
                },
            )
            .expect("update failed")
            .expect("product missing");
        assert_eq!(updated.sale_price, 500);
        assert_eq!(updated.gross_price, 300);
        assert!(!updated.available);

        assert!(repo
            .update(9999, &ProductPatch::default())
            .expect("update failed")
            .is_none());

        assert!(repo.delete(created.id).expect("delete failed"));
        assert!(!repo.delete(created.id).expect("second delete failed"));
        assert!(repo.list().expect("list failed").is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a Docker daemon"]
    async fn referenced_product_cannot_be_deleted() {
        let (_container, pool) = setup_db().await;
        let products = DieselProductRepository::new(pool.clone());
        let orders = DieselOrderRepository::new(pool);
        let product = products.create(&bolt()).expect("create failed");

        orders
            .transaction(|tx| {
                let order = tx.insert_order(&NewOrder {
                    owner_user_id: 1,
                    total: 450,
                    status: STATUS_PENDING.to_string(),
                    shipping: ShippingDetails::default(),
                })?;
                tx.insert_lines(
                    order.id,
                    &[PricedLine {
                        product_id: product.id,
                        quantity: 1,
                        unit_price: 450,
                        line_total: 450,
                    }],
                )
            })
            .expect("seed failed");

        assert!(matches!(
            products.delete(product.id),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(products.find_by_id(product.id).expect("find").is_some());
    }
}
