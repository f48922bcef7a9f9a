use crate::domain::auth::Principal;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductRepository;
use crate::domain::product::{NewProduct, Product, ProductPatch};

/// Product catalog management. Reads are open to any authenticated caller;
/// writes are reserved for administrators.
pub struct CatalogService<P> {
    repo: P,
}

impl<P: ProductRepository> CatalogService<P> {
    pub fn new(repo: P) -> Self {
        Self { repo }
    }

    pub fn create_product(
        &self,
        caller: &Principal,
        product: NewProduct,
    ) -> Result<Product, DomainError> {
        caller.require_admin()?;
        product.validate()?;
        let created = self.repo.create(&product)?;
        log::info!("product {} '{}' created", created.id, created.name);
        Ok(created)
    }

    pub fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        self.repo.list()
    }

    pub fn get_product(&self, id: i32) -> Result<Product, DomainError> {
        self.repo.find_by_id(id)?.ok_or_else(|| product_not_found(id))
    }

    pub fn update_product(
        &self,
        caller: &Principal,
        id: i32,
        patch: ProductPatch,
    ) -> Result<Product, DomainError> {
        caller.require_admin()?;
        patch.validate()?;
        let updated = self
            .repo
            .update(id, &patch)?
            .ok_or_else(|| product_not_found(id))?;
        log::info!(
            "product {} updated, sale price {}, available {}",
            updated.id,
            updated.sale_price,
            updated.available
        );
        Ok(updated)
    }

    pub fn delete_product(&self, caller: &Principal, id: i32) -> Result<(), DomainError> {
        caller.require_admin()?;
        if self.repo.delete(id)? {
            log::info!("product {} deleted", id);
            Ok(())
        } else {
            Err(product_not_found(id))
        }
    }
}

fn product_not_found(id: i32) -> DomainError {
    DomainError::NotFound(format!("product {id} not found"))
}
