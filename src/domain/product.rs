use chrono::{DateTime, NaiveDate, Utc};

use super::errors::DomainError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub sale_price: i64,
    pub gross_price: i64,
    pub available: bool,
    pub last_restocked: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sale_price: i64,
    pub gross_price: i64,
    pub last_restocked: NaiveDate,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_price("sale_price", self.sale_price)?;
        validate_price("gross_price", self.gross_price)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sale_price: Option<i64>,
    pub gross_price: Option<i64>,
    pub last_restocked: Option<NaiveDate>,
    pub available: Option<bool>,
}

impl ProductPatch {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.sale_price {
            validate_price("sale_price", price)?;
        }
        if let Some(price) = self.gross_price {
            validate_price("gross_price", price)?;
        }
        Ok(())
    }
}

/// Width of `products.name`, in characters.
pub const MAX_NAME_LEN: usize = 255;

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::InvalidInput(
            "product name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::InvalidInput(format!(
            "product name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_price(field: &str, price: i64) -> Result<(), DomainError> {
    if price < 0 {
        return Err(DomainError::InvalidInput(format!(
            "{field} must not be negative"
        )));
    }
    Ok(())
}
