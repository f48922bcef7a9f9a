use chrono::{DateTime, Utc};

use super::errors::DomainError;

/// Initial status of every order and the only one a client may edit.
pub const STATUS_PENDING: &str = "pending";

/// Upper bound for a single line quantity.
pub const MAX_LINE_QUANTITY: i32 = 1_000_000;

// Column widths of the `orders` table, in characters.
pub const MAX_STATUS_LEN: usize = 50;
pub const MAX_TAX_ID_LEN: usize = 50;
pub const MAX_KIND_LEN: usize = 100;
pub const MAX_TEXT_LEN: usize = 255;

fn check_length(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::InvalidInput(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Optional replacement for a required text field: present means non-blank.
fn check_replacement(field: &str, value: Option<&str>, max: usize) -> Result<(), DomainError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(DomainError::InvalidInput(format!(
            "{field} must not be blank"
        ))),
        Some(v) => check_length(field, v, max),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingDetails {
    pub city: String,
    pub address: String,
    pub recipient_tax_id: String,
    pub company: String,
    pub shipping_type: String,
    pub payment_method: String,
    pub document_type: String,
}

impl ShippingDetails {
    /// Every field except `company` is mandatory when placing an order.
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("city", &self.city),
            ("address", &self.address),
            ("recipient_tax_id", &self.recipient_tax_id),
            ("shipping_type", &self.shipping_type),
            ("payment_method", &self.payment_method),
            ("document_type", &self.document_type),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(DomainError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        check_length("city", &self.city, MAX_TEXT_LEN)?;
        check_length("address", &self.address, MAX_TEXT_LEN)?;
        check_length("recipient_tax_id", &self.recipient_tax_id, MAX_TAX_ID_LEN)?;
        check_length("company", &self.company, MAX_TEXT_LEN)?;
        check_length("shipping_type", &self.shipping_type, MAX_KIND_LEN)?;
        check_length("payment_method", &self.payment_method, MAX_KIND_LEN)?;
        check_length("document_type", &self.document_type, MAX_KIND_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i32,
    pub owner_user_id: i32,
    pub total: i64,
    pub status: String,
    pub shipped_at: Option<DateTime<Utc>>,
    pub shipping: ShippingDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line joined to its product's display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLine {
    pub id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<DetailLine>,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

impl OrderPage {
    pub fn total_pages(&self) -> i64 {
        (self.total + self.page_size - 1) / self.page_size
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// One requested item of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewLine {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub shipping: ShippingDetails,
    pub items: Vec<NewLine>,
}

/// A line priced against the catalog, ready to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner_user_id: i32,
    pub total: i64,
    pub status: String,
    pub shipping: ShippingDetails,
}

/// New product, quantity and price snapshot for an existing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineUpdate {
    pub id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

/// One entry of a partial item list submitted against an existing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Insert { product_id: i32, quantity: i32 },
    Update { line_id: i32, product_id: i32, quantity: i32 },
    Remove { line_id: i32 },
}

/// Order fields an administrator intends to change. `None` leaves a field
/// untouched; `company: Some(String::new())` clears the company.
/// `shipped_at` can be set or moved but never cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub status: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub recipient_tax_id: Option<String>,
    pub company: Option<String>,
    pub shipping_type: Option<String>,
    pub payment_method: Option<String>,
    pub document_type: Option<String>,
}

impl OrderPatch {
    /// Present fields must fit their columns; every field but `company`
    /// must also be non-blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        check_replacement("status", self.status.as_deref(), MAX_STATUS_LEN)?;
        check_replacement("city", self.city.as_deref(), MAX_TEXT_LEN)?;
        check_replacement("address", self.address.as_deref(), MAX_TEXT_LEN)?;
        check_replacement(
            "recipient_tax_id",
            self.recipient_tax_id.as_deref(),
            MAX_TAX_ID_LEN,
        )?;
        check_replacement("shipping_type", self.shipping_type.as_deref(), MAX_KIND_LEN)?;
        check_replacement("payment_method", self.payment_method.as_deref(), MAX_KIND_LEN)?;
        check_replacement("document_type", self.document_type.as_deref(), MAX_KIND_LEN)?;
        if let Some(company) = &self.company {
            check_length("company", company, MAX_TEXT_LEN)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdminOrderUpdate {
    pub patch: OrderPatch,
    pub items: Vec<LineChange>,
}

/// Everything written to the order row by one mutation. `updated_at` is
/// always refreshed by the repository.
#[derive(Debug, Clone, Default)]
pub struct OrderChanges {
    pub patch: OrderPatch,
    pub total: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            city: "Santiago".into(),
            address: "Av. Siempre Viva 742".into(),
            recipient_tax_id: "11.111.111-1".into(),
            company: String::new(),
            shipping_type: "courier".into(),
            payment_method: "transfer".into(),
            document_type: "invoice".into(),
        }
    }

    #[test]
    fn complete_shipping_details_validate() {
        assert!(shipping().validate().is_ok());
    }

    #[test]
    fn blank_required_fields_are_listed() {
        let details = ShippingDetails {
            city: " ".into(),
            payment_method: String::new(),
            ..shipping()
        };
        let err = details.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: missing required fields: city, payment_method"
        );
    }

    #[test]
    fn over_long_shipping_fields_are_rejected() {
        let details = ShippingDetails {
            city: "x".repeat(MAX_TEXT_LEN + 1),
            ..shipping()
        };
        let err = details.validate().unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(msg) if msg.contains("city")));

        let details = ShippingDetails {
            recipient_tax_id: "9".repeat(MAX_TAX_ID_LEN + 1),
            ..shipping()
        };
        assert!(matches!(
            details.validate(),
            Err(DomainError::InvalidInput(msg)) if msg.contains("recipient_tax_id")
        ));

        let details = ShippingDetails {
            document_type: "d".repeat(MAX_KIND_LEN + 1),
            ..shipping()
        };
        assert!(details.validate().is_err());
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let details = ShippingDetails {
            city: "ñ".repeat(MAX_TEXT_LEN),
            ..shipping()
        };
        assert!(details.validate().is_ok());
    }

    #[test]
    fn patch_rejects_blank_required_fields_but_clears_company() {
        let patch = OrderPatch {
            city: Some("  ".into()),
            ..Default::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(DomainError::InvalidInput(msg)) if msg.contains("city")
        ));

        let patch = OrderPatch {
            company: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(OrderPatch::default().validate().is_ok());
    }

    #[test]
    fn patch_rejects_over_long_fields() {
        let patch = OrderPatch {
            status: Some("s".repeat(MAX_STATUS_LEN + 1)),
            ..Default::default()
        };
        assert!(matches!(
            patch.validate(),
            Err(DomainError::InvalidInput(msg)) if msg.contains("status")
        ));

        let patch = OrderPatch {
            company: Some("c".repeat(MAX_TEXT_LEN + 1)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = OrderPatch {
            payment_method: Some("p".repeat(MAX_KIND_LEN)),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn page_metadata() {
        let page = OrderPage {
            orders: vec![],
            total: 15,
            page: 2,
            page_size: 7,
        };
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_prev());

        let empty = OrderPage {
            orders: vec![],
            total: 0,
            page: 1,
            page_size: 7,
        };
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
        assert!(!empty.has_prev());
    }
}
