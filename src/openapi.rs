use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{orders, products};

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::list_orders,
        orders::list_my_orders,
        orders::get_order,
        orders::update_order_as_admin,
        orders::update_order_items,
        products::create_product,
        products::list_products,
        products::get_product,
        products::update_product,
        products::delete_product,
    ),
    components(schemas(
        orders::CreateOrderRequest,
        orders::OrderItemRequest,
        orders::ItemChangeRequest,
        orders::UpdateItemsRequest,
        orders::AdminUpdateOrderRequest,
        orders::OrderResponse,
        orders::OrderLineResponse,
        orders::OrderDetailResponse,
        orders::ListOrdersResponse,
        products::CreateProductRequest,
        products::UpdateProductRequest,
        products::ProductResponse,
    )),
    modifiers(&BearerAuth),
    security(("bearer" = [])),
    tags(
        (name = "orders", description = "Quotation orders and item reconciliation"),
        (name = "products", description = "Product catalog"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/orders",
            "/orders/mine",
            "/orders/{id}",
            "/orders/{id}/items",
            "/products",
            "/products/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
