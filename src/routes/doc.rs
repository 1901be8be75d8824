use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::CartLine,
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest},
        cart::{AddCartItemRequest, CartItemsRequest, CartView, UpdateQuantityRequest},
        orders::{CheckoutRequest, OrderList, OrderWithItems},
        payments::{AddPaymentMethodRequest, PaymentMethodList},
        products::ProductList,
        profile::UpdateProfileRequest,
    },
    models::{Order, OrderItem, PaymentMethod, Product, Profile, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, orders, params, payments, products, profile},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::reset_password,
        profile::get_profile,
        profile::update_profile,
        products::list_products,
        products::get_product,
        cart::get_cart,
        cart::save_cart,
        cart::add_item,
        cart::update_item_quantity,
        cart::remove_item,
        cart::merge_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
        payments::list_payment_methods,
        payments::add_payment_method,
        payments::delete_payment_method,
        payments::set_default_payment_method
    ),
    components(
        schemas(
            User,
            Profile,
            Product,
            Order,
            OrderItem,
            PaymentMethod,
            CartLine,
            CartView,
            AddCartItemRequest,
            UpdateQuantityRequest,
            CartItemsRequest,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ResetPasswordRequest,
            UpdateProfileRequest,
            CheckoutRequest,
            OrderWithItems,
            OrderList,
            AddPaymentMethodRequest,
            PaymentMethodList,
            ProductList,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<PaymentMethodList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Profile", description = "Profile endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payment Methods", description = "Payment method endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
