pub mod order_items;
pub mod orders;
pub mod payment_methods;
pub mod products;
pub mod profiles;
pub mod saved_carts;
pub mod users;

pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use payment_methods::Entity as PaymentMethods;
pub use products::Entity as Products;
pub use profiles::Entity as Profiles;
pub use saved_carts::Entity as SavedCarts;
pub use users::Entity as Users;
