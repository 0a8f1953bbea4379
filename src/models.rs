use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub icon: String,
    pub summary: String,
    pub price_min: f64,
    pub price_max: f64,
    pub created_at: String,
}

/// Internal user row. Credential columns never leave the server.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// One cart line, shared between the server rows and the client-side store.
/// Display fields are denormalized from the catalog so the cart renders
/// without a product lookup.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CartItem {
    pub product_slug: String,
    pub name: String,
    pub icon: String,
    pub price_min: f64,
    pub price_max: f64,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AddCartItem {
    pub product_slug: String,
    pub name: String,
    pub icon: String,
    pub price_min: f64,
    pub price_max: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UpdateCartItem {
    pub product_slug: String,
    pub quantity: i64,
}

/// Pre-sale subtotals stay a range because the final price is negotiated
/// per deal, not read from a fixed price table.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i64,
    pub user_id: String,
    pub status: String, // pending | processing | completed | cancelled | refunded
    pub total_amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub payment_reference: String,
    pub billing_name: Option<String>,
    pub billing_email: Option<String>,
    pub billing_company: Option<String>,
    pub billing_address: Option<String>,
    pub billing_city: Option<String>,
    pub billing_country: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_slug: String,
    pub name: String,
    pub quantity: i64,
    pub price_min: f64,
    pub price_max: f64,
    pub final_price: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateOrderItem {
    pub product_slug: String,
    pub name: String,
    pub quantity: i64,
    pub price_min: f64,
    pub price_max: f64,
    pub final_price: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrder {
    pub items: Vec<CreateOrderItem>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub payment_method: Option<String>,
    pub billing_name: Option<String>,
    pub billing_email: Option<String>,
    pub billing_company: Option<String>,
    pub billing_address: Option<String>,
    pub billing_city: Option<String>,
    pub billing_country: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}
