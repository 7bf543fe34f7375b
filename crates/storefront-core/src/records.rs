use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const PRODUCTS_COLLECTION: &str = "products";
pub const SECTIONS_COLLECTION: &str = "sections";
pub const ORDERS_COLLECTION: &str = "orders";

fn default_currency() -> String {
    "USD".to_string()
}

fn default_active() -> bool {
    true
}

fn default_status() -> String {
    "pending".to_string()
}

/// A catalog product as stored in the `products` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    /// ISO 4217 currency code.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Editorially curated, in display order. May reference deleted products.
    #[serde(default)]
    pub related_product_ids: Vec<String>,
    /// Inactive products stay addressable by id but are hidden from listings.
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A homepage row listing products in a curated order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomepageSection {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub product_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    /// Price captured at checkout; independent of the product's current price.
    pub unit_price: Decimal,
}

impl OrderItem {
    /// `None` if the product overflows `Decimal`.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Sum of `quantity * unit_price` over all items, or `None` if any
    /// step overflows `Decimal`.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.items.iter().try_fold(Decimal::ZERO, |total, item| {
            item.line_total().and_then(|line| total.checked_add(line))
        })
    }

    /// Product ids referenced by the order's items, in item order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.product_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(product_id: &str, quantity: u32, unit_price: Decimal) -> OrderItem {
        OrderItem {
            product_id: product_id.to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn product_defaults_apply_when_fields_missing() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "name": "Linen Shirt",
            "price": "49.00"
        }))
        .expect("deserialize product");

        assert_eq!(product.currency, "USD");
        assert!(product.active);
        assert!(product.related_product_ids.is_empty());
        assert!(product.description.is_none());
        assert_eq!(product.price, Decimal::new(4900, 2));
    }

    #[test]
    fn product_price_accepts_numeric_json() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": "p2",
            "name": "Canvas Tote",
            "price": 18.5
        }))
        .expect("deserialize product");
        assert_eq!(product.price, Decimal::new(185, 1));
    }

    #[test]
    fn product_missing_price_fails() {
        let result: Result<Product, _> = serde_json::from_value(serde_json::json!({
            "id": "p3",
            "name": "No Price"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn order_total_sums_line_totals() {
        let order = Order {
            id: "o1".to_string(),
            customer_email: None,
            status: "paid".to_string(),
            items: vec![
                make_item("p1", 2, Decimal::new(1250, 2)),
                make_item("p2", 1, Decimal::new(499, 2)),
            ],
            created_at: None,
        };
        assert_eq!(order.total(), Some(Decimal::new(2999, 2)));
    }

    #[test]
    fn order_total_is_none_on_overflow() {
        let order = Order {
            id: "o-big".to_string(),
            customer_email: None,
            status: "paid".to_string(),
            items: vec![make_item("p1", 2, Decimal::MAX)],
            created_at: None,
        };
        assert_eq!(order.items[0].line_total(), None);
        assert_eq!(order.total(), None);

        let summed = Order {
            items: vec![
                make_item("p1", 1, Decimal::MAX),
                make_item("p2", 1, Decimal::ONE),
            ],
            ..order
        };
        assert_eq!(summed.total(), None);
    }

    #[test]
    fn order_total_zero_without_items() {
        let order: Order =
            serde_json::from_value(serde_json::json!({ "id": "o2" })).expect("deserialize");
        assert_eq!(order.total(), Some(Decimal::ZERO));
        assert_eq!(order.status, "pending");
    }

    #[test]
    fn order_product_ids_keep_item_order_and_duplicates() {
        let order = Order {
            id: "o3".to_string(),
            customer_email: None,
            status: "pending".to_string(),
            items: vec![
                make_item("b", 1, Decimal::ONE),
                make_item("a", 1, Decimal::ONE),
                make_item("b", 3, Decimal::ONE),
            ],
            created_at: None,
        };
        assert_eq!(order.product_ids(), vec!["b", "a", "b"]);
    }

    #[test]
    fn section_position_defaults_to_zero() {
        let section: HomepageSection = serde_json::from_value(serde_json::json!({
            "id": "s1",
            "title": "New Arrivals"
        }))
        .expect("deserialize section");
        assert_eq!(section.position, 0);
        assert!(section.product_ids.is_empty());
    }
}
