//! # InfoPlus Payloads
//!
//! JSON bodies sent to InfoPlus and the few remote shapes read back.
//! Field names follow the InfoPlus v3.0 camelCase schema.
//!
//! ## Outbound
//! ```text
//! Product  ──► ItemPayload      (item)
//! Customer ──► CustomerPayload  (customer)
//! Order    ──► OrderPayload     (order, lineItems[])
//! LocalCategory ──► CategoryPayload (itemCategory | itemSubCategory)
//! ```
//!
//! ## Inbound
//! Remote ids arrive as integers, floats (`orderNo: 1234.000`) or, for
//! categories, as a string `id` plus a numeric `internalId`. [`remote_id`]
//! and [`remote_id_field`] normalise them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::carrier::CarrierIds;
use crate::country::{map_country, map_us_state};
use crate::error::{CoreError, CoreResult};
use crate::types::{Customer, LocalCategory, Order, Product};

// =============================================================================
// Remote Id Extraction
// =============================================================================

/// Reads a numeric field that may be an integer, a float or a digit string.
pub fn remote_id_field(value: &Value, field: &str) -> Option<i64> {
    match value.get(field)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

/// Remote numeric id of a returned record.
///
/// Tries `id`, then `orderNo`, then `internalId`. A string `id` that is not
/// numeric (category codes) falls through to `internalId`.
pub fn remote_id(value: &Value) -> Option<i64> {
    ["id", "orderNo", "internalId"]
        .iter()
        .find_map(|field| remote_id_field(value, field))
}

/// Reads a string field, trimming it; empty strings count as missing.
pub fn string_field(value: &Value, field: &str) -> Option<String> {
    match value.get(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Items
// =============================================================================

/// Body for `item` create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub lob_id: i64,
    pub sku: String,
    pub item_description: String,
    pub major_group_id: i64,
    pub sub_group_id: i64,
    pub unit_code: String,
    pub wrap_code: String,
    pub units_per_wrap: i64,
    pub backorder: String,
    pub charge_code: String,
    pub max_cycle: i64,
    pub max_interim: i64,
    pub status: String,
    pub seasonal_item: String,
    pub secure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_per_wrap: Option<f64>,
}

impl ItemPayload {
    /// Builds an item body. Fails when the classification is missing.
    pub fn from_product(product: &Product, lob_id: i64) -> CoreResult<Self> {
        let (major_group_id, sub_group_id) =
            product
                .classification()
                .ok_or_else(|| CoreError::MissingClassification {
                    sku: product.sku.clone(),
                })?;

        Ok(Self {
            id: None,
            lob_id,
            sku: product.sku.clone(),
            item_description: product.name.clone(),
            major_group_id,
            sub_group_id,
            unit_code: "EACH".to_string(),
            wrap_code: "EACH".to_string(),
            units_per_wrap: 1,
            backorder: "No".to_string(),
            charge_code: "Not Chargeable".to_string(),
            max_cycle: 999_999,
            max_interim: 999_999,
            status: if product.active { "Active" } else { "Inactive" }.to_string(),
            seasonal_item: "No".to_string(),
            secure: "No".to_string(),
            upc: product.ean.clone().filter(|e| !e.trim().is_empty()),
            weight_per_wrap: product.weight_kg,
        })
    }

    /// Same body addressed at an existing remote record.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

// =============================================================================
// Customers
// =============================================================================

/// Body for `customer` create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub lob_id: i64,
    pub customer_no: String,
    pub name: String,
    pub attention: String,
    pub street: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub phone: String,
    pub email: String,
    pub package_carrier_id: i64,
    pub truck_carrier_id: i64,
    pub weight_break: i64,
    pub residential: String,
}

impl CustomerPayload {
    pub fn from_customer(customer: &Customer, lob_id: i64, carriers: CarrierIds) -> Self {
        let country = map_country(&customer.address.country_iso);
        let state = map_us_state(
            country,
            customer.address.state_code.as_deref().unwrap_or_default(),
        );

        Self {
            id: None,
            lob_id,
            customer_no: customer.customer_number.clone(),
            name: customer.display_name(),
            attention: format!("{} {}", customer.first_name, customer.last_name)
                .trim()
                .to_string(),
            street: customer.address.street.clone(),
            street2: customer
                .address
                .additional_address
                .clone()
                .unwrap_or_default(),
            city: customer.address.city.clone(),
            state: state.to_string(),
            zip_code: customer.address.zip_code.clone(),
            country: country.to_string(),
            phone: customer.phone.clone().unwrap_or_default(),
            email: customer.email.clone(),
            package_carrier_id: carriers.package,
            truck_carrier_id: carriers.truck,
            weight_break: 0,
            residential: if customer.company.is_some() { "No" } else { "Yes" }.to_string(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

// =============================================================================
// Orders
// =============================================================================

/// One `lineItems[]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPayload {
    pub sku: String,
    pub ordered_qty: i64,
}

/// Body for `order` create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_no: Option<i64>,
    pub lob_id: i64,
    pub warehouse_id: i64,
    pub carrier_id: i64,
    pub customer_no: String,
    pub customer_order_no: String,
    pub order_date: String,
    pub ship_to_name: String,
    pub ship_to_company: String,
    pub ship_to_street: String,
    pub ship_to_street2: String,
    pub ship_to_city: String,
    pub ship_to_state: String,
    pub ship_to_zip: String,
    pub ship_to_country: String,
    pub ship_to_phone: String,
    pub ship_to_email: String,
    pub line_items: Vec<LineItemPayload>,
}

impl OrderPayload {
    pub fn from_order(order: &Order, lob_id: i64, warehouse_id: i64, carrier_id: i64) -> Self {
        let country = map_country(&order.address.country_iso);
        let state = map_us_state(country, order.address.state_code.as_deref().unwrap_or_default());

        Self {
            order_no: None,
            lob_id,
            warehouse_id,
            carrier_id,
            customer_no: order.customer_number.clone(),
            customer_order_no: order.order_number.clone(),
            order_date: format_remote_date(order.order_date),
            ship_to_name: order.recipient_name(),
            ship_to_company: order.shipping_company.clone().unwrap_or_default(),
            ship_to_street: order.address.street.clone(),
            ship_to_street2: order.address.additional_address.clone().unwrap_or_default(),
            ship_to_city: order.address.city.clone(),
            ship_to_state: state.to_string(),
            ship_to_zip: order.address.zip_code.clone(),
            ship_to_country: country.to_string(),
            ship_to_phone: order.phone.clone().unwrap_or_default(),
            ship_to_email: order.email.clone(),
            line_items: order
                .line_items
                .iter()
                .map(|li| LineItemPayload {
                    sku: li.sku.clone(),
                    ordered_qty: li.quantity,
                })
                .collect(),
        }
    }

    pub fn with_order_no(mut self, order_no: i64) -> Self {
        self.order_no = Some(order_no);
        self
    }
}

/// InfoPlus date format (`2024-03-01T12:00:00.000Z`).
pub fn format_remote_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Categories
// =============================================================================

/// Body for `itemCategory` / `itemSubCategory` create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_id: Option<i64>,
    pub lob_id: i64,
    pub id: String,
    pub name: String,
}

impl CategoryPayload {
    pub fn from_category(category: &LocalCategory, lob_id: i64) -> Self {
        Self {
            internal_id: category.internal_id,
            lob_id,
            id: category
                .remote_id_raw
                .clone()
                .unwrap_or_else(|| category.name.clone()),
            name: category.name.clone(),
        }
    }
}

/// A category or subcategory as returned by InfoPlus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCategory {
    pub id: String,
    pub internal_id: Option<i64>,
    pub name: String,
}

impl RemoteCategory {
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = string_field(value, "id")?;
        Some(Self {
            internal_id: remote_id_field(value, "internalId"),
            name: string_field(value, "name").unwrap_or_else(|| id.clone()),
            id,
        })
    }
}

// =============================================================================
// Orders & Inventory (inbound)
// =============================================================================

/// The parts of a remote order the reconciler reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOrder {
    pub order_no: i64,
    pub customer_order_no: Option<String>,
    pub status: String,
}

impl RemoteOrder {
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            order_no: remote_id_field(value, "orderNo")?,
            customer_order_no: string_field(value, "customerOrderNo"),
            status: string_field(value, "status").unwrap_or_default(),
        })
    }
}

/// One inventory detail row (quantity at a location).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDetail {
    pub sku: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub warehouse_id: Option<i64>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DeliveryState, OrderState, TransactionState};
    use crate::types::{Address, OrderLineItem};
    use chrono::TimeZone;
    use serde_json::json;

    fn product() -> Product {
        Product {
            id: "p1".into(),
            sku: "ABC123".into(),
            name: "Widget".into(),
            description: None,
            ean: Some("4006381333931".into()),
            weight_kg: Some(1.25),
            category_id: None,
            major_group_id: Some(3),
            sub_group_id: Some(9),
            stock: 0,
            active: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_remote_id_variants() {
        assert_eq!(remote_id(&json!({"id": 77})), Some(77));
        assert_eq!(remote_id(&json!({"orderNo": 1234.0})), Some(1234));
        assert_eq!(remote_id(&json!({"id": "TOOLS", "internalId": 5})), Some(5));
        assert_eq!(remote_id(&json!({"name": "x"})), None);
        assert_eq!(remote_id(&Value::Null), None);
    }

    #[test]
    fn test_item_payload_requires_classification() {
        let payload = ItemPayload::from_product(&product(), 12).unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["lobId"], 12);
        assert_eq!(json["majorGroupId"], 3);
        assert_eq!(json["itemDescription"], "Widget");
        assert!(json.get("id").is_none());

        let mut unclassified = product();
        unclassified.sub_group_id = None;
        assert!(matches!(
            ItemPayload::from_product(&unclassified, 12),
            Err(CoreError::MissingClassification { .. })
        ));
    }

    #[test]
    fn test_order_payload_maps_address_and_lines() {
        let order = Order {
            id: "o1".into(),
            order_number: "SO-1001".into(),
            customer_id: "c1".into(),
            customer_number: "10001".into(),
            order_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            order_state: OrderState::Open,
            delivery_state: DeliveryState::Open,
            transaction_state: TransactionState::Paid,
            shipping_first_name: "Grace".into(),
            shipping_last_name: "Hopper".into(),
            shipping_company: None,
            email: "grace@example.com".into(),
            phone: None,
            address: Address {
                street: "1 Navy Way".into(),
                additional_address: None,
                city: "Arlington".into(),
                zip_code: "22201".into(),
                country_iso: "us".into(),
                state_code: Some("VA".into()),
            },
            line_items: vec![OrderLineItem {
                product_id: "p1".into(),
                sku: "ABC123".into(),
                quantity: 2,
                unit_price_cents: 1999,
            }],
            updated_at: Utc::now(),
        };

        let payload = OrderPayload::from_order(&order, 12, 3, 42).with_order_no(555);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["orderNo"], 555);
        assert_eq!(json["customerOrderNo"], "SO-1001");
        assert_eq!(json["shipToCountry"], "UNITED STATES");
        assert_eq!(json["shipToState"], "Virginia");
        assert_eq!(json["orderDate"], "2024-03-01T12:00:00.000Z");
        assert_eq!(json["lineItems"][0]["orderedQty"], 2);
    }

    #[test]
    fn test_remote_shapes() {
        let cat = RemoteCategory::from_value(&json!({"id": "TOOLS", "internalId": 5, "name": "Tools"}))
            .unwrap();
        assert_eq!(cat.internal_id, Some(5));
        assert_eq!(cat.name, "Tools");

        let order =
            RemoteOrder::from_value(&json!({"orderNo": 88.0, "status": "Shipped"})).unwrap();
        assert_eq!(order.order_no, 88);
        assert_eq!(order.status, "Shipped");
        assert!(RemoteOrder::from_value(&json!({"status": "Shipped"})).is_none());
    }
}
