//! # Domain Types
//!
//! Types shared by the persistence layer and the sync engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SYNC BOOKKEEPING                     LOCAL ENTITIES                    │
//! │  ────────────────                     ──────────────                    │
//! │  IdMapping        (local ↔ remote id)  Product   (sku = natural key)    │
//! │  OrderSyncRecord  (last status triple) Customer  (customer_number)      │
//! │  LocalCategory    (remote tree mirror) Order     (order_number)         │
//! │  SyncRun          (run record)         OrderLineItem, Address           │
//! │                                                                         │
//! │  DISPATCH ENUMS                                                         │
//! │  ──────────────                                                         │
//! │  EntityType   item | customer | itemCategory | itemSubCategory          │
//! │  CategoryKind Category | SubCategory                                    │
//! │  SyncKind     categories | customers | products | orders | inventory    │
//! │               | order_status                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity
//! Local entities carry an opaque local `id` plus a business key (SKU,
//! customer number, order number). The business key is what the remote side
//! is searched by when no mapping exists yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::state::{DeliveryState, OrderState, TransactionState};

// =============================================================================
// Entity Type
// =============================================================================

/// Kinds of entity that get an id mapping row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Item,
    Customer,
    ItemCategory,
    ItemSubCategory,
}

impl EntityType {
    /// Name as persisted in `id_mapping.entity_type`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Item => "item",
            EntityType::Customer => "customer",
            EntityType::ItemCategory => "itemCategory",
            EntityType::ItemSubCategory => "itemSubCategory",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "item" => Ok(EntityType::Item),
            "customer" => Ok(EntityType::Customer),
            "itemCategory" => Ok(EntityType::ItemCategory),
            "itemSubCategory" => Ok(EntityType::ItemSubCategory),
            other => Err(CoreError::UnknownEntityType(other.to_string())),
        }
    }
}

// =============================================================================
// Id Mapping
// =============================================================================

/// Link between a local entity id and the id InfoPlus assigned to it.
///
/// Unique on `(entity_type, local_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct IdMapping {
    pub id: i64,
    pub entity_type: EntityType,
    pub local_id: String,
    pub remote_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Order Sync Record
// =============================================================================

/// The three order statuses compared by the idempotence guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusTriple {
    pub order: OrderState,
    pub shipping: DeliveryState,
    pub payment: TransactionState,
}

impl fmt::Display for StatusTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.order.as_str(),
            self.shipping.as_str(),
            self.payment.as_str()
        )
    }
}

/// Last reconciled status triple for one order.
///
/// Unique on `(local_order_id, remote_order_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderSyncRecord {
    pub id: i64,
    pub local_order_id: String,
    pub remote_order_id: i64,
    pub sync_date: DateTime<Utc>,
    pub order_status: OrderState,
    pub shipping_status: DeliveryState,
    pub payment_status: TransactionState,
}

impl OrderSyncRecord {
    /// Status triple as last written.
    pub fn statuses(&self) -> StatusTriple {
        StatusTriple {
            order: self.order_status,
            shipping: self.shipping_status,
            payment: self.payment_status,
        }
    }
}

// =============================================================================
// Categories
// =============================================================================

/// The two remote category endpoints.
///
/// Resolved once per category row; every call that differs between
/// categories and subcategories goes through this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoryKind {
    Category,
    SubCategory,
}

impl CategoryKind {
    /// Picks the kind from the local `is_sub_category` flag.
    pub fn from_flag(is_sub_category: bool) -> Self {
        if is_sub_category {
            CategoryKind::SubCategory
        } else {
            CategoryKind::Category
        }
    }

    /// Remote resource name.
    pub fn endpoint(&self) -> &'static str {
        match self {
            CategoryKind::Category => "itemCategory",
            CategoryKind::SubCategory => "itemSubCategory",
        }
    }

    /// Mapping kind for this category level.
    pub fn entity_type(&self) -> EntityType {
        match self {
            CategoryKind::Category => EntityType::ItemCategory,
            CategoryKind::SubCategory => EntityType::ItemSubCategory,
        }
    }

    pub fn is_sub_category(&self) -> bool {
        matches!(self, CategoryKind::SubCategory)
    }
}

/// Local mirror of one remote category or subcategory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LocalCategory {
    pub id: String,
    /// The remote's native key (its string `id`).
    pub remote_id_raw: Option<String>,
    /// The remote numeric id, known once the row exists remotely.
    pub internal_id: Option<i64>,
    pub name: String,
    pub is_sub_category: bool,
}

impl LocalCategory {
    pub fn kind(&self) -> CategoryKind {
        CategoryKind::from_flag(self.is_sub_category)
    }
}

// =============================================================================
// Local Entities
// =============================================================================

/// A storefront product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    /// Stock Keeping Unit - natural key on the remote side.
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub ean: Option<String>,
    pub weight_kg: Option<f64>,
    /// Local category id (see [`LocalCategory`]).
    pub category_id: Option<String>,
    /// Remote major group classification (custom field).
    pub major_group_id: Option<i64>,
    /// Remote sub group classification (custom field).
    pub sub_group_id: Option<i64>,
    pub stock: i64,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Both classification fields, if both are set.
    pub fn classification(&self) -> Option<(i64, i64)> {
        self.major_group_id.zip(self.sub_group_id)
    }
}

/// A postal address as stored locally (ISO codes, not remote names).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Address {
    pub street: String,
    pub additional_address: Option<String>,
    pub city: String,
    pub zip_code: String,
    /// ISO-3166 alpha-2.
    pub country_iso: String,
    /// ISO-3166-2 subdivision code without country prefix (e.g. "CA").
    pub state_code: Option<String>,
}

/// A storefront customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    /// Natural key on the remote side.
    pub customer_number: String,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Display name: company if present, otherwise "first last".
    pub fn display_name(&self) -> String {
        match self.company.as_deref().map(str::trim) {
            Some(company) if !company.is_empty() => company.to_string(),
            _ => format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string(),
        }
    }
}

/// One ordered product line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLineItem {
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// A storefront order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    /// Natural key on the remote side (sent as `customerOrderNo`).
    pub order_number: String,
    pub customer_id: String,
    pub customer_number: String,
    pub order_date: DateTime<Utc>,
    pub order_state: OrderState,
    pub delivery_state: DeliveryState,
    pub transaction_state: TransactionState,
    pub shipping_first_name: String,
    pub shipping_last_name: String,
    pub shipping_company: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub address: Address,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub line_items: Vec<OrderLineItem>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Live status triple.
    pub fn status_triple(&self) -> StatusTriple {
        StatusTriple {
            order: self.order_state,
            shipping: self.delivery_state,
            payment: self.transaction_state,
        }
    }

    /// "first last" of the shipping recipient.
    pub fn recipient_name(&self) -> String {
        format!("{} {}", self.shipping_first_name, self.shipping_last_name)
            .trim()
            .to_string()
    }
}

// =============================================================================
// Sync Runs
// =============================================================================

/// One sync operation kind, used for run records and job dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Categories,
    Customers,
    Products,
    Orders,
    Inventory,
    OrderStatus,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Categories => "categories",
            SyncKind::Customers => "customers",
            SyncKind::Products => "products",
            SyncKind::Orders => "orders",
            SyncKind::Inventory => "inventory",
            SyncKind::OrderStatus => "order_status",
        }
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "categories" | "category" => Ok(SyncKind::Categories),
            "customers" | "customer" => Ok(SyncKind::Customers),
            "products" | "product" | "items" => Ok(SyncKind::Products),
            "orders" | "order" => Ok(SyncKind::Orders),
            "inventory" | "stock" => Ok(SyncKind::Inventory),
            "order_status" | "order-status" | "status" => Ok(SyncKind::OrderStatus),
            other => Err(CoreError::Validation(
                crate::error::ValidationError::InvalidFormat {
                    field: "sync kind".to_string(),
                    reason: format!("unknown kind '{}'", other),
                },
            )),
        }
    }
}

/// Lifecycle of a run record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Persisted record of one sync operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SyncRun {
    pub id: String,
    pub kind: SyncKind,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub success_count: i64,
    pub failure_count: i64,
    pub error: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_names() {
        assert_eq!(EntityType::ItemSubCategory.as_str(), "itemSubCategory");
        assert_eq!("customer".parse::<EntityType>(), Ok(EntityType::Customer));
        assert!("warehouse".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_category_kind_dispatch() {
        let sub = CategoryKind::from_flag(true);
        assert_eq!(sub.endpoint(), "itemSubCategory");
        assert_eq!(sub.entity_type(), EntityType::ItemSubCategory);

        let top = CategoryKind::from_flag(false);
        assert_eq!(top.endpoint(), "itemCategory");
        assert_eq!(top.entity_type(), EntityType::ItemCategory);
    }

    #[test]
    fn test_customer_display_name_prefers_company() {
        let mut customer = Customer {
            id: "c1".into(),
            customer_number: "10001".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            company: Some("Analytical Engines Ltd".into()),
            email: "ada@example.com".into(),
            phone: None,
            address: Address::default(),
            updated_at: Utc::now(),
        };
        assert_eq!(customer.display_name(), "Analytical Engines Ltd");

        customer.company = Some("   ".into());
        assert_eq!(customer.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_sync_kind_parsing() {
        assert_eq!("Products".parse::<SyncKind>(), Ok(SyncKind::Products));
        assert_eq!("order-status".parse::<SyncKind>(), Ok(SyncKind::OrderStatus));
        assert!("everything".parse::<SyncKind>().is_err());
    }
}
