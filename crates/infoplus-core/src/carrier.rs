//! Carrier resolution for customer payloads.
//!
//! InfoPlus customers carry a truck carrier and a package carrier. Both are
//! picked from the remote carrier list with fixed fallbacks.

use serde::{Deserialize, Serialize};

/// Truck carrier id used when no carrier label contains "TRUCK".
pub const DEFAULT_TRUCK_CARRIER: i64 = 100;

/// Package carrier id used when the configured default is not in the list.
pub const DEFAULT_PACKAGE_CARRIER: i64 = 0;

/// One entry of the remote carrier list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub carrier: i64,
    #[serde(default)]
    pub label: String,
}

/// Resolved carrier pair for a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierIds {
    pub truck: i64,
    pub package: i64,
}

impl Default for CarrierIds {
    fn default() -> Self {
        Self {
            truck: DEFAULT_TRUCK_CARRIER,
            package: DEFAULT_PACKAGE_CARRIER,
        }
    }
}

/// Picks the truck and package carriers from the remote list.
pub fn resolve_carriers(carriers: &[Carrier], default_package_id: i64) -> CarrierIds {
    let truck = carriers
        .iter()
        .find(|c| c.label.to_uppercase().contains("TRUCK"))
        .map(|c| c.carrier)
        .unwrap_or(DEFAULT_TRUCK_CARRIER);

    let package = carriers
        .iter()
        .find(|c| c.carrier == default_package_id)
        .map(|c| c.carrier)
        .unwrap_or(DEFAULT_PACKAGE_CARRIER);

    CarrierIds { truck, package }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier(id: i64, label: &str) -> Carrier {
        Carrier {
            carrier: id,
            label: label.to_string(),
        }
    }

    #[test]
    fn test_resolves_from_list() {
        let list = vec![
            carrier(1, "UPS Ground"),
            carrier(7, "LTL Truck Freight"),
            carrier(42, "FedEx Home"),
        ];
        let ids = resolve_carriers(&list, 42);
        assert_eq!(ids, CarrierIds { truck: 7, package: 42 });
    }

    #[test]
    fn test_fallbacks_when_nothing_matches() {
        let list = vec![carrier(1, "UPS Ground")];
        assert_eq!(resolve_carriers(&list, 99), CarrierIds::default());
        assert_eq!(resolve_carriers(&[], 1), CarrierIds { truck: 100, package: 0 });
    }
}
