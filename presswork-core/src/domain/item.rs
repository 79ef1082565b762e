//! Production item domain model
//!
//! A production item is one physical unit to be rendered (an invitation,
//! a card), derived from an order line item on the dashboard side.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One physical unit to be rendered from a design template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionItem {
    /// Source order identifier
    pub order_id: String,

    /// Secondary CRM identifier, when the order also exists in the CRM
    #[serde(default)]
    pub crm_id: Option<String>,

    /// Key of the design template to render; must resolve to an existing
    /// template file or the item is unprocessable
    pub template_key: String,

    /// Customization field-value map applied to the template's layers
    #[serde(default)]
    pub fields: HashMap<String, String>,

    /// Export configuration for this item
    #[serde(default)]
    pub export: ExportConfig,

    /// Number of physical copies to impose
    pub quantity: u32,
}

impl ProductionItem {
    /// Validates the item before it enters a job payload
    pub fn validate(&self) -> Result<(), String> {
        if self.quantity == 0 {
            return Err(format!(
                "order {}: quantity must be at least 1",
                self.order_id
            ));
        }
        if self.template_key.trim().is_empty() {
            return Err(format!("order {}: template key is empty", self.order_id));
        }
        Ok(())
    }
}

/// Per-item export flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Specialty metal/foil stock: requires the two-pass base + mask
    /// separation instead of a single CMYK export
    #[serde(default)]
    pub metal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ProductionItem {
        ProductionItem {
            order_id: "ORD-1001".to_string(),
            crm_id: Some("CRM-77".to_string()),
            template_key: "wedding-classic".to_string(),
            fields: HashMap::new(),
            export: ExportConfig::default(),
            quantity: 10,
        }
    }

    #[test]
    fn test_valid_item() {
        assert!(item().validate().is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut it = item();
        it.quantity = 0;
        assert!(it.validate().is_err());
    }

    #[test]
    fn test_empty_template_key_rejected() {
        let mut it = item();
        it.template_key = "  ".to_string();
        assert!(it.validate().is_err());
    }

    #[test]
    fn test_export_config_defaults_to_standard_stock() {
        let json = serde_json::json!({
            "order_id": "ORD-1",
            "template_key": "t",
            "quantity": 1,
        });
        let it: ProductionItem = serde_json::from_value(json).unwrap();
        assert!(!it.export.metal);
    }
}
