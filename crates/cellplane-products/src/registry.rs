//! Product definitions and the write-once registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cellplane_model::Value;

use crate::error::RegistryError;

/// Parameter type with its per-type validation rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamType {
    String,
    Int {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Bool,
    Choice { choices: Vec<String> },
}

/// Validation spec for a single product parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(flatten)]
    pub param_type: ParamType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn required(name: &str, param_type: ParamType) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, param_type: ParamType, default: Value) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            required: false,
            default: Some(default),
        }
    }
}

/// Definition of one cloud service product.
///
/// The extension point of the control plane: registering a definition
/// makes the generic `/api/services/<product>` pipeline handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDefinition {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Claim CRD apiVersion, e.g. `db.platform.example.org/v1alpha1`.
    pub api_version: String,
    /// Claim CRD kind, e.g. `MySQLInstanceClaim`.
    pub kind: String,
    /// compositionSelector class label value.
    pub composition_class: String,
    /// compositionSelector label group prefix.
    pub composition_group: String,
    pub parameters: Vec<ParameterSpec>,
    /// Suffix appended to the claim name for its connection secret.
    #[serde(default = "default_secret_suffix")]
    pub connection_secret_suffix: String,
}

fn default_secret_suffix() -> String {
    "-conn".to_string()
}

impl ProductDefinition {
    /// Connection secret name for a claim of this product.
    pub fn secret_name(&self, claim_name: &str) -> String {
        format!("{claim_name}{}", self.connection_secret_suffix)
    }
}

/// Write-once catalog of registered products.
#[derive(Debug, Default)]
pub struct ProductRegistry {
    products: BTreeMap<String, ProductDefinition>,
}

impl ProductRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the builtin catalog.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for product in crate::catalog::builtin_products() {
            registry
                .register(product)
                .expect("builtin catalog has duplicate product names");
        }
        registry
    }

    /// Register a product. Duplicate names are a configuration error.
    pub fn register(&mut self, product: ProductDefinition) -> Result<(), RegistryError> {
        if self.products.contains_key(&product.name) {
            return Err(RegistryError::DuplicateProduct(product.name));
        }
        self.products.insert(product.name.clone(), product);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ProductDefinition> {
        self.products.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &ProductDefinition> {
        self.products.values()
    }

    pub fn names(&self) -> Vec<String> {
        self.products.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_product(name: &str) -> ProductDefinition {
        ProductDefinition {
            name: name.to_string(),
            display_name: name.to_string(),
            description: String::new(),
            api_version: "test.example.org/v1".to_string(),
            kind: "TestClaim".to_string(),
            composition_class: name.to_string(),
            composition_group: "test.example.org".to_string(),
            parameters: vec![],
            connection_secret_suffix: "-conn".to_string(),
        }
    }

    #[test]
    fn register_and_get() {
        let mut registry = ProductRegistry::new();
        registry.register(minimal_product("redis")).unwrap();
        assert!(registry.get("redis").is_some());
        assert!(registry.get("mysql").is_none());
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut registry = ProductRegistry::new();
        registry.register(minimal_product("redis")).unwrap();
        assert!(matches!(
            registry.register(minimal_product("redis")),
            Err(RegistryError::DuplicateProduct(_))
        ));
    }

    #[test]
    fn builtin_registry_has_mysql_and_webapp() {
        let registry = ProductRegistry::builtin();
        assert!(registry.get("mysql").is_some());
        assert!(registry.get("webapp").is_some());
    }

    #[test]
    fn secret_name_appends_suffix() {
        let product = minimal_product("redis");
        assert_eq!(product.secret_name("orders-db"), "orders-db-conn");
    }

    #[test]
    fn parameter_spec_serializes_flat_type() {
        let spec = ParameterSpec::required(
            "storageGB",
            ParamType::Int {
                min: Some(10),
                max: Some(65536),
            },
        );
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "int");
        assert_eq!(json["min"], 10);
        assert_eq!(json["name"], "storageGB");
    }
}
