//! Builtin product catalog.
//!
//! Two products ship with the control plane: managed MySQL and web
//! application compute. New products are plain `ProductDefinition`
//! values registered at startup.

use cellplane_model::Value;

use crate::registry::{ParamType, ParameterSpec, ProductDefinition};

/// The products registered at startup.
pub fn builtin_products() -> Vec<ProductDefinition> {
    vec![mysql(), webapp()]
}

fn mysql() -> ProductDefinition {
    ProductDefinition {
        name: "mysql".to_string(),
        display_name: "Managed MySQL".to_string(),
        description:
            "Managed MySQL database with automatic backups, replication, and failover."
                .to_string(),
        api_version: "db.platform.example.org/v1alpha1".to_string(),
        kind: "MySQLInstanceClaim".to_string(),
        composition_class: "mysql".to_string(),
        composition_group: "db.platform.example.org".to_string(),
        parameters: vec![
            ParameterSpec::required(
                "size",
                ParamType::Choice {
                    choices: vec![
                        "small".to_string(),
                        "medium".to_string(),
                        "large".to_string(),
                        "xlarge".to_string(),
                    ],
                },
            ),
            ParameterSpec::required(
                "storageGB",
                ParamType::Int {
                    min: Some(10),
                    max: Some(65536),
                },
            ),
        ],
        connection_secret_suffix: "-conn".to_string(),
    }
}

fn webapp() -> ProductDefinition {
    ProductDefinition {
        name: "webapp".to_string(),
        display_name: "Web Application".to_string(),
        description:
            "Managed web application compute with auto-scaling, load balancing, and TLS."
                .to_string(),
        api_version: "compute.platform.example.org/v1alpha1".to_string(),
        kind: "WebAppClaim".to_string(),
        composition_class: "webapp".to_string(),
        composition_group: "compute.platform.example.org".to_string(),
        parameters: vec![
            ParameterSpec::required("image", ParamType::String),
            ParameterSpec::optional(
                "port",
                ParamType::Int {
                    min: Some(1),
                    max: Some(65535),
                },
                Value::Int(8080),
            ),
            ParameterSpec::optional(
                "cpu",
                ParamType::Choice {
                    choices: vec![
                        "125m".to_string(),
                        "250m".to_string(),
                        "500m".to_string(),
                        "1000m".to_string(),
                        "2000m".to_string(),
                        "4000m".to_string(),
                    ],
                },
                Value::String("250m".to_string()),
            ),
            ParameterSpec::optional(
                "memory",
                ParamType::Choice {
                    choices: vec![
                        "256Mi".to_string(),
                        "512Mi".to_string(),
                        "1Gi".to_string(),
                        "2Gi".to_string(),
                        "4Gi".to_string(),
                        "8Gi".to_string(),
                    ],
                },
                Value::String("512Mi".to_string()),
            ),
            ParameterSpec::optional(
                "replicas",
                ParamType::Int {
                    min: Some(1),
                    max: Some(20),
                },
                Value::Int(2),
            ),
        ],
        connection_secret_suffix: "-conn".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_params;
    use serde_json::json;

    #[test]
    fn catalog_has_two_products() {
        let products = builtin_products();
        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mysql", "webapp"]);
    }

    #[test]
    fn mysql_crd_coordinates() {
        let p = mysql();
        assert_eq!(p.api_version, "db.platform.example.org/v1alpha1");
        assert_eq!(p.kind, "MySQLInstanceClaim");
        assert_eq!(p.composition_group, "db.platform.example.org");
        assert_eq!(p.composition_class, "mysql");
    }

    #[test]
    fn webapp_defaults_fill_in() {
        let p = webapp();
        let params = json!({"image": "registry.example.org/shop:v4"})
            .as_object()
            .unwrap()
            .clone();
        let resolved = validate_params(&p, &params).unwrap();
        assert_eq!(resolved["port"], Value::Int(8080));
        assert_eq!(resolved["cpu"], Value::String("250m".into()));
        assert_eq!(resolved["replicas"], Value::Int(2));
    }

    #[test]
    fn webapp_requires_image() {
        let p = webapp();
        let params = json!({}).as_object().unwrap().clone();
        assert!(validate_params(&p, &params).is_err());
    }
}
