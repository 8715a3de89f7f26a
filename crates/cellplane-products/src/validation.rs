//! Total validation of product parameters.
//!
//! For every declared parameter the request either supplies a value
//! (type-, range-, and choice-checked) or the default substitutes.
//! Keys the product does not declare are rejected.

use std::collections::BTreeMap;

use serde_json::Map;

use cellplane_model::Value;

use crate::error::ParamError;
use crate::registry::{ParamType, ParameterSpec, ProductDefinition};

/// Validate a request's product parameters against the product's
/// specs. Returns the fully resolved parameter map (defaults applied)
/// or every validation failure found.
pub fn validate_params(
    product: &ProductDefinition,
    params: &Map<String, serde_json::Value>,
) -> Result<BTreeMap<String, Value>, Vec<ParamError>> {
    let mut errors = Vec::new();
    let mut resolved = BTreeMap::new();

    for spec in &product.parameters {
        match params.get(&spec.name) {
            Some(raw) => match check_value(spec, raw) {
                Ok(value) => {
                    resolved.insert(spec.name.clone(), value);
                }
                Err(e) => errors.push(e),
            },
            None => {
                if let Some(default) = &spec.default {
                    resolved.insert(spec.name.clone(), default.clone());
                } else if spec.required {
                    errors.push(ParamError::MissingParameter(spec.name.clone()));
                }
            }
        }
    }

    for key in params.keys() {
        if !product.parameters.iter().any(|s| &s.name == key) {
            errors.push(ParamError::UnknownParameter(key.clone()));
        }
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(errors)
    }
}

fn check_value(spec: &ParameterSpec, raw: &serde_json::Value) -> Result<Value, ParamError> {
    let name = spec.name.clone();
    match &spec.param_type {
        ParamType::String => match raw.as_str() {
            Some(s) => Ok(Value::String(s.to_string())),
            None => Err(ParamError::InvalidParameterType {
                name,
                expected: "string",
            }),
        },
        ParamType::Bool => match raw.as_bool() {
            Some(b) => Ok(Value::Bool(b)),
            None => Err(ParamError::InvalidParameterType {
                name,
                expected: "boolean",
            }),
        },
        ParamType::Int { min, max } => {
            let i = raw.as_i64().ok_or(ParamError::InvalidParameterType {
                name: name.clone(),
                expected: "integer",
            })?;
            if let Some(min) = min {
                if i < *min {
                    return Err(ParamError::BelowMinimum { name, min: *min });
                }
            }
            if let Some(max) = max {
                if i > *max {
                    return Err(ParamError::AboveMaximum { name, max: *max });
                }
            }
            Ok(Value::Int(i))
        }
        ParamType::Choice { choices } => {
            let s = raw.as_str().ok_or(ParamError::InvalidParameterType {
                name: name.clone(),
                expected: "string",
            })?;
            if choices.iter().any(|c| c == s) {
                Ok(Value::String(s.to_string()))
            } else {
                Err(ParamError::InvalidChoice {
                    name,
                    choices: choices.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_product() -> ProductDefinition {
        ProductDefinition {
            name: "mysql".to_string(),
            display_name: "Managed MySQL".to_string(),
            description: String::new(),
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
                ParameterSpec::optional("ha", ParamType::Bool, Value::Bool(false)),
            ],
            connection_secret_suffix: "-conn".to_string(),
        }
    }

    fn body(v: serde_json::Value) -> Map<String, serde_json::Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn valid_params_resolve() {
        let params = body(json!({"size": "medium", "storageGB": 50}));
        let resolved = validate_params(&test_product(), &params).unwrap();
        assert_eq!(resolved["size"], Value::String("medium".into()));
        assert_eq!(resolved["storageGB"], Value::Int(50));
        // Default substituted for the optional parameter.
        assert_eq!(resolved["ha"], Value::Bool(false));
    }

    #[test]
    fn missing_required_parameter() {
        let params = body(json!({"storageGB": 50}));
        let errors = validate_params(&test_product(), &params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParamError::MissingParameter(n) if n == "size")));
    }

    #[test]
    fn unknown_parameter_rejected() {
        let params = body(json!({"size": "small", "storageGB": 50, "flavor": "spicy"}));
        let errors = validate_params(&test_product(), &params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParamError::UnknownParameter(n) if n == "flavor")));
    }

    #[test]
    fn type_mismatch_rejected() {
        let params = body(json!({"size": "small", "storageGB": "fifty"}));
        let errors = validate_params(&test_product(), &params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParamError::InvalidParameterType { name, .. } if name == "storageGB")));
    }

    #[test]
    fn range_violations_rejected() {
        let low = body(json!({"size": "small", "storageGB": 5}));
        let errors = validate_params(&test_product(), &low).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParamError::BelowMinimum { min: 10, .. })));

        let high = body(json!({"size": "small", "storageGB": 100_000}));
        let errors = validate_params(&test_product(), &high).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParamError::AboveMaximum { max: 65536, .. })));
    }

    #[test]
    fn choice_violation_rejected() {
        let params = body(json!({"size": "gigantic", "storageGB": 50}));
        let errors = validate_params(&test_product(), &params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParamError::InvalidChoice { name, .. } if name == "size")));
    }

    #[test]
    fn bool_type_checked() {
        let params = body(json!({"size": "small", "storageGB": 50, "ha": "yes"}));
        let errors = validate_params(&test_product(), &params).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ParamError::InvalidParameterType { name, .. } if name == "ha")));
    }

    #[test]
    fn multiple_errors_reported_together() {
        let params = body(json!({"storageGB": 5, "mystery": 1}));
        let errors = validate_params(&test_product(), &params).unwrap_err();
        assert_eq!(errors.len(), 3); // missing size, below min, unknown key
    }
}
