//! Argument shapes accepted by the catalog tools.
//!
//! Each tool belongs to exactly one shape. A shape is a serde struct: the
//! same type produces the input schema shown to clients and decodes the
//! untyped argument bag of a call, so the two never disagree.

use std::sync::Arc;

use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::ToolError;
use super::query::QueryOptions;

/// Record limit applied when the caller does not send `top`.
pub const DEFAULT_TOP: u64 = 100;

/// Monthly series keyed by `ano_mes` (paginated, no sort).
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MonthlyParams {
    #[schemars(description = "Ano e mês no formato YYYYMM (exemplo: '202312')")]
    pub ano_mes: String,

    #[schemars(description = "Número máximo de registros a retornar (padrão: 100)")]
    #[schemars(with = "Option<u64>")]
    #[serde(default, deserialize_with = "lenient_count")]
    pub top: Option<u64>,

    #[schemars(description = "Número de registros a pular para paginação")]
    #[schemars(with = "Option<u64>")]
    #[serde(default, deserialize_with = "lenient_count")]
    pub skip: Option<u64>,

    #[schemars(
        description = "Filtro OData para refinar a consulta (exemplo: \"Modalidade eq 'PIX'\")"
    )]
    #[serde(default)]
    pub filtro: Option<String>,
}

/// Quarterly series that supports pagination.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QuarterlyPagedParams {
    #[schemars(
        description = "Ano e trimestre no formato YYYYQ (exemplo: '20234' para 4º trimestre de 2023)"
    )]
    pub trimestre: String,

    #[schemars(description = "Número máximo de registros a retornar (padrão: 100)")]
    #[schemars(with = "Option<u64>")]
    #[serde(default, deserialize_with = "lenient_count")]
    pub top: Option<u64>,

    #[schemars(description = "Número de registros a pular para paginação")]
    #[schemars(with = "Option<u64>")]
    #[serde(default, deserialize_with = "lenient_count")]
    pub skip: Option<u64>,

    #[schemars(description = "Filtro OData para refinar a consulta")]
    #[serde(default)]
    pub filtro: Option<String>,
}

/// Quarterly series that supports ordering.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QuarterlySortedParams {
    #[schemars(description = "Ano e trimestre no formato YYYYQ (exemplo: '20234')")]
    pub trimestre: String,

    #[schemars(description = "Número máximo de registros a retornar (padrão: 100)")]
    #[schemars(with = "Option<u64>")]
    #[serde(default, deserialize_with = "lenient_count")]
    pub top: Option<u64>,

    #[schemars(description = "Campo para ordenação (exemplo: 'Trimestre desc')")]
    #[serde(default)]
    pub ordenar_por: Option<String>,

    #[schemars(description = "Filtro OData para refinar a consulta")]
    #[serde(default)]
    pub filtro: Option<String>,
}

/// Quarterly series with only a limit and a filter.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QuarterlyParams {
    #[schemars(description = "Ano e trimestre no formato YYYYQ (exemplo: '20234')")]
    pub trimestre: String,

    #[schemars(description = "Número máximo de registros a retornar (padrão: 100)")]
    #[schemars(with = "Option<u64>")]
    #[serde(default, deserialize_with = "lenient_count")]
    pub top: Option<u64>,

    #[schemars(description = "Filtro OData para refinar a consulta")]
    #[serde(default)]
    pub filtro: Option<String>,
}

/// The argument shape a tool accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamShape {
    Monthly,
    QuarterlyPaged,
    QuarterlySorted,
    Quarterly,
}

/// A decoded call: the period identifier plus the query options to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    pub period: String,
    pub options: QueryOptions,
}

impl ParamShape {
    /// JSON schema advertised for this shape.
    pub fn input_schema(self) -> Arc<JsonObject> {
        match self {
            Self::Monthly => schema_for_type::<MonthlyParams>().into(),
            Self::QuarterlyPaged => schema_for_type::<QuarterlyPagedParams>().into(),
            Self::QuarterlySorted => schema_for_type::<QuarterlySortedParams>().into(),
            Self::Quarterly => schema_for_type::<QuarterlyParams>().into(),
        }
    }

    /// Decode an untyped argument bag.
    ///
    /// `null` counts as an empty object. Missing required fields and
    /// mistyped values fail with [`ToolError::InvalidRequest`].
    pub fn decode(self, tool: &str, arguments: Value) -> Result<DecodedCall, ToolError> {
        let arguments = match arguments {
            Value::Null => Value::Object(JsonObject::new()),
            Value::Object(map) => Value::Object(map),
            other => {
                return Err(ToolError::invalid_request(format!(
                    "arguments for {tool} must be a JSON object, got {}",
                    json_type(&other)
                )));
            }
        };

        let invalid =
            |e: serde_json::Error| ToolError::invalid_request(format!("{tool}: {e}"));

        let (period, top, skip, orderby, filter) = match self {
            Self::Monthly => {
                let p: MonthlyParams = serde_json::from_value(arguments).map_err(invalid)?;
                (p.ano_mes, p.top, p.skip, None, p.filtro)
            }
            Self::QuarterlyPaged => {
                let p: QuarterlyPagedParams =
                    serde_json::from_value(arguments).map_err(invalid)?;
                (p.trimestre, p.top, p.skip, None, p.filtro)
            }
            Self::QuarterlySorted => {
                let p: QuarterlySortedParams =
                    serde_json::from_value(arguments).map_err(invalid)?;
                (p.trimestre, p.top, None, p.ordenar_por, p.filtro)
            }
            Self::Quarterly => {
                let p: QuarterlyParams = serde_json::from_value(arguments).map_err(invalid)?;
                (p.trimestre, p.top, None, None, p.filtro)
            }
        };

        if period.trim().is_empty() {
            return Err(ToolError::invalid_request(format!(
                "{tool}: period identifier must not be empty"
            )));
        }

        Ok(DecodedCall {
            period,
            options: QueryOptions {
                top: Some(top.unwrap_or(DEFAULT_TOP)),
                skip,
                filter,
                orderby,
                ..QueryOptions::json()
            },
        })
    }
}

/// Accept a non-negative integer given as a JSON number or a numeric string.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
            (Some(v), _) => Ok(Some(v)),
            (None, Some(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                Ok(Some(f as u64))
            }
            _ => Err(D::Error::custom(format!(
                "expected a non-negative integer, got {n}"
            ))),
        },
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| {
            D::Error::custom(format!("expected a non-negative integer, got {s:?}"))
        }),
        Some(other) => Err(D::Error::custom(format!(
            "expected a non-negative integer, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_monthly_defaults_top() {
        let call = ParamShape::Monthly
            .decode("t", json!({ "ano_mes": "202312" }))
            .unwrap();
        assert_eq!(call.period, "202312");
        assert_eq!(call.options.top, Some(DEFAULT_TOP));
        assert_eq!(call.options.format.as_deref(), Some("json"));
        assert_eq!(call.options.skip, None);
    }

    #[test]
    fn test_missing_period_is_rejected() {
        let err = ParamShape::Quarterly
            .decode("consultar_terminais_atm", json!({ "top": 5 }))
            .unwrap_err();
        match err {
            ToolError::InvalidRequest(msg) => {
                assert!(msg.contains("consultar_terminais_atm"));
                assert!(msg.contains("trimestre"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_mistyped_period_is_rejected() {
        let err = ParamShape::Monthly
            .decode("t", json!({ "ano_mes": 202312 }))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidRequest(_)));
    }

    #[test]
    fn test_counts_accept_numeric_strings_and_integral_floats() {
        let call = ParamShape::QuarterlyPaged
            .decode("t", json!({ "trimestre": "20234", "top": "25", "skip": 50.0 }))
            .unwrap();
        assert_eq!(call.options.top, Some(25));
        assert_eq!(call.options.skip, Some(50));
    }

    #[test]
    fn test_counts_reject_negative_and_garbage() {
        for bad in [json!(-1), json!(2.5), json!("many"), json!(true)] {
            let result = ParamShape::Quarterly.decode("t", json!({ "trimestre": "20234", "top": bad }));
            assert!(matches!(result, Err(ToolError::InvalidRequest(_))));
        }
    }

    #[test]
    fn test_shapes_only_carry_their_options() {
        let args = json!({
            "trimestre": "20234",
            "skip": 10,
            "ordenar_por": "Trimestre desc",
            "filtro": "x eq 1"
        });

        let sorted = ParamShape::QuarterlySorted.decode("t", args.clone()).unwrap();
        assert_eq!(sorted.options.skip, None);
        assert_eq!(sorted.options.orderby.as_deref(), Some("Trimestre desc"));

        let plain = ParamShape::Quarterly.decode("t", args).unwrap();
        assert_eq!(plain.options.skip, None);
        assert_eq!(plain.options.orderby, None);
        assert_eq!(plain.options.filter.as_deref(), Some("x eq 1"));
    }

    #[test]
    fn test_null_arguments_behave_like_empty_object() {
        for shape in [
            ParamShape::Monthly,
            ParamShape::QuarterlyPaged,
            ParamShape::QuarterlySorted,
            ParamShape::Quarterly,
        ] {
            let from_null = shape.decode("t", Value::Null);
            let from_empty = shape.decode("t", json!({}));
            assert!(matches!(from_null, Err(ToolError::InvalidRequest(_))));
            assert_eq!(from_null, from_empty);
        }
    }

    #[test]
    fn test_non_object_arguments_are_rejected() {
        let err = ParamShape::Monthly.decode("t", json!(["202312"])).unwrap_err();
        assert_eq!(
            err,
            ToolError::invalid_request("arguments for t must be a JSON object, got an array")
        );
    }

    #[test]
    fn test_schema_lists_required_period() {
        let schema = ParamShape::Monthly.input_schema();
        let required = schema.get("required").and_then(Value::as_array).unwrap();
        assert_eq!(required, &vec![json!("ano_mes")]);
        let properties = schema.get("properties").and_then(Value::as_object).unwrap();
        assert!(properties.contains_key("skip"));
        assert!(!properties.contains_key("ordenar_por"));
    }
}
