//! Tool catalog.
//!
//! The fixed, ordered list of tools this server exposes, built once on first
//! use and never mutated. Each entry binds a public [`ToolDescriptor`] to the
//! OData entity set it queries and the argument shape it accepts; only the
//! descriptor ever leaves this module through [`list`].

use std::sync::{Arc, LazyLock};

use rmcp::model::{JsonObject, Tool};
use serde::Serialize;

use super::params::ParamShape;

/// Public description of a tool: what transports list to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Arc<JsonObject>,
}

impl ToolDescriptor {
    /// Convert into the rmcp tool model used by the line protocol.
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.into(),
            description: Some(self.description.into()),
            input_schema: self.input_schema.clone(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// OData endpoint of a tool: an entity set filtered by one period key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointTemplate {
    pub entity_set: &'static str,
    pub key: &'static str,
}

impl EndpointTemplate {
    /// Render the relative endpoint for a period, e.g.
    /// `TerminaisATMDA(trimestre=@trimestre)?%40trimestre=%2720234%27`.
    ///
    /// The period goes into an OData string literal (quotes doubled) passed
    /// through the parameter alias, form-urlencoded.
    pub fn render(&self, period: &str) -> String {
        let alias = format!("@{}", self.key);
        let literal = format!("'{}'", period.replace('\'', "''"));
        let query = serde_urlencoded::to_string(&[(alias.as_str(), literal.as_str())])
            .unwrap_or_default();
        format!("{}({key}=@{key})?{query}", self.entity_set, key = self.key)
    }
}

/// A catalog entry.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub descriptor: ToolDescriptor,
    pub endpoint: EndpointTemplate,
    pub shape: ParamShape,
}

struct Definition {
    name: &'static str,
    description: &'static str,
    entity_set: &'static str,
    key: &'static str,
    shape: ParamShape,
}

const DEFINITIONS: &[Definition] = &[
    Definition {
        name: "consultar_meios_pagamento_mensal",
        description: "Consulta dados mensais sobre meios de pagamento, incluindo operações com boletos bancários, PIX, TED, DOC e outros. Use o formato YYYYMM para o parâmetro ano_mes (exemplo: '202312' para dezembro de 2023).",
        entity_set: "MeiosdePagamentosMensalDA",
        key: "AnoMes",
        shape: ParamShape::Monthly,
    },
    Definition {
        name: "consultar_meios_pagamento_trimestral",
        description: "Consulta dados trimestrais sobre operações com cartões de pagamento e transferências de crédito. Use o formato YYYYQ para o parâmetro trimestre (exemplo: '20234' para o 4º trimestre de 2023).",
        entity_set: "MeiosdePagamentosTrimestralDA",
        key: "trimestre",
        shape: ParamShape::QuarterlyPaged,
    },
    Definition {
        name: "consultar_transacoes_cartoes",
        description: "Consulta estoque e transações de cartões de pagamento por trimestre. Retorna dados sobre quantidade e valor das transações realizadas com cartões.",
        entity_set: "Quantidadeetransacoesdecartoes",
        key: "trimestre",
        shape: ParamShape::QuarterlySorted,
    },
    Definition {
        name: "consultar_estabelecimentos_credenciados",
        description: "Consulta quantidade de estabelecimentos credenciados para aceitar meios de pagamento eletrônico por trimestre.",
        entity_set: "EstabCredTransDA",
        key: "trimestre",
        shape: ParamShape::QuarterlySorted,
    },
    Definition {
        name: "consultar_taxas_intercambio",
        description: "Consulta taxas de intercâmbio praticadas no mercado de meios de pagamento por trimestre.",
        entity_set: "TaxasIntercambioDA",
        key: "trimestre",
        shape: ParamShape::Quarterly,
    },
    Definition {
        name: "consultar_taxas_desconto",
        description: "Consulta taxas de desconto cobradas de estabelecimentos comerciais por operações com meios de pagamento.",
        entity_set: "TaxasDescontoDA",
        key: "trimestre",
        shape: ParamShape::Quarterly,
    },
    Definition {
        name: "consultar_terminais_atm",
        description: "Consulta estatísticas sobre terminais de autoatendimento (ATM/caixas eletrônicos) por trimestre.",
        entity_set: "TerminaisATMDA",
        key: "trimestre",
        shape: ParamShape::Quarterly,
    },
    Definition {
        name: "consultar_portadores_cartao",
        description: "Consulta informações sobre portadores de cartões de pagamento por trimestre.",
        entity_set: "PortadoresCartaoDA",
        key: "trimestre",
        shape: ParamShape::Quarterly,
    },
];

static CATALOG: LazyLock<Vec<CatalogEntry>> = LazyLock::new(|| {
    DEFINITIONS
        .iter()
        .map(|d| CatalogEntry {
            descriptor: ToolDescriptor {
                name: d.name,
                description: d.description,
                input_schema: d.shape.input_schema(),
            },
            endpoint: EndpointTemplate {
                entity_set: d.entity_set,
                key: d.key,
            },
            shape: d.shape,
        })
        .collect()
});

/// All tool descriptors, in catalog order.
pub fn list() -> Vec<ToolDescriptor> {
    CATALOG.iter().map(|e| e.descriptor.clone()).collect()
}

/// Look up a catalog entry by tool name.
pub fn lookup(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.descriptor.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_eight_tools_in_order() {
        let names: Vec<_> = list().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "consultar_meios_pagamento_mensal",
                "consultar_meios_pagamento_trimestral",
                "consultar_transacoes_cartoes",
                "consultar_estabelecimentos_credenciados",
                "consultar_taxas_intercambio",
                "consultar_taxas_desconto",
                "consultar_terminais_atm",
                "consultar_portadores_cartao",
            ]
        );
    }

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = list().iter().map(|d| d.name).collect();
        assert_eq!(names.len(), DEFINITIONS.len());
    }

    #[test]
    fn test_list_is_stable() {
        assert_eq!(list(), list());
    }

    #[test]
    fn test_descriptor_serializes_without_endpoint() {
        let tools = list();
        let descriptor = &tools[0];
        let value = serde_json::to_value(descriptor).unwrap();
        let object = value.as_object().unwrap();
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["description", "inputSchema", "name"]);
    }

    #[test]
    fn test_render_monthly_endpoint() {
        let entry = lookup("consultar_meios_pagamento_mensal").unwrap();
        assert_eq!(
            entry.endpoint.render("202312"),
            "MeiosdePagamentosMensalDA(AnoMes=@AnoMes)?%40AnoMes=%27202312%27"
        );
    }

    #[test]
    fn test_render_escapes_quotes() {
        let template = EndpointTemplate {
            entity_set: "TerminaisATMDA",
            key: "trimestre",
        };
        assert_eq!(
            template.render("2023'4"),
            "TerminaisATMDA(trimestre=@trimestre)?%40trimestre=%272023%27%274%27"
        );
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(lookup("nao_existe").is_none());
    }

    #[test]
    fn test_to_tool_keeps_schema() {
        let tools = list();
        let descriptor = &tools[6];
        let tool = descriptor.to_tool();
        assert_eq!(tool.name, "consultar_terminais_atm");
        assert_eq!(tool.input_schema, descriptor.input_schema);
    }
}
