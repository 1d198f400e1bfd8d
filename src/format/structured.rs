//! Structured (JSON / XML) rendering: the wire contract for MCP clients
//!
//! ```json
//! {"status":"ok","results":[{"name":"...","kind":"GlobalFunction","declaringType":null,
//!   "parameters":[{"name":"...","type":"...","required":true}],
//!   "returnType":"...","summary":"..."}]}
//! {"status":"error","error":{"kind":"NotFound","message":"...","query":"..."}}
//! ```

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::core::{Matches, Parameter, QueryError, QueryResult, Signature, Symbol, SymbolKind};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolDocument {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    english_name: Option<String>,
    kind: SymbolKind,
    declaring_type: Option<String>,
    #[serde(default)]
    parameters: Vec<Parameter>,
    return_type: Option<String>,
    summary: Option<String>,
}

impl From<&Symbol> for SymbolDocument {
    fn from(symbol: &Symbol) -> Self {
        Self {
            name: symbol.name.clone(),
            english_name: symbol.english_name.clone(),
            kind: symbol.kind,
            declaring_type: symbol.declaring_type.clone(),
            parameters: symbol.signature.parameters.clone(),
            return_type: symbol.signature.return_type.clone(),
            summary: symbol.summary.clone(),
        }
    }
}

impl From<SymbolDocument> for Symbol {
    fn from(doc: SymbolDocument) -> Self {
        Symbol {
            name: doc.name,
            english_name: doc.english_name,
            kind: doc.kind,
            declaring_type: doc.declaring_type,
            signature: Signature {
                parameters: doc.parameters,
                return_type: doc.return_type,
            },
            summary: doc.summary,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Envelope {
    Ok { results: Vec<SymbolDocument> },
    Error { error: QueryError },
}

impl From<&QueryResult> for Envelope {
    fn from(result: &QueryResult) -> Self {
        match result {
            Ok(matches) => Envelope::Ok {
                results: matches.iter().map(SymbolDocument::from).collect(),
            },
            Err(e) => Envelope::Error { error: e.clone() },
        }
    }
}

fn serialization_failure(what: &str, e: impl std::fmt::Display) -> QueryError {
    error!("Failed to serialize {} response: {}", what, e);
    QueryError::internal(format!("failed to serialize {} response: {}", what, e))
}

pub fn to_json(result: &QueryResult) -> String {
    serde_json::to_string(&Envelope::from(result)).unwrap_or_else(|e| {
        let fallback = Envelope::Error {
            error: serialization_failure("JSON", e),
        };
        serde_json::to_string(&fallback).unwrap_or_else(|_| {
            r#"{"status":"error","error":{"kind":"Internal","message":"serialization failed"}}"#
                .to_string()
        })
    })
}

/// Parses the JSON rendering back into a result
pub fn parse_structured(input: &str) -> QueryResult {
    let envelope: Envelope = serde_json::from_str(input)
        .map_err(|e| QueryError::invalid_input(format!("malformed structured response: {}", e)))?;

    match envelope {
        Envelope::Ok { results } => {
            Matches::new(results.into_iter().map(Symbol::from).collect()).ok_or_else(|| {
                QueryError::invalid_input("structured response has status ok but no results")
            })
        }
        Envelope::Error { error } => Err(error),
    }
}

// quick-xml не поддерживает внутренне тегированные перечисления,
// поэтому для XML используется отдельная плоская модель.

#[derive(Serialize)]
struct XmlResponse<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<XmlResults<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<XmlError<'a>>,
}

#[derive(Serialize)]
struct XmlResults<'a> {
    symbol: Vec<XmlSymbol<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct XmlSymbol<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    english_name: Option<&'a str>,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    declaring_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<XmlParameters<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
}

#[derive(Serialize)]
struct XmlParameters<'a> {
    parameter: Vec<XmlParameter<'a>>,
}

#[derive(Serialize)]
struct XmlParameter<'a> {
    name: &'a str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    type_name: Option<&'a str>,
    required: bool,
}

#[derive(Serialize)]
struct XmlError<'a> {
    kind: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
}

fn xml_symbol(symbol: &Symbol) -> XmlSymbol<'_> {
    let parameters = &symbol.signature.parameters;
    XmlSymbol {
        name: &symbol.name,
        english_name: symbol.english_name.as_deref(),
        kind: symbol.kind.as_str(),
        declaring_type: symbol.declaring_type.as_deref(),
        parameters: (!parameters.is_empty()).then(|| XmlParameters {
            parameter: parameters
                .iter()
                .map(|p| XmlParameter {
                    name: &p.name,
                    type_name: p.type_name.as_deref(),
                    required: p.required,
                })
                .collect(),
        }),
        return_type: symbol.signature.return_type.as_deref(),
        summary: symbol.summary.as_deref(),
    }
}

fn xml_response(result: &QueryResult) -> XmlResponse<'_> {
    match result {
        Ok(matches) => XmlResponse {
            status: "ok",
            results: Some(XmlResults {
                symbol: matches.iter().map(xml_symbol).collect(),
            }),
            error: None,
        },
        Err(e) => XmlResponse {
            status: "error",
            results: None,
            error: Some(XmlError {
                kind: e.kind.as_str(),
                message: &e.message,
                query: e.query.as_deref(),
            }),
        },
    }
}

const XML_FALLBACK: &str = "<response><status>error</status><error><kind>Internal</kind>\
                            <message>serialization failed</message></error></response>";

pub fn to_xml(result: &QueryResult) -> String {
    quick_xml::se::to_string_with_root("response", &xml_response(result)).unwrap_or_else(|e| {
        let fallback: QueryResult = Err(serialization_failure("XML", e));
        quick_xml::se::to_string_with_root("response", &xml_response(&fallback))
            .unwrap_or_else(|_| XML_FALLBACK.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> QueryResult {
        Ok(Matches::new(vec![
            Symbol::new("Формат", SymbolKind::GlobalFunction)
                .with_english_name("Format")
                .with_parameter("Значение", None, true)
                .with_parameter("ФорматнаяСтрока", Some("Строка"), false)
                .with_return_type("Строка")
                .with_summary("Форматирует значение <по строке>"),
            Symbol::new("Количество", SymbolKind::Method)
                .with_declaring_type("Массив")
                .with_return_type("Число"),
        ])
        .unwrap())
    }

    #[test]
    fn test_json_shape() {
        let result: QueryResult =
            Ok(Matches::new(vec![Symbol::new("Массив", SymbolKind::Type)]).unwrap());
        assert_eq!(
            to_json(&result),
            concat!(
                r#"{"status":"ok","results":[{"name":"Массив","kind":"Type","declaringType":null,"#,
                r#""parameters":[],"returnType":null,"summary":null}]}"#
            )
        );

        let failure: QueryResult =
            Err(QueryError::not_found("no such type").with_query("members of \"Х\""));
        assert_eq!(
            to_json(&failure),
            concat!(
                r#"{"status":"error","error":{"kind":"NotFound","message":"no such type","#,
                r#""query":"members of \"Х\""}}"#
            )
        );
    }

    #[test]
    fn test_json_round_trip_keeps_order() {
        let result = sample();
        let parsed = parse_structured(&to_json(&result));
        assert_eq!(parsed, result);

        let failure: QueryResult = Err(QueryError::index_unavailable("not loaded"));
        assert_eq!(parse_structured(&to_json(&failure)), failure);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_structured("<response/>").unwrap_err();
        assert_eq!(err.kind, crate::core::FailureKind::InvalidInput);
        let err = parse_structured(r#"{"status":"ok","results":[]}"#).unwrap_err();
        assert_eq!(err.kind, crate::core::FailureKind::InvalidInput);
    }

    #[test]
    fn test_xml_document() {
        let xml = to_xml(&sample());
        assert!(xml.starts_with("<response><status>ok</status><results><symbol>"));
        assert!(xml.contains("<name>Формат</name>"));
        assert!(xml.contains("<kind>GlobalFunction</kind>"));
        assert!(xml.contains(
            "<parameters><parameter><name>Значение</name><required>true</required></parameter>"
        ));
        assert!(xml.contains("<type>Строка</type>"));
        assert!(xml.contains("&lt;по строке&gt;"));
        assert!(xml.contains("<declaringType>Массив</declaringType>"));
    }

    #[test]
    fn test_xml_failure() {
        let failure: QueryResult = Err(QueryError::invalid_input("empty name"));
        assert_eq!(
            to_xml(&failure),
            "<response><status>error</status><error><kind>InvalidInput</kind>\
             <message>empty name</message></error></response>"
        );
    }
}
