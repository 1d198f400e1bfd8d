//! Текстовое и markdown представление результатов

use std::fmt::Write;

use crate::core::{QueryError, QueryResult, Symbol, SymbolKind};

/// Signature line of one symbol
///
/// `Тип.Метод(Параметр: Тип, [Необязательный: Тип]) -> Результат`,
/// `Тип.Свойство: Тип`, `Новый Тип(Параметр: Тип)` для конструкторов
/// или просто имя для типов.
pub fn signature_line(symbol: &Symbol) -> String {
    let mut line = match symbol.kind {
        SymbolKind::Constructor => format!("Новый {}", symbol.name),
        _ => symbol.qualified_name(),
    };

    if symbol.kind.is_callable() {
        let params = symbol
            .signature
            .parameters
            .iter()
            .map(|p| {
                let mut param = p.name.clone();
                if let Some(type_name) = &p.type_name {
                    param.push_str(&format!(": {}", type_name));
                }
                if !p.required {
                    param = format!("[{}]", param);
                }
                param
            })
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&format!("({})", params));
        if let Some(return_type) = &symbol.signature.return_type {
            line.push_str(&format!(" -> {}", return_type));
        }
    } else if symbol.kind != SymbolKind::Type {
        if let Some(type_name) = &symbol.signature.return_type {
            line.push_str(&format!(": {}", type_name));
        }
    }

    line
}

fn failure_line(error: &QueryError) -> String {
    match &error.query {
        Some(query) => format!("{}: {} (query: {})", error.kind, error.message, query),
        None => format!("{}: {}", error.kind, error.message),
    }
}

/// One line per symbol, summary indented beneath
pub fn to_text(result: &QueryResult) -> String {
    let matches = match result {
        Ok(matches) => matches,
        Err(error) => return failure_line(error) + "\n",
    };

    let mut out = String::new();
    for symbol in matches.iter() {
        let _ = writeln!(out, "{}", signature_line(symbol));
        if let Some(summary) = &symbol.summary {
            for line in summary.lines().filter(|l| !l.trim().is_empty()) {
                let _ = writeln!(out, "    {}", line.trim());
            }
        }
    }
    out
}

pub fn to_markdown(result: &QueryResult) -> String {
    let matches = match result {
        Ok(matches) => matches,
        Err(error) => {
            let mut line = format!("❌ **{}**: {}", error.kind, error.message);
            if let Some(query) = &error.query {
                let _ = write!(line, " (`{}`)", query);
            }
            return line + "\n";
        }
    };

    let mut out = format!("## Найдено: {}\n", matches.len());
    for symbol in matches.iter() {
        let _ = write!(out, "\n```bsl\n{}\n```\n", signature_line(symbol));
        let _ = write!(out, "*{}*", symbol.kind);
        if let Some(english) = &symbol.english_name {
            let _ = write!(out, " · {}", english);
        }
        out.push('\n');
        if let Some(summary) = &symbol.summary {
            let _ = write!(out, "\n{}\n", summary.trim());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Matches;
    use pretty_assertions::assert_eq;

    fn str_find() -> Symbol {
        Symbol::new("СтрНайти", SymbolKind::GlobalFunction)
            .with_english_name("StrFind")
            .with_parameter("Строка", Some("Строка"), true)
            .with_parameter("ПодстрокаПоиска", Some("Строка"), true)
            .with_parameter("НачальнаяПозиция", Some("Число"), false)
            .with_return_type("Число")
            .with_summary("Находит первое вхождение подстроки.")
    }

    #[test]
    fn test_callable_signature() {
        assert_eq!(
            signature_line(&str_find()),
            "СтрНайти(Строка: Строка, ПодстрокаПоиска: Строка, [НачальнаяПозиция: Число]) -> Число"
        );

        let procedure = Symbol::new("Очистить", SymbolKind::Method).with_declaring_type("Массив");
        assert_eq!(signature_line(&procedure), "Массив.Очистить()");
    }

    #[test]
    fn test_property_and_type_lines() {
        let property = Symbol::new("Количество", SymbolKind::Property)
            .with_declaring_type("КоллекцияКолонок")
            .with_return_type("Число");
        assert_eq!(signature_line(&property), "КоллекцияКолонок.Количество: Число");

        let constant = Symbol::new("Приход", SymbolKind::Constant)
            .with_declaring_type("ВидДвиженияНакопления");
        assert_eq!(signature_line(&constant), "ВидДвиженияНакопления.Приход");

        assert_eq!(signature_line(&Symbol::new("Массив", SymbolKind::Type)), "Массив");
    }

    #[test]
    fn test_constructor_line() {
        let constructor = Symbol::new("Массив", SymbolKind::Constructor)
            .with_declaring_type("Массив")
            .with_parameter("КоличествоЭлементов", Some("Число"), false);
        assert_eq!(signature_line(&constructor), "Новый Массив([КоличествоЭлементов: Число])");

        let default = Symbol::new("Array", SymbolKind::Constructor).with_declaring_type("Массив");
        assert_eq!(signature_line(&default), "Новый Array()");
    }

    #[test]
    fn test_text_indents_summary() {
        let result = Ok(Matches::new(vec![str_find()]).unwrap());
        let text = to_text(&result);
        assert_eq!(
            text,
            "СтрНайти(Строка: Строка, ПодстрокаПоиска: Строка, \
             [НачальнаяПозиция: Число]) -> Число\n    Находит первое вхождение подстроки.\n"
        );
    }

    #[test]
    fn test_text_failure_line() {
        let result: QueryResult =
            Err(QueryError::not_found("symbol 'Х' not found").with_query("lookup \"Х\""));
        assert_eq!(
            to_text(&result),
            "NotFound: symbol 'Х' not found (query: lookup \"Х\")\n"
        );
    }

    #[test]
    fn test_markdown_blocks() {
        let result = Ok(Matches::new(vec![str_find()]).unwrap());
        let markdown = to_markdown(&result);
        assert!(markdown.starts_with("## Найдено: 1\n"));
        assert!(markdown.contains("```bsl\nСтрНайти(Строка: Строка"));
        assert!(markdown.contains("*GlobalFunction* · StrFind"));

        let failure: QueryResult = Err(QueryError::index_unavailable("not loaded"));
        assert_eq!(to_markdown(&failure), "❌ **IndexUnavailable**: not loaded\n");
    }
}
