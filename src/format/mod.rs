/*!
# Result Formatter

Представление `QueryResult` в кодировках транспортов:

- `Text` - одна строка на символ, для терминала
- `Markdown` - для чат-клиентов
- `Json` / `Xml` - структурированный документ для MCP клиентов

Форматирование - чистая функция: разрешение запросов здесь не выполняется.
*/

pub mod structured;
pub mod text;

pub use structured::{parse_structured, to_json, to_xml};
pub use text::{signature_line, to_markdown, to_text};

use crate::core::QueryResult;

/// Кодировка ответа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Encoding {
    #[default]
    Text,
    Markdown,
    Json,
    Xml,
}

/// Renders a result in the given encoding
pub fn format(result: &QueryResult, encoding: Encoding) -> String {
    match encoding {
        Encoding::Text => to_text(result),
        Encoding::Markdown => to_markdown(result),
        Encoding::Json => to_json(result),
        Encoding::Xml => to_xml(result),
    }
}
