//! Порядок результатов поиска по префиксу

use std::cmp::Ordering;

use crate::core::Symbol;

/// Sorts prefix matches best first
///
/// 1. точное (с учетом регистра) совпадение префикса раньше совпадения без учета регистра;
/// 2. короткие имена раньше длинных (в символах, не в байтах);
/// 3. лексикографически по имени;
/// 4. лексикографически по полному имени.
///
/// Сортировка устойчивая, одинаковый вход всегда дает одинаковый порядок.
pub fn sort_by_relevance(prefix: &str, symbols: &mut [Symbol]) {
    symbols.sort_by(|a, b| compare(prefix, a, b));
}

fn compare(prefix: &str, a: &Symbol, b: &Symbol) -> Ordering {
    let exact_a = a.name.starts_with(prefix);
    let exact_b = b.name.starts_with(prefix);

    exact_b
        .cmp(&exact_a)
        .then_with(|| a.name.chars().count().cmp(&b.name.chars().count()))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.qualified_name().cmp(&b.qualified_name()))
}
