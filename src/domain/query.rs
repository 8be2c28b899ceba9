//! Query-string helpers used to shape `GET` payloads
//!
//! Control fields are stripped from the free-form filter, the `_sort` directive
//! becomes an ordered field/direction mapping and `_limit`/`_page` become a
//! limit/offset pair. Every helper is total: malformed input degrades to defaults.

use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};

pub const CONTROL_FIELDS: [&str; 5] = ["_limit", "_page", "_sort", "_accessToken", "_refreshToken"];
pub const DEFAULT_SORT: &str = "id";
pub const DEFAULT_LIMIT: u64 = 20;
pub const DEFAULT_OFFSET: u64 = 0;

pub fn sanitize_query(query: &Map<String, Value>, exclude: &[&str]) -> Map<String, Value> {
    if query.is_empty() {
        return Map::new();
    }

    if exclude.is_empty() {
        return query.clone();
    }

    query
        .iter()
        .filter(|(key, _)| !exclude.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_i8(self) -> i8 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

impl Serialize for SortDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

/// Field/direction pairs in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    fields: Vec<(String, SortDirection)>,
}

impl SortOrder {
    pub fn insert(&mut self, field: impl Into<String>, direction: SortDirection) {
        let field = field.into();
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = direction,
            None => self.fields.push((field, direction)),
        }
    }

    pub fn get(&self, field: &str) -> Option<SortDirection> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, direction)| *direction)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.fields
            .iter()
            .map(|(name, direction)| (name.as_str(), *direction))
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, direction) in &self.fields {
            map.serialize_entry(field, direction)?;
        }
        map.end()
    }
}

/// Parses `"name,-age"` style directives. A missing or empty directive sorts by `id`.
pub fn parse_sort(sort: Option<&Value>) -> SortOrder {
    let directive = match sort {
        Some(Value::String(value)) if !value.is_empty() => value.as_str(),
        _ => DEFAULT_SORT,
    };

    let mut order = SortOrder::default();
    for field in directive.split(',') {
        match field.strip_prefix('-') {
            Some(name) => order.insert(name, SortDirection::Descending),
            None => order.insert(field, SortDirection::Ascending),
        }
    }
    order
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

pub fn paginate(limit: Option<&Value>, page: Option<&Value>) -> Pagination {
    let mut pagination = Pagination::default();

    if let Some(limit) = limit.and_then(value_to_int).filter(|limit| *limit > 0) {
        pagination.limit = limit.unsigned_abs();
    }

    if let Some(page) = page.and_then(value_to_int).filter(|page| *page > 0) {
        let page = page.unsigned_abs();
        pagination.offset = (page - 1).saturating_mul(pagination.limit);
    }

    pagination
}

/// Base-10 prefix parse: optional leading whitespace and sign, then at least one digit.
/// Trailing garbage is ignored, as in `"10px"`.
pub fn parse_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }

    let magnitude = rest[..digits_len]
        .bytes()
        .fold(0i64, |acc, digit| acc.saturating_mul(10).saturating_add(i64::from(digit - b'0')));

    Some(if negative { -magnitude } else { magnitude })
}

fn value_to_int(value: &Value) -> Option<i64> {
    match value {
        Value::String(text) => parse_int(text),
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}
