//! Common serde helpers for reading documents back from SurrealDB
//!
//! 支持两种 record id 格式的反序列化：
//! - 字符串格式 "table:key" 或纯 key (来自 API JSON)
//! - SurrealDB 原生 RecordId 格式 (来自数据库)

use serde::{Deserialize, Deserializer};
use surrealdb::RecordId;

/// Deserialize bool that treats null as false
pub fn bool_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<bool>::deserialize(deserializer).map(|opt| opt.unwrap_or(false))
}

/// Deserialize an optional record id into its plain string key.
///
/// Accepts a native [`RecordId`], a `"table:key"` string, or a bare key
/// string; models never serialize the id back (writes address records
/// explicitly via `(table, key)` targets).
pub fn opt_record_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct KeyVisitor;

    impl<'de> Visitor<'de> for KeyVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a record id, a 'table:key' string, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(KeyVisitor)
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(strip_table_prefix(value).to_string()))
        }

        fn visit_map<M>(self, map: M) -> Result<Self::Value, M::Error>
        where
            M: de::MapAccess<'de>,
        {
            let record_id =
                RecordId::deserialize(de::value::MapAccessDeserializer::new(map))?;
            // Display escapes non-alphanumeric keys with ⟨⟩
            Ok(Some(
                strip_table_prefix(&record_id.key().to_string()).to_string(),
            ))
        }
    }

    deserializer.deserialize_option(KeyVisitor)
}

/// Strip a leading `table:` prefix and any `⟨⟩` key quoting.
pub fn strip_table_prefix(id: &str) -> &str {
    let key = match id.split_once(':') {
        Some((_, key)) => key,
        None => id,
    };
    key.trim_start_matches('⟨').trim_end_matches('⟩')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_quoting() {
        assert_eq!(strip_table_prefix("issue:abc123"), "abc123");
        assert_eq!(strip_table_prefix("abc123"), "abc123");
        assert_eq!(strip_table_prefix("issue:⟨a-b⟩"), "a-b");
    }
}
