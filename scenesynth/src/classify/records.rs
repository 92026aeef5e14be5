//! Classification results keyed by signature.

use crate::segment::Signature;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything classification learned about one signature.
///
/// Uniform cells carry empty `object_names` and an empty `fact_fragment`;
/// their foreground call was skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub cell_type: String,
    pub object_names: Vec<String>,
    pub fact_fragment: String,
}

/// Frozen signature -> record map in first-appearance order.
///
/// Built once per problem instance; assembly only reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationMap {
    map: IndexMap<Signature, ClassificationRecord>,
}

impl ClassificationMap {
    pub(crate) fn new(map: IndexMap<Signature, ClassificationRecord>) -> Self {
        Self { map }
    }

    pub fn get(&self, signature: Signature) -> Option<&ClassificationRecord> {
        self.map.get(&signature)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Signature, &ClassificationRecord)> {
        self.map.iter().map(|(signature, record)| (*signature, record))
    }

    /// JSON object keyed by the decimal signature, for the inspection
    /// artifact written next to the frame files.
    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::new();
        for (signature, record) in &self.map {
            // Records serialize through derive; failure would mean a
            // non-string key, which the types rule out.
            let value = serde_json::to_value(record).unwrap_or(Value::Null);
            object.insert(signature.to_string(), value);
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keys_are_decimal_signatures() {
        let mut map = IndexMap::new();
        map.insert(
            Signature(17),
            ClassificationRecord {
                cell_type: "grass".to_string(),
                object_names: vec![],
                fact_fragment: String::new(),
            },
        );
        map.insert(
            Signature(204),
            ClassificationRecord {
                cell_type: "grass".to_string(),
                object_names: vec!["box".to_string()],
                fact_fragment: "(= (xloc box) $j)".to_string(),
            },
        );
        let json = ClassificationMap::new(map).to_json();

        assert_eq!(json["17"]["cell_type"], "grass");
        assert_eq!(json["204"]["object_names"][0], "box");
        assert_eq!(json["204"]["fact_fragment"], "(= (xloc box) $j)");
    }

    #[test]
    fn test_lookup_by_signature() {
        let mut map = IndexMap::new();
        map.insert(Signature(9), ClassificationRecord::default());
        let map = ClassificationMap::new(map);
        assert!(map.get(Signature(9)).is_some());
        assert!(map.get(Signature(10)).is_none());
        assert_eq!(map.len(), 1);
    }
}
