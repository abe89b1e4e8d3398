use derive_more::Display;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Embedding length produced by the face-api.js recognition net. Stored
/// descriptors of any other length never match a live frame, so registration
/// only warns about deviations instead of rejecting them.
pub const DESCRIPTOR_LEN: usize = 128;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum DescriptorError {
    #[display(fmt = "descriptor is not valid JSON")]
    InvalidJson,
    #[display(fmt = "descriptor shape is not supported")]
    UnsupportedShape,
    #[display(fmt = "descriptor is empty")]
    Empty,
}

/// The serialized shapes observed in stored data: a plain array, the same
/// array JSON-encoded a second time, an array wrapped in a one-element array,
/// or an index-keyed object map.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDescriptor {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
    Encoded(String),
    Keyed(HashMap<String, f32>),
}

/// Decodes any supported stored shape into a flat numeric vector. All call
/// sites go through here; none of them special-case shapes themselves.
pub fn normalize(value: &Value) -> Result<Vec<f32>, DescriptorError> {
    normalize_inner(value, 0)
}

/// Parses a raw stored string (the database column) and normalizes it.
pub fn parse(raw: &str) -> Result<Vec<f32>, DescriptorError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| DescriptorError::InvalidJson)?;
    normalize(&value)
}

fn normalize_inner(value: &Value, depth: u8) -> Result<Vec<f32>, DescriptorError> {
    let raw: RawDescriptor =
        serde_json::from_value(value.clone()).map_err(|_| DescriptorError::UnsupportedShape)?;

    let flat = match raw {
        RawDescriptor::Flat(v) => v,
        RawDescriptor::Nested(mut nested) => {
            if nested.len() != 1 {
                return Err(DescriptorError::UnsupportedShape);
            }
            nested.remove(0)
        }
        RawDescriptor::Encoded(inner) => {
            // double-encoded string: decode the payload once, never deeper
            if depth > 0 {
                return Err(DescriptorError::UnsupportedShape);
            }
            let value: Value =
                serde_json::from_str(&inner).map_err(|_| DescriptorError::InvalidJson)?;
            normalize_inner(&value, depth + 1)?
        }
        RawDescriptor::Keyed(map) => {
            // index-keyed map: order by numeric key, matching the insertion
            // order JS gives integer-like keys
            let mut entries: Vec<(usize, f32)> = Vec::with_capacity(map.len());
            for (key, val) in map {
                let idx: usize = key
                    .parse()
                    .map_err(|_| DescriptorError::UnsupportedShape)?;
                entries.push((idx, val));
            }
            entries.sort_by_key(|(idx, _)| *idx);
            entries.into_iter().map(|(_, v)| v).collect()
        }
    };

    if flat.is_empty() {
        return Err(DescriptorError::Empty);
    }

    Ok(flat)
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Maps a Euclidean distance onto a 0–100 similarity score. The 0.6 scale is
/// empirical: distance 0 scores 100, anything at or beyond 0.6 scores 0.
pub fn match_score(distance: f32) -> u8 {
    ((1.0 - distance / 0.6).max(0.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_array_passes_through() {
        let v = json!([0.1, -0.2, 0.3]);
        assert_eq!(normalize(&v).unwrap(), vec![0.1, -0.2, 0.3]);
    }

    #[test]
    fn double_encoded_string_is_unwrapped() {
        let inner = serde_json::to_string(&vec![0.5f32, 0.25]).unwrap();
        let v = Value::String(inner);
        assert_eq!(normalize(&v).unwrap(), vec![0.5, 0.25]);
    }

    #[test]
    fn singly_nested_array_is_unwrapped() {
        let v = json!([[1.0, 2.0, 3.0]]);
        assert_eq!(normalize(&v).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn doubly_nested_array_is_rejected() {
        let v = json!([[1.0], [2.0]]);
        assert_eq!(normalize(&v), Err(DescriptorError::UnsupportedShape));
    }

    #[test]
    fn keyed_map_is_ordered_numerically() {
        // lexicographic order would yield [a, c, b]
        let v = json!({"0": 1.0, "2": 3.0, "10": 11.0, "1": 2.0});
        assert_eq!(normalize(&v).unwrap(), vec![1.0, 2.0, 3.0, 11.0]);
    }

    #[test]
    fn non_index_keys_are_rejected() {
        let v = json!({"x": 1.0});
        assert_eq!(normalize(&v), Err(DescriptorError::UnsupportedShape));
    }

    #[test]
    fn empty_descriptor_is_rejected() {
        assert_eq!(parse("[]"), Err(DescriptorError::Empty));
    }

    #[test]
    fn garbage_is_invalid_json() {
        assert_eq!(parse("not json"), Err(DescriptorError::InvalidJson));
    }

    #[test]
    fn identical_vectors_score_100() {
        let a = vec![0.3f32; DESCRIPTOR_LEN];
        assert_eq!(euclidean_distance(&a, &a), 0.0);
        assert_eq!(match_score(0.0), 100);
    }

    #[test]
    fn score_scale_endpoints() {
        assert_eq!(match_score(0.6), 0);
        assert_eq!(match_score(1.2), 0);
        assert_eq!(match_score(0.3), 50);
    }
}
