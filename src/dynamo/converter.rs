// ABOUTME: DynamoDB item to JSON conversion used by backup files
// ABOUTME: Lossless for every attribute type, including exact number text, binary and sets

use crate::store::Record;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue;
use base64::Engine;
use serde_json::{Map, Number, Value as JsonValue};

const BINARY_TAG: &str = "$binary";
const STRING_SET_TAG: &str = "$ss";
const NUMBER_SET_TAG: &str = "$ns";
const BINARY_SET_TAG: &str = "$bs";
const MAP_TAG: &str = "$map";

const RESERVED_TAGS: [&str; 5] = [
    BINARY_TAG,
    STRING_SET_TAG,
    NUMBER_SET_TAG,
    BINARY_SET_TAG,
    MAP_TAG,
];

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),

    #[error("invalid base64 binary value: {0}")]
    InvalidBinary(String),

    #[error("tagged value {tag} must hold {expected}")]
    InvalidTag { tag: String, expected: &'static str },

    #[error("unsupported attribute type: {0}")]
    UnsupportedAttribute(String),

    #[error("attribute '{name}': {source}")]
    Attribute {
        name: String,
        #[source]
        source: Box<CodecError>,
    },
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn number_to_json(text: &str) -> Result<Number, CodecError> {
    serde_json::from_str::<Number>(text).map_err(|_| CodecError::InvalidNumber(text.to_string()))
}

fn blob_to_json(blob: &Blob) -> JsonValue {
    JsonValue::String(base64::engine::general_purpose::STANDARD.encode(blob.as_ref()))
}

fn blob_from_json(tag: &str, value: &JsonValue) -> Result<Blob, CodecError> {
    let text = value.as_str().ok_or_else(|| CodecError::InvalidTag {
        tag: tag.to_string(),
        expected: "a base64 string",
    })?;
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map(Blob::new)
        .map_err(|e| CodecError::InvalidBinary(e.to_string()))
}

fn tagged(tag: &str, value: JsonValue) -> JsonValue {
    let mut object = Map::with_capacity(1);
    object.insert(tag.to_string(), value);
    JsonValue::Object(object)
}

fn has_reserved_shape(object: &Map<String, JsonValue>) -> bool {
    object.len() == 1
        && object
            .keys()
            .next()
            .is_some_and(|key| RESERVED_TAGS.contains(&key.as_str()))
}

/// Convert a single DynamoDB attribute value to JSON.
///
/// Strings, numbers, booleans, null, lists and maps map onto their natural JSON
/// forms. Numbers keep their exact decimal text. Binary values and the three
/// set types become single-key tagged objects:
/// - B → `{"$binary": "<base64>"}`
/// - SS → `{"$ss": ["a", "b"]}`
/// - NS → `{"$ns": [1, 2.5]}`
/// - BS → `{"$bs": ["<base64>", ...]}`
///
/// A map whose only key collides with one of those tags is wrapped as
/// `{"$map": {...}}` so it cannot be mistaken for a tagged value.
pub fn attribute_to_json(value: &AttributeValue) -> Result<JsonValue, CodecError> {
    match value {
        AttributeValue::S(s) => Ok(JsonValue::String(s.clone())),
        AttributeValue::N(n) => Ok(JsonValue::Number(number_to_json(n)?)),
        AttributeValue::Bool(b) => Ok(JsonValue::Bool(*b)),
        AttributeValue::Null(_) => Ok(JsonValue::Null),
        AttributeValue::B(blob) => Ok(tagged(BINARY_TAG, blob_to_json(blob))),
        AttributeValue::L(list) => {
            let json_list: Result<Vec<JsonValue>, CodecError> =
                list.iter().map(attribute_to_json).collect();
            Ok(JsonValue::Array(json_list?))
        }
        AttributeValue::M(map) => {
            let object = map_to_json(map)?;
            if has_reserved_shape(&object) {
                Ok(tagged(MAP_TAG, JsonValue::Object(object)))
            } else {
                Ok(JsonValue::Object(object))
            }
        }
        AttributeValue::Ss(set) => Ok(tagged(
            STRING_SET_TAG,
            JsonValue::Array(set.iter().cloned().map(JsonValue::String).collect()),
        )),
        AttributeValue::Ns(set) => {
            let numbers: Result<Vec<JsonValue>, CodecError> = set
                .iter()
                .map(|n| number_to_json(n).map(JsonValue::Number))
                .collect();
            Ok(tagged(NUMBER_SET_TAG, JsonValue::Array(numbers?)))
        }
        AttributeValue::Bs(set) => Ok(tagged(
            BINARY_SET_TAG,
            JsonValue::Array(set.iter().map(blob_to_json).collect()),
        )),
        other => Err(CodecError::UnsupportedAttribute(format!("{:?}", other))),
    }
}

fn map_to_json(map: &Record) -> Result<Map<String, JsonValue>, CodecError> {
    let mut object = Map::new();
    for (name, value) in map {
        let json_value = attribute_to_json(value).map_err(|e| CodecError::Attribute {
            name: name.clone(),
            source: Box::new(e),
        })?;
        object.insert(name.clone(), json_value);
    }
    Ok(object)
}

/// Convert a whole item to a JSON object keyed by attribute name.
pub fn item_to_json(item: &Record) -> Result<JsonValue, CodecError> {
    Ok(JsonValue::Object(map_to_json(item)?))
}

/// Convert a JSON value back to a DynamoDB attribute value.
///
/// Inverse of [`attribute_to_json`].
pub fn json_to_attribute(value: &JsonValue) -> Result<AttributeValue, CodecError> {
    match value {
        JsonValue::Null => Ok(AttributeValue::Null(true)),
        JsonValue::Bool(b) => Ok(AttributeValue::Bool(*b)),
        JsonValue::Number(n) => Ok(AttributeValue::N(n.to_string())),
        JsonValue::String(s) => Ok(AttributeValue::S(s.clone())),
        JsonValue::Array(list) => {
            let items: Result<Vec<AttributeValue>, CodecError> =
                list.iter().map(json_to_attribute).collect();
            Ok(AttributeValue::L(items?))
        }
        JsonValue::Object(object) => match object.iter().next() {
            Some((tag, inner)) if has_reserved_shape(object) => tagged_to_attribute(tag, inner),
            _ => Ok(AttributeValue::M(json_to_map(object)?)),
        },
    }
}

fn tagged_to_attribute(tag: &str, inner: &JsonValue) -> Result<AttributeValue, CodecError> {
    let array = |expected: &'static str| {
        inner.as_array().ok_or_else(|| CodecError::InvalidTag {
            tag: tag.to_string(),
            expected,
        })
    };

    match tag {
        BINARY_TAG => Ok(AttributeValue::B(blob_from_json(tag, inner)?)),
        STRING_SET_TAG => {
            let set = array("an array of strings")?
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| CodecError::InvalidTag {
                        tag: tag.to_string(),
                        expected: "an array of strings",
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AttributeValue::Ss(set))
        }
        NUMBER_SET_TAG => {
            let set = array("an array of numbers")?
                .iter()
                .map(|v| match v {
                    JsonValue::Number(n) => Ok(n.to_string()),
                    _ => Err(CodecError::InvalidTag {
                        tag: tag.to_string(),
                        expected: "an array of numbers",
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AttributeValue::Ns(set))
        }
        BINARY_SET_TAG => {
            let set = array("an array of base64 strings")?
                .iter()
                .map(|v| blob_from_json(tag, v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AttributeValue::Bs(set))
        }
        _ => match inner {
            JsonValue::Object(object) => Ok(AttributeValue::M(json_to_map(object)?)),
            _ => Err(CodecError::InvalidTag {
                tag: tag.to_string(),
                expected: "an object",
            }),
        },
    }
}

fn json_to_map(object: &Map<String, JsonValue>) -> Result<Record, CodecError> {
    let mut map = Record::with_capacity(object.len());
    for (name, value) in object {
        let attribute = json_to_attribute(value).map_err(|e| CodecError::Attribute {
            name: name.clone(),
            source: Box::new(e),
        })?;
        map.insert(name.clone(), attribute);
    }
    Ok(map)
}

/// Convert a JSON object into an item. Anything other than an object is rejected.
pub fn json_to_item(value: &JsonValue) -> Result<Record, CodecError> {
    match value {
        JsonValue::Object(object) => json_to_map(object),
        other => Err(CodecError::NotAnObject(json_kind(other))),
    }
}

/// Encode an item as pretty-printed JSON text, the form written to backup files.
pub fn encode_record(item: &Record) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&item_to_json(item)?)?)
}

/// Decode one item from JSON text.
pub fn decode_record(text: &str) -> Result<Record, CodecError> {
    let value: JsonValue = serde_json::from_str(text)?;
    json_to_item(&value)
}
