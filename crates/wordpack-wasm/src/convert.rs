//! JSON ⇄ [Value] conversion guided by the compiled schema tree.
//!
//! Integers inside the JavaScript safe range travel as numbers, larger ones as
//! `"0x…"` hex strings (`"-0x…"` for negative signed values). Addresses and
//! byte strings are `"0x…"` hex, text is a plain string, arrays and tuples are
//! JSON arrays. Tuples are also accepted as objects keyed by component name.

use std::fmt::Display;

use serde_json::{Number, Value as Json};
use wasm_bindgen::JsValue;
use wordpack::{
    field::Node,
    types::{LeafType, Primitive},
    value::{Value, Word},
};

const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

pub fn error_to_js<E: Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Builds a [Value] shaped like `node` from `json`.
pub fn json_to_value(path: &str, node: &Node, json: &Json) -> Result<Value, String> {
    match node {
        Node::Leaf(leaf) => leaf_from_json(path, leaf, json),
        Node::Tuple(components) => {
            let values = match json {
                Json::Array(items) => {
                    if items.len() != components.len() {
                        return Err(format!(
                            "{}: expected {} tuple items, got {}",
                            path,
                            components.len(),
                            items.len()
                        ));
                    }
                    components
                        .iter()
                        .zip(items)
                        .map(|(c, item)| json_to_value(&format!("{}.{}", path, c.name), &c.node, item))
                        .collect::<Result<Vec<_>, _>>()?
                }
                Json::Object(map) => components
                    .iter()
                    .map(|c| {
                        let path = format!("{}.{}", path, c.name);
                        let item = map.get(&c.name).ok_or_else(|| format!("{}: missing", path))?;
                        json_to_value(&path, &c.node, item)
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(format!("{}: expected array or object for tuple", path)),
            };
            Ok(Value::Tuple(values))
        }
        Node::Array { .. } => {
            let Json::Array(items) = json else {
                return Err(format!("{}: expected array", path));
            };
            let Some((_, inner)) = node.split_outer() else {
                return Err(format!("{}: expected array", path));
            };

            items
                .iter()
                .enumerate()
                .map(|(i, item)| json_to_value(&format!("{}[{}]", path, i), &inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

fn leaf_from_json(path: &str, leaf: &LeafType, json: &Json) -> Result<Value, String> {
    match leaf {
        LeafType::Primitive(Primitive::Bool) => json
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| format!("{}: expected bool", path)),
        LeafType::Primitive(Primitive::Address) => {
            let bytes = hex_from_json(path, json)?;
            let address: [u8; 20] = bytes
                .try_into()
                .map_err(|_| format!("{}: address must be 20 bytes", path))?;
            Ok(Value::Address(address))
        }
        LeafType::Primitive(p) if p.is_signed() => int_from_json(path, json).map(Value::Int),
        LeafType::Primitive(_) => uint_from_json(path, json).map(Value::Uint),
        LeafType::FixedBytes(_) => hex_from_json(path, json).map(Value::FixedBytes),
        LeafType::Bytes => hex_from_json(path, json).map(Value::Bytes),
        LeafType::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("{}: expected string", path)),
    }
}

fn uint_from_json(path: &str, json: &Json) -> Result<Word, String> {
    match json {
        Json::Number(n) => n
            .as_u64()
            .map(Word::from)
            .ok_or_else(|| format!("{}: expected non-negative integer", path)),
        Json::String(s) => word_from_hex(path, s),
        _ => Err(format!("{}: expected integer", path)),
    }
}

fn int_from_json(path: &str, json: &Json) -> Result<Word, String> {
    match json {
        Json::Number(n) => n
            .as_i64()
            .map(|v| Word::from_i128(i128::from(v)))
            .ok_or_else(|| format!("{}: expected integer", path)),
        Json::String(s) => match s.strip_prefix('-') {
            Some(magnitude) => word_from_hex(path, magnitude).map(|w| negate(&w)),
            None => word_from_hex(path, s),
        },
        _ => Err(format!("{}: expected integer", path)),
    }
}

fn word_from_hex(path: &str, s: &str) -> Result<Word, String> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| format!("{}: expected 0x-prefixed hex", path))?;
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };

    let bytes = decode_hex(path, &padded)?;
    Word::from_be_slice(&bytes).ok_or_else(|| format!("{}: integer wider than 256 bits", path))
}

fn hex_from_json(path: &str, json: &Json) -> Result<Vec<u8>, String> {
    let s = json
        .as_str()
        .ok_or_else(|| format!("{}: expected hex string", path))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| format!("{}: expected 0x-prefixed hex", path))?;
    decode_hex(path, digits)
}

fn decode_hex(path: &str, digits: &str) -> Result<Vec<u8>, String> {
    if digits.len() % 2 != 0 || !digits.is_ascii() {
        return Err(format!("{}: malformed hex", path));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| format!("{}: malformed hex", path)))
        .collect()
}

/// Converts a decoded [Value] to its JSON form.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Uint(word) => match word.to_u64() {
            Some(v) if v <= MAX_SAFE_INTEGER => Json::Number(Number::from(v)),
            _ => Json::String(format!("0x{}", trimmed_hex(word))),
        },
        Value::Int(word) => match word.to_i64() {
            Some(v) if v.unsigned_abs() <= MAX_SAFE_INTEGER => Json::Number(Number::from(v)),
            _ if word.0[0] & 0x80 != 0 => Json::String(format!("-0x{}", trimmed_hex(&negate(word)))),
            _ => Json::String(format!("0x{}", trimmed_hex(word))),
        },
        Value::Bool(b) => Json::Bool(*b),
        Value::Address(address) => Json::String(format!("0x{}", encode_hex(address))),
        Value::FixedBytes(bytes) | Value::Bytes(bytes) => Json::String(format!("0x{}", encode_hex(bytes))),
        Value::String(s) => Json::String(s.clone()),
        Value::Array(items) | Value::Tuple(items) => Json::Array(items.iter().map(value_to_json).collect()),
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn trimmed_hex(word: &Word) -> String {
    let hex = encode_hex(&word.0);
    match hex.trim_start_matches('0') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Two's-complement negation over 256 bits.
fn negate(word: &Word) -> Word {
    let mut out = [0u8; 32];
    let mut carry = true;
    for i in (0..32).rev() {
        let (b, overflow) = (!word.0[i]).overflowing_add(u8::from(carry));
        out[i] = b;
        carry = overflow;
    }
    Word(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wordpack::field::FieldSchema;

    use super::*;

    fn node(ty: &str) -> Node {
        FieldSchema::new("v", ty).resolve().unwrap()
    }

    #[test]
    fn test_small_integers_are_numbers() {
        assert_eq!(value_to_json(&Value::uint(42)), json!(42));
        assert_eq!(value_to_json(&Value::int(-42)), json!(-42));
    }

    #[test]
    fn test_large_integers_are_hex() {
        assert_eq!(value_to_json(&Value::uint(1 << 60)), json!("0x1000000000000000"));
        assert_eq!(value_to_json(&Value::int(-(1 << 60))), json!("-0x1000000000000000"));
        assert_eq!(value_to_json(&Value::Uint(Word([0xff; 32]))), json!(format!("0x{}", "ff".repeat(32))));
    }

    #[test]
    fn test_integer_inputs() {
        assert_eq!(json_to_value("v", &node("uint64"), &json!(7)).unwrap(), Value::uint(7));
        assert_eq!(
            json_to_value("v", &node("uint128"), &json!("0x1000000000000000")).unwrap(),
            Value::uint(1 << 60)
        );
        assert_eq!(json_to_value("v", &node("int16"), &json!(-3)).unwrap(), Value::int(-3));
        assert_eq!(json_to_value("v", &node("int128"), &json!("-0xabc")).unwrap(), Value::int(-0xabc));
        assert!(json_to_value("v", &node("uint8"), &json!(-1)).is_err());
    }

    #[test]
    fn test_bytes_and_address() {
        let address = format!("0x{}", "11".repeat(20));
        assert_eq!(
            json_to_value("v", &node("address"), &json!(address)).unwrap(),
            Value::Address([0x11; 20])
        );
        assert_eq!(
            json_to_value("v", &node("bytes"), &json!("0xcafe")).unwrap(),
            Value::Bytes(vec![0xca, 0xfe])
        );
        assert!(json_to_value("v", &node("bytes2"), &json!("cafe")).is_err());
        assert!(json_to_value("v", &node("address"), &json!("0x11")).is_err());
        assert_eq!(value_to_json(&Value::FixedBytes(vec![0, 1])), json!("0x0001"));
    }

    #[test]
    fn test_nested_arrays_and_tuples() {
        let root = FieldSchema::tuple(
            "root",
            vec![
                FieldSchema::new("name", "string"),
                FieldSchema::new("grid", "uint8[2][]"),
            ],
        );
        let node = root.resolve().unwrap();
        let expected = Value::Tuple(vec![
            Value::String("x".to_string()),
            Value::Array(vec![Value::Array(vec![Value::uint(1), Value::uint(2)])]),
        ]);

        let from_array = json_to_value("root", &node, &json!(["x", [[1, 2]]])).unwrap();
        let from_object = json_to_value("root", &node, &json!({ "name": "x", "grid": [[1, 2]] })).unwrap();
        assert_eq!(from_array, expected);
        assert_eq!(from_object, expected);
        assert_eq!(value_to_json(&expected), json!(["x", [[1, 2]]]));
    }

    #[test]
    fn test_errors_carry_path() {
        let root = FieldSchema::tuple("root", vec![FieldSchema::new("flag", "bool")]);
        let err = json_to_value("root", &root.resolve().unwrap(), &json!({})).unwrap_err();
        assert_eq!(err, "root.flag: missing");
    }
}
