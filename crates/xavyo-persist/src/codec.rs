//! Value codecs.
//!
//! An [`AttributeCodec`] converts a Rust value to the raw values of a
//! directory attribute and back. Members are bound to their codec through
//! plain function pointers, which keeps compiled handlers `Send + Sync`.

use std::marker::PhantomData;

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;
use xavyo_directory::Dn;

/// Conversion between a value and raw attribute values.
pub trait AttributeCodec: Sized {
    /// Encode the value. An empty result means the value has no encoding.
    fn encode_values(&self) -> Result<Vec<Vec<u8>>, String>;

    /// Decode a value from the raw values of an attribute.
    fn decode_values(values: &[Vec<u8>]) -> Result<Self, String>;
}

fn single_value(values: &[Vec<u8>]) -> Result<&[u8], String> {
    match values {
        [] => Err("the attribute has no values".to_string()),
        [single] => Ok(single),
        many => Err(format!(
            "the attribute has {} values but the target is single-valued",
            many.len()
        )),
    }
}

fn single_string(values: &[Vec<u8>]) -> Result<&str, String> {
    let value = single_value(values)?;
    std::str::from_utf8(value).map_err(|_| "the value is not valid UTF-8".to_string())
}

impl AttributeCodec for String {
    fn encode_values(&self) -> Result<Vec<Vec<u8>>, String> {
        Ok(vec![self.as_bytes().to_vec()])
    }

    fn decode_values(values: &[Vec<u8>]) -> Result<Self, String> {
        single_string(values).map(str::to_string)
    }
}

impl AttributeCodec for Vec<String> {
    fn encode_values(&self) -> Result<Vec<Vec<u8>>, String> {
        Ok(self.iter().map(|s| s.as_bytes().to_vec()).collect())
    }

    fn decode_values(values: &[Vec<u8>]) -> Result<Self, String> {
        values
            .iter()
            .map(|v| {
                String::from_utf8(v.clone()).map_err(|_| "a value is not valid UTF-8".to_string())
            })
            .collect()
    }
}

impl AttributeCodec for Vec<u8> {
    fn encode_values(&self) -> Result<Vec<Vec<u8>>, String> {
        Ok(vec![self.clone()])
    }

    fn decode_values(values: &[Vec<u8>]) -> Result<Self, String> {
        single_value(values).map(<[u8]>::to_vec)
    }
}

/// Booleans use the LDAP `TRUE`/`FALSE` syntax.
impl AttributeCodec for bool {
    fn encode_values(&self) -> Result<Vec<Vec<u8>>, String> {
        let value: &[u8] = if *self { b"TRUE" } else { b"FALSE" };
        Ok(vec![value.to_vec()])
    }

    fn decode_values(values: &[Vec<u8>]) -> Result<Self, String> {
        let value = single_string(values)?;
        if value.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if value.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(format!("'{value}' is not a valid boolean value"))
        }
    }
}

macro_rules! integer_codec {
    ($($ty:ty),*) => {
        $(
            impl AttributeCodec for $ty {
                fn encode_values(&self) -> Result<Vec<Vec<u8>>, String> {
                    Ok(vec![self.to_string().into_bytes()])
                }

                fn decode_values(values: &[Vec<u8>]) -> Result<Self, String> {
                    let value = single_string(values)?;
                    value
                        .trim()
                        .parse::<$ty>()
                        .map_err(|e| format!("'{value}' is not a valid {}: {e}", stringify!($ty)))
                }
            }
        )*
    };
}

integer_codec!(i32, i64, u32, u64);

// The fraction is omitted for whole seconds and otherwise keeps 3, 6 or 9
// digits, so no precision is lost.
const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%S%.fZ";

/// Timestamps use the generalized time syntax in UTC.
impl AttributeCodec for DateTime<Utc> {
    fn encode_values(&self) -> Result<Vec<Vec<u8>>, String> {
        Ok(vec![self
            .format(GENERALIZED_TIME_FORMAT)
            .to_string()
            .into_bytes()])
    }

    fn decode_values(values: &[Vec<u8>]) -> Result<Self, String> {
        let value = single_string(values)?;
        let digits = value
            .strip_suffix('Z')
            .ok_or_else(|| format!("'{value}' is not a UTC generalized time value"))?;
        let (whole, fraction) = match digits.split_once(['.', ',']) {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (digits, None),
        };
        let padded = match whole.len() {
            10 => format!("{whole}0000"),
            12 => format!("{whole}00"),
            _ => whole.to_string(),
        };
        let mut parsed = NaiveDateTime::parse_from_str(&padded, "%Y%m%d%H%M%S")
            .map_err(|e| format!("'{value}' is not a valid generalized time value: {e}"))?;
        if let Some(fraction) = fraction {
            if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
                return Err(format!("'{value}' has an invalid fractional part"));
            }
            let nanos: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
            let nanos: i64 = nanos
                .parse()
                .map_err(|e| format!("'{value}' has an invalid fractional part: {e}"))?;
            parsed += chrono::Duration::nanoseconds(nanos);
        }
        Ok(parsed.and_utc())
    }
}

impl AttributeCodec for Uuid {
    fn encode_values(&self) -> Result<Vec<Vec<u8>>, String> {
        Ok(vec![self.to_string().into_bytes()])
    }

    fn decode_values(values: &[Vec<u8>]) -> Result<Self, String> {
        let value = single_string(values)?;
        Uuid::parse_str(value).map_err(|e| format!("'{value}' is not a valid UUID: {e}"))
    }
}

impl AttributeCodec for Dn {
    fn encode_values(&self) -> Result<Vec<Vec<u8>>, String> {
        Ok(vec![self.to_string().into_bytes()])
    }

    fn decode_values(values: &[Vec<u8>]) -> Result<Self, String> {
        Dn::parse(single_string(values)?).map_err(|e| e.to_string())
    }
}

// Type-erased member access used by compiled handlers.

pub(crate) trait ValueReader<T>: Send + Sync {
    /// Read and encode the member. `None` when the member has no value.
    fn read(&self, object: &T) -> Result<Option<Vec<Vec<u8>>>, String>;
}

pub(crate) trait ValueWriter<T>: Send + Sync {
    /// Decode and store values, or clear the member when `values` is `None`.
    fn write(&self, object: &mut T, values: Option<&[Vec<u8>]>) -> Result<(), String>;
}

pub(crate) struct FnReader<T, V> {
    get: fn(&T) -> Option<V>,
    _value: PhantomData<fn() -> V>,
}

impl<T, V> FnReader<T, V> {
    pub(crate) fn new(get: fn(&T) -> Option<V>) -> Self {
        Self {
            get,
            _value: PhantomData,
        }
    }
}

impl<T, V: AttributeCodec> ValueReader<T> for FnReader<T, V> {
    fn read(&self, object: &T) -> Result<Option<Vec<Vec<u8>>>, String> {
        match (self.get)(object) {
            None => Ok(None),
            Some(value) => {
                let values = value.encode_values()?;
                Ok((!values.is_empty()).then_some(values))
            }
        }
    }
}

pub(crate) struct FnWriter<T, V> {
    set: fn(&mut T, Option<V>),
    _value: PhantomData<fn() -> V>,
}

impl<T, V> FnWriter<T, V> {
    pub(crate) fn new(set: fn(&mut T, Option<V>)) -> Self {
        Self {
            set,
            _value: PhantomData,
        }
    }
}

impl<T, V: AttributeCodec> ValueWriter<T> for FnWriter<T, V> {
    fn write(&self, object: &mut T, values: Option<&[Vec<u8>]>) -> Result<(), String> {
        let value = values.map(V::decode_values).transpose()?;
        (self.set)(object, value);
        Ok(())
    }
}
