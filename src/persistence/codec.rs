//! Serializer/deserializer pairs for stored values

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;

/// Converts a value to and from its stored string form.
///
/// Implementations must round-trip: `decode(&encode(v)?)? == v`.
pub trait Codec<T> {
    fn encode(&self, value: &T) -> Result<String, CodecError>;
    fn decode(&self, raw: &str) -> Result<T, CodecError>;
}

/// `Display` out, `FromStr` in. The stored string is parsed as-is.
pub struct TextCodec<T>(PhantomData<fn() -> T>);

impl<T> TextCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for TextCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for TextCodec<T>
where
    T: Display + FromStr,
    T::Err: Display,
{
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        Ok(value.to_string())
    }

    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        raw.parse()
            .map_err(|err: T::Err| CodecError::new(format!("{:?}: {}", raw, err)))
    }
}

/// JSON via serde
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Codec from a pair of closures
pub struct FnCodec<E, D> {
    encode: E,
    decode: D,
}

impl<E, D> FnCodec<E, D> {
    pub fn new(encode: E, decode: D) -> Self {
        Self { encode, decode }
    }
}

impl<T, E, D> Codec<T> for FnCodec<E, D>
where
    E: Fn(&T) -> Result<String, CodecError>,
    D: Fn(&str) -> Result<T, CodecError>,
{
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, raw: &str) -> Result<T, CodecError> {
        (self.decode)(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Prefs {
        name: String,
        volume: u8,
        tags: Vec<String>,
    }

    #[test]
    fn test_text_codec_counter_format() {
        let codec = TextCodec::<i64>::new();
        assert_eq!(codec.encode(&7).unwrap(), "7");
        assert_eq!(codec.decode("7").unwrap(), 7);
        assert_eq!(codec.decode("-3").unwrap(), -3);
        assert!(codec.decode(" 7").is_err());
        assert!(codec.decode("seven").is_err());
        assert!(codec.decode("").is_err());
    }

    #[test]
    fn test_json_codec_rejects_wrong_shape() {
        let codec = JsonCodec::<Prefs>::new();
        assert!(codec.decode("42").is_err());
        assert!(codec.decode("{\"name\":\"x\"}").is_err());
    }

    #[test]
    fn test_fn_codec_uses_closures() {
        let flag = FnCodec::new(
            |v: &bool| -> Result<String, CodecError> {
                Ok(if *v { "yes" } else { "no" }.to_string())
            },
            |raw: &str| -> Result<bool, CodecError> {
                match raw {
                    "yes" => Ok(true),
                    "no" => Ok(false),
                    other => Err(CodecError::new(format!("not a flag: {other}"))),
                }
            },
        );
        let codec: &dyn Codec<bool> = &flag;
        assert_eq!(codec.encode(&true).unwrap(), "yes");
        assert_eq!(codec.decode("no"), Ok(false));
        assert!(codec.decode("maybe").is_err());
    }

    proptest! {
        #[test]
        fn test_text_codec_round_trip(v in any::<i64>()) {
            let codec = TextCodec::<i64>::new();
            prop_assert_eq!(codec.decode(&codec.encode(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn test_text_codec_keeps_whitespace(v in ".*") {
            let codec = TextCodec::<String>::new();
            prop_assert_eq!(codec.decode(&codec.encode(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn test_json_codec_round_trip(
            name in ".*",
            volume in any::<u8>(),
            tags in proptest::collection::vec("[a-z]{0,8}", 0..5),
        ) {
            let codec = JsonCodec::<Prefs>::new();
            let prefs = Prefs { name, volume, tags };
            let raw = codec.encode(&prefs).unwrap();
            prop_assert_eq!(codec.decode(&raw).unwrap(), prefs);
        }
    }
}
