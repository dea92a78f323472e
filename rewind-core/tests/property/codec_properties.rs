//! Builtin codecs accept every storage rendering of a value.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use rewind_core::models::Value;
use rewind_core::schema::codec::parse_datetime;
use rewind_core::schema::{BuiltinCodec, FieldCodec};

proptest! {
    #[test]
    fn integer_decodes_from_text(n in any::<i64>()) {
        let decoded = BuiltinCodec::Integer.decode(&Value::Text(n.to_string())).unwrap();
        prop_assert_eq!(decoded, Value::Integer(n));
    }

    #[test]
    fn text_renders_integers(n in any::<i64>()) {
        let decoded = BuiltinCodec::Text.decode(&Value::Integer(n)).unwrap();
        prop_assert_eq!(decoded, Value::Text(n.to_string()));
    }

    #[test]
    fn boolean_accepts_flags_and_integers(b in any::<bool>()) {
        prop_assert_eq!(BuiltinCodec::Boolean.decode(&Value::Boolean(b)).unwrap(), Value::Boolean(b));
        prop_assert_eq!(
            BuiltinCodec::Boolean.decode(&Value::Integer(i64::from(b))).unwrap(),
            Value::Boolean(b)
        );
    }

    #[test]
    fn datetime_agrees_across_renderings(secs in 0i64..4_102_444_800) {
        let expected = Utc.timestamp_opt(secs, 0).single().unwrap();
        let text = expected.format("%Y-%m-%d %H:%M:%S").to_string();

        prop_assert_eq!(parse_datetime(&text), Some(expected));
        prop_assert_eq!(parse_datetime(&expected.to_rfc3339()), Some(expected));
        prop_assert_eq!(
            BuiltinCodec::DateTime.decode(&Value::Integer(secs)).unwrap(),
            Value::DateTime(expected)
        );
        prop_assert_eq!(
            BuiltinCodec::DateTime.decode(&Value::Text(text)).unwrap(),
            Value::DateTime(expected)
        );
    }

    #[test]
    fn null_passes_through_every_codec(i in 0usize..BuiltinCodec::ALL.len()) {
        prop_assert_eq!(BuiltinCodec::ALL[i].decode(&Value::Null).unwrap(), Value::Null);
    }
}
