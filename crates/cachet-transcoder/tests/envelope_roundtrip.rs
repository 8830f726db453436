//! End-to-end tests for tagged and untagged transcoding.

use assert_matches::assert_matches;
use cachet_transcoder::{
    impl_type_name, CacheValue, CborCodec, EnvelopeTranscoder, IdentityError, JsonCodec,
    JsonOptions, TranscodeError, TypeDescriptor, TypeName, TypeRegistry,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Dog {
    name: String,
    good: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Cat {
    name: String,
    lives: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Crate<T> {
    label: String,
    occupant: T,
}

impl_type_name!(Dog => "zoo.Dog", Cat => "zoo.Cat");

impl<T: TypeName> TypeName for Crate<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::generic("zoo.Crate", vec![T::type_descriptor()])
    }
}

fn zoo_registry() -> Arc<TypeRegistry> {
    let registry = Arc::new(TypeRegistry::with_builtins());
    registry.register::<Dog>().unwrap();
    registry.register::<Cat>().unwrap();
    registry.register::<Crate<Dog>>().unwrap();
    registry
}

fn json(registry: Arc<TypeRegistry>) -> EnvelopeTranscoder {
    EnvelopeTranscoder::new(Arc::new(JsonCodec::new(JsonOptions::default())), registry)
}

fn cbor(registry: Arc<TypeRegistry>) -> EnvelopeTranscoder {
    EnvelopeTranscoder::new(Arc::new(CborCodec::new()), registry)
}

fn rex() -> Dog {
    Dog {
        name: "Rex".to_string(),
        good: true,
    }
}

#[test]
fn polymorphic_values_keep_runtime_type() {
    let transcoder = json(zoo_registry());
    let animals: Vec<Box<dyn CacheValue>> = vec![
        Box::new(rex()),
        Box::new(Cat {
            name: "Tom".to_string(),
            lives: 9,
        }),
    ];

    let encoded: Vec<Vec<u8>> = animals
        .iter()
        .map(|animal| transcoder.encode_typed(&**animal).unwrap())
        .collect();
    assert_eq!(
        String::from_utf8(encoded[0].clone()).unwrap(),
        r#"["zoo.Dog",{"name":"Rex","good":true}]"#
    );

    let dog = transcoder.decode_typed(&encoded[0]).unwrap();
    assert!(dog.is::<Dog>());
    assert_eq!(dog.downcast_ref::<Dog>(), Some(&rex()));

    let cat = transcoder.decode_typed(&encoded[1]).unwrap();
    assert_eq!(cat.downcast_ref::<Cat>().map(|cat| cat.lives), Some(9));
}

#[test]
fn generic_identifier_written_literally_value_escaped() {
    let transcoder = json(zoo_registry());
    let kennel = Crate {
        label: "<k9>".to_string(),
        occupant: rex(),
    };

    let bytes = transcoder.encode_typed(&kennel).unwrap();
    assert_eq!(
        String::from_utf8(bytes.clone()).unwrap(),
        r#"["zoo.Crate<zoo.Dog>",{"label":"\u003Ck9\u003E","occupant":{"name":"Rex","good":true}}]"#
    );

    let value = transcoder.decode_typed_into::<Crate<Dog>>(&bytes).unwrap();
    assert_eq!(value, kennel);
}

#[test]
fn untagged_bytes_are_format_errors() {
    let transcoder = json(zoo_registry());
    let untagged = transcoder.encode(&rex()).unwrap();

    let err = transcoder.decode_typed(&untagged).unwrap_err();
    assert!(err.is_format(), "{err}");
    assert_eq!(err.to_string(), "Invalid envelope: tagged envelope expected");
}

#[test]
fn unknown_identifier_is_resolution_error() {
    let registry = Arc::new(TypeRegistry::new());
    registry.register::<Dog>().unwrap();
    let writer = json(zoo_registry());
    let reader = json(registry);

    let bytes = writer
        .encode_typed(&Cat {
            name: "Tom".to_string(),
            lives: 9,
        })
        .unwrap();
    let err = reader.decode_typed(&bytes).unwrap_err();
    assert!(err.is_resolution());
    assert_matches!(
        err,
        TranscodeError::Resolution(IdentityError::NotFound { identifier }) if identifier == "zoo.Cat"
    );
}

#[test]
fn open_generic_is_not_substituted() {
    let transcoder = json(zoo_registry());
    let bytes = transcoder
        .encode_typed(&Crate {
            label: "a".to_string(),
            occupant: 1u32,
        })
        .unwrap();

    assert_eq!(
        transcoder.peek_identifier(&bytes).unwrap().as_str(),
        "zoo.Crate<std.u32>"
    );
    assert!(transcoder.decode_typed(&bytes).unwrap_err().is_resolution());
}

#[test]
fn malformed_identifier_reports_position() {
    let transcoder = json(zoo_registry());
    let err = transcoder
        .decode_typed(br#"["zoo.Crate<zoo.Dog", {}]"#)
        .unwrap_err();
    assert_matches!(
        err,
        TranscodeError::Resolution(IdentityError::Malformed { position: 17, .. })
    );
}

#[test]
fn cbor_envelope_roundtrip() {
    let transcoder = cbor(zoo_registry());
    let kennel = Crate {
        label: "<k9>".to_string(),
        occupant: rex(),
    };

    let bytes = transcoder.encode_typed(&kennel).unwrap();
    assert_eq!(bytes[0], 0x82);
    assert_eq!(
        transcoder.peek_identifier(&bytes).unwrap().as_str(),
        "zoo.Crate<zoo.Dog>"
    );
    assert_eq!(
        transcoder.decode_typed_into::<Crate<Dog>>(&bytes).unwrap(),
        kennel
    );

    let untagged = transcoder.encode(&rex()).unwrap();
    assert!(transcoder.decode_typed(&untagged).unwrap_err().is_format());
    assert_eq!(transcoder.decode::<Dog>(&untagged).unwrap(), rex());
}

#[test]
fn broken_third_element_is_format_error() {
    let transcoder = json(zoo_registry());
    let err = transcoder
        .decode_typed(br#"["std.bool",true,x]"#)
        .unwrap_err();
    assert!(err.is_format(), "{err}");
}

#[test]
fn decode_as_uses_runtime_descriptor() {
    let transcoder = json(zoo_registry());
    let bytes = transcoder.encode(&rex()).unwrap();

    let descriptor = TypeDescriptor::named("zoo.Dog");
    let value = transcoder.decode_as(&bytes, &descriptor).unwrap();
    assert_eq!(value.downcast_ref::<Dog>(), Some(&rex()));
}

#[test]
fn builtin_map_roundtrip_through_global_registry() {
    let transcoder = EnvelopeTranscoder::json();
    let mut headers = HashMap::new();
    headers.insert("accept".to_string(), "text/html".to_string());

    let bytes = transcoder.encode_typed(&headers).unwrap();
    assert_eq!(
        transcoder.peek_identifier(&bytes).unwrap().as_str(),
        "std.HashMap<std.String,std.String>"
    );
    let value = transcoder
        .decode_typed_into::<HashMap<String, String>>(&bytes)
        .unwrap();
    assert_eq!(value, headers);
}

#[test]
fn codec_errors_carry_codec_message() {
    let transcoder = json(zoo_registry());
    let err = transcoder
        .decode_typed(br#"["zoo.Dog",{"name":"Rex"}]"#)
        .unwrap_err();
    assert!(err.is_codec());
    assert!(err.to_string().starts_with("json codec error:"), "{err}");
    assert!(err.to_string().contains("good"), "{err}");
}

#[test]
fn transcoder_is_shareable_across_threads() {
    let transcoder = Arc::new(json(zoo_registry()));
    let handles: Vec<_> = (0..4u8)
        .map(|lives| {
            let transcoder = Arc::clone(&transcoder);
            std::thread::spawn(move || {
                let cat = Cat {
                    name: format!("cat-{lives}"),
                    lives,
                };
                let bytes = transcoder.encode_typed(&cat).unwrap();
                transcoder.decode_typed_into::<Cat>(&bytes).unwrap() == cat
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(transcoder.codec().name(), "json");
}

proptest! {
    /// Tagged round-trip preserves type and value for arbitrary text
    #[test]
    fn tagged_roundtrip_preserves_value(name in "\\PC{0,24}", good in any::<bool>()) {
        let dog = Dog { name, good };
        for transcoder in [json(zoo_registry()), cbor(zoo_registry())] {
            let bytes = transcoder.encode_typed(&dog).unwrap();
            let value = transcoder.decode_typed(&bytes).unwrap();
            prop_assert_eq!(value.downcast_ref::<Dog>(), Some(&dog));
        }
    }

    /// Strict JSON output never contains raw HTML-sensitive characters in the value
    #[test]
    fn strict_json_value_is_ascii(label in "[<>&'+a-z\u{e9}]{0,16}") {
        let transcoder = json(zoo_registry());
        let kennel = Crate { label, occupant: rex() };
        let bytes = transcoder.encode_typed(&kennel).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let value_part = &text["[\"zoo.Crate<zoo.Dog>\",".len()..];
        prop_assert!(value_part.is_ascii());
        prop_assert!(!value_part.contains(['<', '>', '&', '\'', '+']));
    }
}
