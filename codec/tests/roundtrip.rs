//! Integration tests driving whole messages through the public API.

use bytes::Bytes;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::collections::BTreeMap;
use std::str::FromStr;
use tagwire_codec::{impl_schema, Error, Fault, Limits, ObjectCodec, Value};

#[derive(Debug, Clone, PartialEq)]
struct Invoice {
    id: i64,
    customer: String,
    paid: bool,
}

impl_schema!(Invoice, "billing.Invoice", { id, customer, paid });

#[derive(Debug, Clone, PartialEq)]
struct LineItem {
    sku: String,
    quantity: i32,
    notes: Option<String>,
}

impl_schema!(LineItem, "billing.LineItem", { sku, quantity, notes });

fn codec() -> ObjectCodec {
    let mut codec = ObjectCodec::new();
    codec.register::<Invoice>();
    codec.register::<LineItem>();
    codec
}

#[test]
fn test_mixed_frame_stream() {
    let codec = codec();
    let invoice = Invoice {
        id: 9001,
        customer: "acme".to_string(),
        paid: false,
    };

    let mut encoder = codec.encoder();
    encoder.write_string("submit");
    encoder.write_i32(2);
    encoder.write_struct(&invoice);
    encoder.write_sequence(&[
        LineItem {
            sku: "W-1".to_string(),
            quantity: 3,
            notes: None,
        },
        LineItem {
            sku: "W-2".to_string(),
            quantity: 1,
            notes: Some("fragile".to_string()),
        },
    ]);
    let message = encoder.flush();

    let mut decoder = codec.decoder(message);
    assert_eq!(decoder.read_string().unwrap(), "submit");
    assert_eq!(decoder.read_i32().unwrap(), 2);
    let value = decoder.read_object().unwrap();
    assert_eq!(value.downcast_struct::<Invoice>(), Some(&invoice));
    let items = decoder.read_sequence::<LineItem>().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].notes.as_deref(), Some("fragile"));
    decoder.finish().unwrap();
}

#[test]
fn test_dynamic_sequence_of_strings() {
    let codec = codec();
    let sequence = Value::Sequence(vec![
        Value::Str("a".to_string()),
        Value::Str("b".to_string()),
        Value::Str("c".to_string()),
    ]);

    let mut encoder = codec.encoder();
    encoder.write_object(&sequence).unwrap();
    let mut decoder = codec.decoder(encoder.flush());
    assert_eq!(decoder.read_object().unwrap(), sequence);
    decoder.finish().unwrap();
}

#[test]
fn test_empty_collections_stay_present() {
    let codec = codec();
    let mut encoder = codec.encoder();
    encoder.write_object(&Value::Map(BTreeMap::new())).unwrap();
    encoder.write_object(&Value::Sequence(Vec::new())).unwrap();
    let mut decoder = codec.decoder(encoder.flush());

    // Empty is not absent: both frames come back as empty collections.
    assert_eq!(decoder.read_object().unwrap(), Value::Map(BTreeMap::new()));
    assert_eq!(decoder.read_object().unwrap(), Value::Sequence(Vec::new()));
    decoder.finish().unwrap();
}

#[test]
fn test_heartbeat() {
    let codec = codec();
    let message = codec.encoder().flush();
    assert!(message.is_empty());
    let mut decoder = codec.decoder(message);
    assert_eq!(decoder.read_object().unwrap(), Value::Absent);
}

#[test]
fn test_absent_value_becomes_true() {
    let codec = codec();
    let mut encoder = codec.encoder();
    encoder.write_object(&Value::Absent).unwrap();
    let mut decoder = codec.decoder(encoder.flush());
    assert_eq!(decoder.read_object().unwrap(), Value::Bool(true));
}

#[test]
fn test_decimal_preserves_scale() {
    let codec = codec();
    let amount = bigdecimal::BigDecimal::from_str("12.50").unwrap();
    let mut encoder = codec.encoder();
    encoder.write_object(&Value::Decimal(amount.clone())).unwrap();
    let mut decoder = codec.decoder(encoder.flush());
    let Value::Decimal(decoded) = decoder.read_object().unwrap() else {
        panic!("expected a decimal value");
    };
    assert_eq!(decoded, amount);
    assert_eq!(decoded.to_string(), "12.50");
}

#[test]
fn test_bigint_beyond_i64() {
    let codec = codec();
    let huge = num_bigint::BigInt::from_str("170141183460469231731687303715884105727").unwrap();
    let mut encoder = codec.encoder();
    encoder.write_object(&Value::BigInt(huge.clone())).unwrap();
    let mut decoder = codec.decoder(encoder.flush());
    assert_eq!(decoder.read_object().unwrap(), Value::BigInt(huge));
}

#[test]
fn test_fault_roundtrip() {
    let codec = codec();
    let fault = Fault::new("server.Overloaded", "queue depth exceeded");
    let mut encoder = codec.encoder();
    encoder.write_fault(&fault);
    let mut decoder = codec.decoder(encoder.flush());
    let decoded = decoder.read_fault().unwrap();
    assert_eq!(decoded, fault);
    assert_eq!(decoded.to_string(), "server.Overloaded: queue depth exceeded");
}

#[test]
fn test_fault_from_error_chain() {
    let codec = codec();
    let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline exceeded");
    let fault = Fault::flatten(&io);
    let mut encoder = codec.encoder();
    encoder.write_fault(&fault);
    let mut decoder = codec.decoder(encoder.flush());
    let decoded = decoder.read_fault().unwrap();
    assert_eq!(decoded.message, "deadline exceeded");
    assert!(decoded.class_name.contains("Error"));
}

#[test]
fn test_typed_reads_without_registration() {
    // A codec that never registered Invoice still serves the typed channel.
    let bare = ObjectCodec::new();
    let invoice = Invoice {
        id: 1,
        customer: "n".to_string(),
        paid: true,
    };
    let mut encoder = bare.encoder();
    encoder.write_struct(&invoice);
    let mut decoder = bare.decoder(encoder.flush());
    assert_eq!(decoder.read_struct::<Invoice>().unwrap(), Some(invoice));
}

#[test]
fn test_unknown_type_rejected() {
    let bare = ObjectCodec::new();
    let mut encoder = bare.encoder();
    encoder.write_struct(&Invoice {
        id: 1,
        customer: "n".to_string(),
        paid: true,
    });
    let mut decoder = bare.decoder(encoder.flush());
    assert!(matches!(
        decoder.read_object(),
        Err(Error::UnknownType(name)) if name == "billing.Invoice"
    ));
}

#[test]
fn test_corrupted_length_rejected() {
    let codec = codec();
    let mut encoder = codec.encoder();
    encoder.write_struct(&Invoice {
        id: 1,
        customer: "n".to_string(),
        paid: true,
    });
    let mut bytes = encoder.flush().to_vec();
    // A total length shorter than the frame header cannot be valid.
    bytes[1..5].copy_from_slice(&2u32.to_be_bytes());
    let mut decoder = codec.decoder(Bytes::from(bytes));
    assert!(matches!(
        decoder.read_object(),
        Err(Error::InvalidComposite(2, _))
    ));
}

#[test]
fn test_limits_reject_oversized_blob() {
    let codec = ObjectCodec::with_limits(Limits {
        max_length: 16,
        max_count: 16,
    });
    let mut encoder = codec.encoder();
    encoder.write_bytes(&[0u8; 64]);
    let mut decoder = codec.decoder(encoder.flush());
    assert!(matches!(
        decoder.read_bytes(),
        Err(Error::LengthExceeded(64, 16))
    ));
}

#[test]
fn test_random_blobs() {
    let codec = codec();
    let mut rng = StdRng::seed_from_u64(42);
    for len in [0, 1, 17, 255, 4096] {
        let mut data = vec![0u8; len];
        rng.fill_bytes(&mut data);
        let mut encoder = codec.encoder();
        encoder.write_bytes(&data);
        let mut decoder = codec.decoder(encoder.flush());
        assert_eq!(decoder.read_bytes().unwrap(), Bytes::from(data));
        decoder.finish().unwrap();
    }
}

#[test]
fn test_typed_and_dynamic_channels_agree() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .try_init();

    let codec = codec();
    let invoice = Invoice {
        id: 77,
        customer: "zulu".to_string(),
        paid: true,
    };

    let mut typed = codec.encoder();
    typed.write_struct(&invoice);
    let typed_bytes = typed.flush();

    // Decode dynamically, re-encode dynamically, compare bytes.
    let mut decoder = codec.decoder(typed_bytes.clone());
    let value = decoder.read_object().unwrap();
    let mut dynamic = codec.encoder();
    dynamic.write_object(&value).unwrap();
    assert_eq!(dynamic.flush(), typed_bytes);
}

#[test]
fn test_map_of_structs() {
    let codec = codec();
    let mut entries = BTreeMap::new();
    entries.insert(
        "first".to_string(),
        LineItem {
            sku: "A".to_string(),
            quantity: 1,
            notes: None,
        },
    );
    entries.insert(
        "second".to_string(),
        LineItem {
            sku: "B".to_string(),
            quantity: 2,
            notes: Some("gift".to_string()),
        },
    );

    let mut encoder = codec.encoder();
    encoder.write_map(&entries);
    let mut decoder = codec.decoder(encoder.flush());

    // The dynamic channel sees the same entries as runtime values.
    let Value::Map(decoded) = decoder.read_object().unwrap() else {
        panic!("expected a map value");
    };
    assert_eq!(decoded.len(), 2);
    assert_eq!(
        decoded["second"].downcast_struct::<LineItem>().map(|item| item.quantity),
        Some(2)
    );
}
