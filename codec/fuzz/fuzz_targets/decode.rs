#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use tagwire_codec::{impl_schema, ObjectCodec, Value};

#[derive(Arbitrary, Debug, Clone, PartialEq)]
struct Probe {
    id: i64,
    label: String,
    flags: Vec<bool>,
}

impl_schema!(Probe, "fuzz.Probe", { id, label, flags });

fn codec() -> ObjectCodec {
    let mut codec = ObjectCodec::new();
    codec.register::<Probe>();
    codec
}

/// Arbitrary bytes must decode cleanly or fail cleanly, never panic.
fn fuzz_decode(data: Vec<u8>) {
    let codec = codec();
    let mut decoder = codec.decoder(Bytes::from(data));
    while decoder.remaining() > 0 {
        if decoder.read_object().is_err() {
            break;
        }
    }
}

fn fuzz_struct(probe: Probe) {
    let codec = codec();
    let mut encoder = codec.encoder();
    encoder.write_struct(&probe);
    let mut decoder = codec.decoder(encoder.flush());
    let value = decoder
        .read_object()
        .expect("Failed to decode a successfully encoded struct!");
    assert_eq!(value.downcast_struct::<Probe>(), Some(&probe));
    decoder.finish().expect("Trailing bytes after struct frame!");
}

fn fuzz_scalars(flag: bool, small: i32, large: i64, real: f64) {
    let codec = codec();
    let mut encoder = codec.encoder();
    encoder.write_bool(flag);
    encoder.write_i32(small);
    encoder.write_i64(large);
    encoder.write_f64(real);
    let mut decoder = codec.decoder(encoder.flush());
    assert_eq!(decoder.read_bool().unwrap(), flag);
    assert_eq!(decoder.read_i32().unwrap(), small);
    assert_eq!(decoder.read_i64().unwrap(), large);
    // Bit comparison keeps NaN inputs honest.
    assert_eq!(decoder.read_f64().unwrap().to_bits(), real.to_bits());
    decoder.finish().expect("Trailing bytes after scalar frames!");
}

fn fuzz_strings(items: Vec<String>) {
    let codec = codec();
    let mut encoder = codec.encoder();
    encoder.write_sequence(&items);
    let mut decoder = codec.decoder(encoder.flush());
    let decoded = decoder
        .read_sequence::<String>()
        .expect("Failed to decode a successfully encoded sequence!");
    assert_eq!(decoded, items);
}

/// NaN floats break value equality, so the re-encode check skips them.
fn nan_free(value: &Value) -> bool {
    match value {
        Value::F32(v) => !v.is_nan(),
        Value::F64(v) => !v.is_nan(),
        Value::Sequence(items) | Value::Set(items) => items.iter().all(nan_free),
        Value::Map(entries) => entries.values().all(nan_free),
        _ => true,
    }
}

fn fuzz_reencode(data: Vec<u8>) {
    let codec = codec();
    let mut decoder = codec.decoder(Bytes::from(data));
    let Ok(value) = decoder.read_object() else {
        return;
    };
    // Whatever decoded once must encode and decode again to the same value,
    // except Absent, which intentionally travels as boolean true.
    if value == Value::Absent || !nan_free(&value) {
        return;
    }
    let mut encoder = codec.encoder();
    if encoder.write_object(&value).is_err() {
        return;
    }
    let mut again = codec.decoder(encoder.flush());
    let reread = again
        .read_object()
        .expect("Failed to decode a re-encoded value!");
    assert_eq!(reread, value);
}

#[derive(Arbitrary, Debug)]
enum FuzzInput {
    Decode(Vec<u8>),
    Reencode(Vec<u8>),
    Struct(Probe),
    Scalars(bool, i32, i64, f64),
    Strings(Vec<String>),
}

fn fuzz(input: FuzzInput) {
    match input {
        FuzzInput::Decode(data) => fuzz_decode(data),
        FuzzInput::Reencode(data) => fuzz_reencode(data),
        FuzzInput::Struct(probe) => fuzz_struct(probe),
        FuzzInput::Scalars(flag, small, large, real) => fuzz_scalars(flag, small, large, real),
        FuzzInput::Strings(items) => fuzz_strings(items),
    }
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
