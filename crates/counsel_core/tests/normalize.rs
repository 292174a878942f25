use chrono::{TimeZone, Utc};
use counsel_core::normalize::{canonicalize, normalize_instant};
use counsel_core::FieldValue;

fn shapes() -> Vec<FieldValue> {
    let native = Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap();
    vec![
        FieldValue::Timestamp(native),
        FieldValue::from("2025-05-01T08:30:00.000Z"),
        FieldValue::from("2025-05-01T10:30:00+02:00"),
        FieldValue::from("2025-05-01T08:30"),
        FieldValue::from("last tuesday"),
        FieldValue::from(""),
        FieldValue::Null,
        FieldValue::ServerTimestamp,
        FieldValue::Integer(1_714_552_200_000),
        FieldValue::Bool(true),
    ]
}

#[test]
fn canonicalize_is_idempotent_for_every_shape() {
    for raw in shapes() {
        let once = canonicalize(&raw);
        let twice = canonicalize(&once);
        assert_eq!(once, twice, "not idempotent for {raw:?}");
    }
}

#[test]
fn native_and_iso_forms_agree() {
    let expected = Utc.with_ymd_and_hms(2025, 5, 1, 8, 30, 0).unwrap();
    for raw in &shapes()[..4] {
        assert_eq!(normalize_instant(raw), Some(expected), "for {raw:?}");
    }
}

#[test]
fn malformed_values_become_absent() {
    for raw in &shapes()[4..] {
        assert_eq!(normalize_instant(raw), None, "for {raw:?}");
        assert_eq!(canonicalize(raw), FieldValue::Null);
    }
}
