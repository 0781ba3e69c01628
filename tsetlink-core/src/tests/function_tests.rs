use super::*;
use crate::error::gateway_error;

#[test]
fn test_descriptor_bytes_roundtrip() {
    let descriptor = FunctionDescriptor::source("csv_lines")
        .with_version(3)
        .with_param("path", "/data/input.csv")
        .with_param("skip_header", true);

    let bytes = descriptor.to_bytes().unwrap();
    let restored = FunctionDescriptor::from_bytes(&bytes).unwrap();
    assert_eq!(restored, descriptor);
}

#[test]
fn test_descriptor_rejects_unknown_format_version() {
    let descriptor = FunctionDescriptor::map("double");
    let mut bytes = descriptor.to_bytes().unwrap();
    // bincode writes the u16 version little endian at offset 0.
    bytes[0] = 9;
    let err = FunctionDescriptor::from_bytes(&bytes).unwrap_err();
    assert!(err.to_string().contains("unsupported function descriptor format"));
}

#[test]
fn test_ensure_kind_accepts_matching_descriptor() {
    FunctionDescriptor::source("range")
        .ensure_kind(FunctionKind::Source)
        .unwrap();
}

#[test]
fn test_ensure_kind_rejects_wrong_kind() {
    let err = FunctionDescriptor::map("double")
        .ensure_kind(FunctionKind::Source)
        .unwrap_err();
    assert!(matches!(
        gateway_error(&err),
        Some(GatewayError::InvalidArgument(_))
    ));
    assert!(err.to_string().contains("expected a source function"));
}

#[test]
fn test_ensure_kind_rejects_empty_name() {
    let err = FunctionDescriptor::source("  ")
        .ensure_kind(FunctionKind::Source)
        .unwrap_err();
    assert!(matches!(
        gateway_error(&err),
        Some(GatewayError::InvalidArgument(_))
    ));
}
