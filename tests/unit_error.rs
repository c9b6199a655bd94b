use std::path::PathBuf;

use trek::error::{codes, exit_codes, Error, JsonError};

#[test]
fn caller_errors_map_to_stable_codes() {
    let cases = [
        (Error::Validation("bad".into()), codes::VALIDATION_ERROR, 400),
        (Error::not_found("Task", "TREK-1"), codes::NOT_FOUND, 404),
        (Error::Conflict("dup".into()), codes::CONFLICT, 409),
    ];
    for (err, code, status) in cases {
        assert_eq!(err.code(), code);
        assert_eq!(err.status_code(), status);
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.is_user_error());
    }
}

#[test]
fn internal_errors_are_generic() {
    let err = Error::LockFailed(PathBuf::from(".trek/store.json.lock"));
    assert_eq!(err.code(), codes::INTERNAL_ERROR);
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    assert_eq!(err.public_message(), "Internal server error");

    let json = serde_json::to_value(JsonError::from(&err)).expect("json");
    assert_eq!(json["error"], "Internal server error");
    assert_eq!(json["code"], "INTERNAL_ERROR");
}

#[test]
fn json_error_carries_not_found_details() {
    let err = Error::not_found("Dependency task", "TREK-9");
    assert_eq!(err.to_string(), "Dependency task not found: TREK-9");

    let json = serde_json::to_value(JsonError::from(&err)).expect("json");
    assert_eq!(json["error"], "Dependency task not found: TREK-9");
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["details"]["entity"], "Dependency task");
    assert_eq!(json["details"]["id"], "TREK-9");
}

#[test]
fn io_errors_convert_as_internal() {
    let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
    assert!(!err.is_user_error());
    assert_eq!(err.code(), codes::INTERNAL_ERROR);
}
