//! Command Tests
//!
//! Tests for request parsing, status, and execution against a Store.

use undis::protocol::{Command, CommandStatus, StorageOp};
use undis::store::NEVER_EXPIRES;
use undis::{Store, UndisError};

// =============================================================================
// Helper Functions
// =============================================================================

fn store_with_exists() -> Store {
    let store = Store::new();
    store.set("exists", &b"value"[..], 42, 0);
    store
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_empty_is_invalid() {
    assert_eq!(Command::default().status(), CommandStatus::InvalidCommand);
    assert_eq!(Command::parse(b"").status(), CommandStatus::InvalidCommand);
    assert_eq!(Command::parse(b"   ").status(), CommandStatus::InvalidCommand);
}

#[test]
fn test_unknown_command_is_invalid() {
    assert_eq!(Command::parse(b"foo bar baz").status(), CommandStatus::InvalidCommand);

    // No case folding
    assert_eq!(Command::parse(b"Get foo").status(), CommandStatus::InvalidCommand);
    assert_eq!(Command::parse(b"SET k 0 0 1").status(), CommandStatus::InvalidCommand);
}

#[test]
fn test_parse_storage() {
    for (name, op) in [
        ("set", StorageOp::Set),
        ("add", StorageOp::Add),
        ("replace", StorageOp::Replace),
        ("append", StorageOp::Append),
        ("prepend", StorageOp::Prepend),
    ] {
        let line = format!("{} mykey 43 -5 9", name);
        let command = Command::parse(line.as_bytes());

        assert_eq!(command.status(), CommandStatus::DataRequired);
        assert_eq!(
            command,
            Command::Storage {
                op,
                key: "mykey".to_string(),
                flags: 43,
                exptime: -5,
                bytes: 9,
            }
        );
        assert_eq!(StorageOp::from_name(op.as_str().as_bytes()), Some(op));
    }
}

#[test]
fn test_parse_retrieval_keeps_order() {
    let command = Command::parse(b"get b a c");

    assert_eq!(command.status(), CommandStatus::ValidCommand);
    assert_eq!(
        command,
        Command::Retrieval {
            keys: vec!["b".to_string(), "a".to_string(), "c".to_string()],
        }
    );
}

#[test]
fn test_parse_deletion() {
    let command = Command::parse(b"delete mykey");

    assert_eq!(command.status(), CommandStatus::ValidCommand);
    assert_eq!(command, Command::Deletion { key: "mykey".to_string() });
}

#[test]
fn test_parse_tolerates_extra_whitespace() {
    let command = Command::parse(b"  get \t a   b ");
    assert_eq!(
        command,
        Command::Retrieval {
            keys: vec!["a".to_string(), "b".to_string()],
        }
    );
}

#[test]
fn test_bad_commands_are_invalid() {
    let mut command = Command::default();

    assert_eq!(command.reset(b"get"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"delete"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"set"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"add exists"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"replace exists 0"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"append exists 0 0"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"prepend exists 0 0 -1"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"set exists -1 0 5"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"set exists 0 soon 5"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"set exists 0 0 five"), CommandStatus::InvalidCommand);
    assert_eq!(command.reset(b"set exists 4294967296 0 5"), CommandStatus::InvalidCommand);
}

#[test]
fn test_non_utf8_key_is_invalid() {
    assert_eq!(Command::parse(b"get \xff\xfe").status(), CommandStatus::InvalidCommand);
    assert_eq!(Command::parse(b"delete \xff").status(), CommandStatus::InvalidCommand);
}

// =============================================================================
// Retrieval Tests
// =============================================================================

#[test]
fn test_get_hit_and_miss() {
    let store = store_with_exists();
    let mut command = Command::parse(b"get exists not_exists");

    assert_eq!(
        command.execute(&store).unwrap(),
        b"VALUE exists 42 5\r\nvalue\r\nEND\r\n"
    );
}

#[test]
fn test_get_all_misses_still_ends() {
    let store = Store::new();
    let mut command = Command::parse(b"get a b c");

    assert_eq!(command.execute(&store).unwrap(), b"END\r\n");
}

#[test]
fn test_get_multiple_in_request_order() {
    let store = Store::new();
    store.set("a", &b"1"[..], 1, 0);
    store.set("b", &b"22"[..], 2, 0);

    let mut command = Command::parse(b"get b missing a b");

    assert_eq!(
        command.execute(&store).unwrap(),
        b"VALUE b 2 2\r\n22\r\nVALUE a 1 1\r\n1\r\nVALUE b 2 2\r\n22\r\nEND\r\n"
    );
}

#[test]
fn test_get_skips_expired() {
    let store = Store::new();
    store.set("expired", &b"value"[..], 0, -1);

    let mut command = Command::parse(b"get expired");
    assert_eq!(command.execute(&store).unwrap(), b"END\r\n");
}

// =============================================================================
// Deletion Tests
// =============================================================================

#[test]
fn test_delete_then_not_found() {
    let store = store_with_exists();

    let mut command = Command::parse(b"delete exists");
    assert_eq!(command.execute(&store).unwrap(), b"DELETED\r\n");

    command.reset(b"delete exists");
    assert_eq!(command.execute(&store).unwrap(), b"NOT_FOUND\r\n");
}

// =============================================================================
// Storage Tests
// =============================================================================

#[test]
fn test_set_command() {
    let store = store_with_exists();
    let mut command = Command::parse(b"set exists 43 1000 9");

    assert_eq!(command.status(), CommandStatus::DataRequired);
    assert_eq!(command.execute_with_data(&store, b"new_value").unwrap(), b"STORED\r\n");

    let entry = store.get("exists").unwrap();
    assert_eq!(entry.value, b"new_value");
    assert_eq!(entry.flags, 43);
    assert_ne!(entry.expiration, NEVER_EXPIRES);
}

#[test]
fn test_set_then_get() {
    let store = Store::new();

    let mut command = Command::parse(b"set exists 42 0 5");
    assert_eq!(command.execute_with_data(&store, b"value").unwrap(), b"STORED\r\n");

    command.reset(b"get exists");
    assert_eq!(
        command.execute(&store).unwrap(),
        b"VALUE exists 42 5\r\nvalue\r\nEND\r\n"
    );
}

#[test]
fn test_add_command() {
    let store = store_with_exists();

    let mut command = Command::parse(b"add exists 0 0 9");
    assert_eq!(command.execute_with_data(&store, b"new_value").unwrap(), b"NOT_STORED\r\n");

    command.reset(b"add not_exists 0 0 5");
    assert_eq!(command.execute_with_data(&store, b"value").unwrap(), b"STORED\r\n");
    assert_eq!(store.get("not_exists").unwrap().value, b"value");
}

#[test]
fn test_replace_command() {
    let store = store_with_exists();

    let mut command = Command::parse(b"replace exists 0 0 9");
    assert_eq!(command.execute_with_data(&store, b"new_value").unwrap(), b"STORED\r\n");
    assert_eq!(store.get("exists").unwrap().value, b"new_value");

    command.reset(b"replace not_exists 0 0 5");
    assert_eq!(command.execute_with_data(&store, b"value").unwrap(), b"NOT_STORED\r\n");
    assert!(store.get("not_exists").is_none());
}

#[test]
fn test_append_prepend_commands() {
    let store = store_with_exists();

    let mut command = Command::parse(b"append exists 0 0 7");
    assert_eq!(command.execute_with_data(&store, b"_suffix").unwrap(), b"STORED\r\n");
    assert_eq!(store.get("exists").unwrap().value, b"value_suffix");

    command.reset(b"prepend exists 0 0 7");
    assert_eq!(command.execute_with_data(&store, b"prefix_").unwrap(), b"STORED\r\n");
    assert_eq!(store.get("exists").unwrap().value, b"prefix_value_suffix");

    // Flags from the original set are kept
    assert_eq!(store.get("exists").unwrap().flags, 42);

    command.reset(b"append not_exists 0 0 7");
    assert_eq!(command.execute_with_data(&store, b"_suffix").unwrap(), b"NOT_STORED\r\n");

    command.reset(b"prepend not_exists 0 0 7");
    assert_eq!(command.execute_with_data(&store, b"prefix_").unwrap(), b"NOT_STORED\r\n");
}

#[test]
fn test_zero_length_value() {
    let store = Store::new();

    let mut command = Command::parse(b"set empty 0 0 0");
    assert_eq!(command.execute_with_data(&store, b"").unwrap(), b"STORED\r\n");

    command.reset(b"get empty");
    assert_eq!(command.execute(&store).unwrap(), b"VALUE empty 0 0\r\n\r\nEND\r\n");
}

#[test]
fn test_byte_count_mismatch_is_client_error() {
    let store = store_with_exists();
    let mut command = Command::parse(b"set exists 0 0 3");

    let err = command.execute_with_data(&store, b"four").unwrap_err();

    assert!(err.is_client_error());
    assert!(matches!(err, UndisError::ClientData(_)));
    assert_eq!(store.get("exists").unwrap().value, b"value");
    assert_eq!(command.status(), CommandStatus::InvalidCommand);
}

// =============================================================================
// One-Shot Tests
// =============================================================================

#[test]
fn test_command_is_spent_after_execute() {
    let store = store_with_exists();

    let mut command = Command::parse(b"get exists");
    command.execute(&store).unwrap();
    assert_eq!(command, Command::Empty);

    let err = command.execute(&store).unwrap_err();
    assert!(matches!(err, UndisError::CommandNotExecutable(_)));
    assert!(!err.is_client_error());
}

#[test]
fn test_storage_is_spent_after_execute() {
    let store = Store::new();

    let mut command = Command::parse(b"set key 0 0 1");
    command.execute_with_data(&store, b"x").unwrap();

    let err = command.execute_with_data(&store, b"x").unwrap_err();
    assert!(matches!(err, UndisError::CommandNotExecutable(_)));
}

#[test]
fn test_invalid_command_cannot_execute() {
    let store = Store::new();
    let mut command = Command::parse(b"nonsense");

    assert!(matches!(
        command.execute(&store),
        Err(UndisError::CommandNotExecutable(_))
    ));
}

#[test]
fn test_wrong_phase_is_a_fault_and_keeps_command() {
    let store = Store::new();

    let mut storage = Command::parse(b"set key 0 0 1");
    assert!(matches!(
        storage.execute(&store),
        Err(UndisError::CommandNotExecutable(_))
    ));
    assert_eq!(storage.status(), CommandStatus::DataRequired);

    let mut retrieval = Command::parse(b"get key");
    assert!(matches!(
        retrieval.execute_with_data(&store, b"x"),
        Err(UndisError::CommandNotExecutable(_))
    ));
    assert_eq!(retrieval.status(), CommandStatus::ValidCommand);
}
