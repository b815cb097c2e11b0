use std::sync::Arc;

use serde_json::{Value, json};
use thai_idcard::Bridge;
use thai_idcard::test_support::mock_coordinator;

use crate::common::fixtures::{acs, sample_card};

fn opened_bridge() -> Bridge {
    let (coord, host, _) = mock_coordinator(sample_card());
    host.plug(acs(), true);
    let bridge = Bridge::new(Arc::new(coord));
    bridge.handle_call(
        "openDevice",
        &json!({"identifier": acs().identifier, "hasPermission": true}),
    );
    bridge
}

#[test]
fn read_all_json_carries_every_key() {
    let bridge = opened_bridge();
    let v = bridge.handle_call("readAll", &Value::Null);
    let record: Value = serde_json::from_str(v.as_str().unwrap()).unwrap();

    for key in [
        "cid",
        "titleTH",
        "firstnameTH",
        "middlenameTH",
        "lastnameTH",
        "titleEN",
        "firstnameEN",
        "middlenameEN",
        "lastnameEN",
        "birthdate",
        "gender",
        "issuer",
        "issueDate",
        "expireDate",
        "address",
        "photo",
    ] {
        assert!(record.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(record["firstnameEN"], "Somchai");
    assert_eq!(record["middlenameEN"], "");
    assert_eq!(record["photo"].as_array().map(Vec::len), Some(5100));
}

#[test]
fn selective_read_json_has_only_selected_keys() {
    let bridge = opened_bridge();
    let v = bridge.handle_call("read", &json!({"selected": ["nameEN"]}));
    let record: Value = serde_json::from_str(v.as_str().unwrap()).unwrap();
    let mut keys: Vec<&str> = record.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["firstnameEN", "lastnameEN", "middlenameEN", "titleEN"]);
}

#[test]
fn detached_reader_reports_err_string() {
    let bridge = opened_bridge();
    bridge.coordinator().dispatch(thai_idcard::Signal::Detached(acs()));
    let v = bridge.handle_call("readAll", &Value::Null);
    assert!(v.as_str().unwrap().starts_with("ERR "));
    assert!(bridge.handle_call("powerOn", &Value::Null).as_str().unwrap().starts_with("ERR powerOn"));
}
