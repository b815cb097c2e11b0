// thai-idcard/src/bridge.rs
//! Host-facing method surface. Results are JSON values; every failure is
//! flattened into a string starting with `ERR` because host method channels
//! only carry plain values.

use std::sync::Arc;

use log::warn;
use serde_json::{Value, json};

use crate::coordinator::Coordinator;
use crate::utils::apdu_hex;
use crate::{Error, Result};

fn err_value(prefix: &str, e: &Error) -> Value {
    if prefix.is_empty() {
        Value::String(format!("ERR {}", e))
    } else {
        Value::String(format!("ERR {} {}", prefix, e))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::MalformedResponse(e.to_string()))
}

pub struct Bridge {
    coordinator: Arc<Coordinator>,
}

impl Bridge {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn get_platform_version(&self) -> String {
        format!(
            "{} {} ({})",
            std::env::consts::OS,
            std::env::consts::ARCH,
            env!("CARGO_PKG_VERSION")
        )
    }

    pub fn get_device_list(&self) -> Value {
        match self.coordinator.device_list().and_then(|l| to_value(&l)) {
            Ok(v) => v,
            Err(e) => err_value("getDeviceList", &e),
        }
    }

    pub fn request_permission(&self, identifier: &str) -> Value {
        match self
            .coordinator
            .request_permission(identifier)
            .and_then(|ev| to_value(&ev))
        {
            Ok(v) => v,
            Err(e) => err_value("requestPermission", &e),
        }
    }

    pub fn open_device(&self, identifier: &str, has_permission: bool) -> Value {
        match self
            .coordinator
            .open_device(identifier, has_permission)
            .and_then(|ev| to_value(&ev))
        {
            Ok(v) => v,
            Err(e) => err_value("openDevice", &e),
        }
    }

    /// ATR as spaced hex.
    pub fn power_on(&self) -> Value {
        match self.coordinator.power_on() {
            Ok(atr) => Value::String(apdu_hex(&atr)),
            Err(e) => err_value("powerOn", &e),
        }
    }

    pub fn power_off(&self) -> Value {
        match self.coordinator.power_off() {
            Ok(()) => Value::String("closed".into()),
            Err(e) => err_value("powerOff", &e),
        }
    }

    /// Every field as a JSON object string.
    pub fn read_all(&self) -> Value {
        match self.coordinator.read_all().and_then(|o| record_json(&o)) {
            Ok(s) => Value::String(s),
            Err(e) => err_value("", &e),
        }
    }

    /// The selected fields as a JSON object string.
    pub fn read_specific<S: AsRef<str>>(&self, selected: &[S]) -> Value {
        match self
            .coordinator
            .read_specific(selected)
            .and_then(|o| record_json(&o))
        {
            Ok(s) => Value::String(s),
            Err(e) => err_value("", &e),
        }
    }

    /// Dispatch a host method call by name.
    pub fn handle_call(&self, method: &str, args: &Value) -> Value {
        match method {
            "getPlatformVersion" => Value::String(self.get_platform_version()),
            "getDeviceList" => self.get_device_list(),
            "requestPermission" => match args.get("identifier").and_then(Value::as_str) {
                Some(id) => self.request_permission(id),
                None => missing_argument(method, "identifier"),
            },
            "openDevice" => match args.get("identifier").and_then(Value::as_str) {
                Some(id) => {
                    let has_permission = args
                        .get("hasPermission")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    self.open_device(id, has_permission)
                }
                None => missing_argument(method, "identifier"),
            },
            "powerOn" => self.power_on(),
            "powerOff" => self.power_off(),
            "readAll" => self.read_all(),
            "read" => match args.get("selected").and_then(Value::as_array) {
                Some(list) => {
                    let selected: Vec<&str> = list.iter().filter_map(Value::as_str).collect();
                    self.read_specific(&selected)
                }
                None => missing_argument(method, "selected"),
            },
            other => {
                warn!("unknown method {}", other);
                json!(format!("ERR notImplemented {}", other))
            }
        }
    }
}

fn missing_argument(method: &str, name: &str) -> Value {
    Value::String(format!("ERR {} missing argument {}", method, name))
}

fn record_json(outcome: &crate::card::ReadOutcome) -> Result<String> {
    serde_json::to_string(&outcome.record).map_err(|e| Error::MalformedResponse(e.to_string()))
}
