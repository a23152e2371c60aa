//! Example documents the command line tool stores.
//!
//! Field names are capitalized on disk, `{"Name": ..., "Address": {"City": ...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Number;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub name: String,
    /// Kept as the number literal it was given, `30` and `30.0` stay distinct
    pub age: Number,
    pub contact: String,
    pub company: String,
    pub address: Address,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default = "zero")]
    pub pincode: Number,
}

impl Address {
    pub fn in_city(city: String) -> Address {
        Address {
            city,
            state: String::new(),
            country: String::new(),
            pincode: zero(),
        }
    }
}

fn zero() -> Number {
    Number::from(0)
}
