//! Group descriptor file types
//!
//! A descriptor is a JSON document with a top-level `files` array. Each
//! element configures one button index of the group:
//!
//! ```json
//! { "files": [ { "title": "Lights", "image": "img/off.png",
//!                "image_pressed": "img/on.png", "script": [],
//!                "scriptCmd": [], "osc_commands": [], "delays": [] } ] }
//! ```

pub mod conformity;
pub(crate) mod lenient;
pub mod resolver;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub use conformity::{enforce_length_conformity, is_length_conformant};
pub use resolver::{DescriptorResolver, ResolvedButton};

/// Parsed descriptor file.
///
/// Entries stay raw until asked for, so a broken entry only affects its
/// own button.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub files: Vec<Value>,
}

impl GroupDescriptor {
    /// Record for a button index, all defaults when out of range or unusable
    pub fn record(&self, index: usize) -> ButtonRecord {
        self.files
            .get(index)
            .map(lenient::or_default)
            .unwrap_or_default()
    }
}

/// Configuration of a single button index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonRecord {
    #[serde(deserialize_with = "lenient::field")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub image_pressed: Option<String>,
    /// Script file paths
    #[serde(deserialize_with = "lenient::field")]
    pub script: Vec<String>,
    /// Inline command strings
    #[serde(rename = "scriptCmd", deserialize_with = "lenient::field")]
    pub script_cmd: Vec<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub osc_commands: Vec<OscCommand>,
    /// Gaps between commands in milliseconds
    #[serde(deserialize_with = "lenient::delays")]
    pub delays: Vec<u64>,
}

/// One OSC message to send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscCommand {
    #[serde(rename = "osc_path", alias = "path")]
    #[serde(default, deserialize_with = "lenient::field")]
    pub path: String,
    #[serde(rename = "osc_value", alias = "values")]
    #[serde(default, deserialize_with = "lenient::field")]
    pub values: Vec<OscValue>,
    #[serde(rename = "osc_port", alias = "port")]
    #[serde(default, deserialize_with = "lenient::field")]
    pub port: u16,
}

/// OSC argument, either numeric or text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OscValue {
    Number(serde_json::Number),
    Text(String),
}

/// Renders numbers the way a script argument list expects: whole floats
/// lose their fraction, so `1.0` prints as `1` and `1e3` as `1000`.
impl fmt::Display for OscValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscValue::Number(n) => match n.as_f64() {
                Some(x) if n.is_f64() && x.fract() == 0.0 && x.abs() < 1e21 => {
                    if x == 0.0 {
                        f.write_str("0")
                    } else {
                        write!(f, "{:.0}", x)
                    }
                }
                _ => write!(f, "{}", n),
            },
            OscValue::Text(s) => f.write_str(s),
        }
    }
}
