//! Built-in encoders.

use std::fmt::Write as _;

use ::base64::Engine as _;
use ::base64::engine::general_purpose;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

use super::{expect_bool, expect_integer, expect_str};
use crate::capability::{Capability, Encodable, PluginRejection};
use crate::class::ClassDefinition;
use crate::schema::{DeclaredType, ParamDecl};
use crate::value::ParamValue;

/// Bytes left as-is by the URL encoder: RFC 3986 unreserved characters.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(super) fn base64() -> ClassDefinition {
    ClassDefinition::new("Base64 encodes data", || {
        Capability::encodable(Base64::default())
    })
    .with_params(vec![
        ParamDecl::new("alphabet", DeclaredType::choices(["standard", "url"]))
            .with_default(ParamValue::from("standard"))
            .describe("Standard or URL-safe alphabet"),
        ParamDecl::new("padding", DeclaredType::Boolean)
            .with_default(ParamValue::Boolean(true))
            .describe("Pad output with '='"),
    ])
}

pub(super) fn hex() -> ClassDefinition {
    ClassDefinition::new("Hex encodes data", || Capability::encodable(Hex::default())).with_params(
        vec![
            ParamDecl::new("case", DeclaredType::choices(["lower", "upper"]))
                .with_default(ParamValue::from("lower"))
                .describe("Case of the hex digits"),
            ParamDecl::new("style", DeclaredType::choices(["plain", "escaped"]))
                .with_default(ParamValue::from("plain"))
                .describe("Bare digits or \\x escapes"),
        ],
    )
}

pub(super) fn url() -> ClassDefinition {
    ClassDefinition::new("Percent encodes data", || Capability::encodable(Url::default()))
        .with_params(vec![
            ParamDecl::new("encode_all", DeclaredType::Boolean)
                .with_default(ParamValue::Boolean(false))
                .describe("Escape unreserved characters too"),
        ])
}

pub(super) fn xor() -> ClassDefinition {
    ClassDefinition::new("XORs every byte with a key", || {
        Capability::encodable(Xor::default())
    })
    .with_params(vec![
        ParamDecl::new("key", DeclaredType::Integer)
            .required()
            .with_range(0, 255)
            .describe("Single-byte key"),
    ])
}

#[derive(Debug)]
struct Base64 {
    url_safe: bool,
    padding: bool,
}

impl Default for Base64 {
    fn default() -> Self {
        Self {
            url_safe: false,
            padding: true,
        }
    }
}

impl Base64 {
    fn engine(&self) -> &'static general_purpose::GeneralPurpose {
        match (self.url_safe, self.padding) {
            (false, true) => &general_purpose::STANDARD,
            (false, false) => &general_purpose::STANDARD_NO_PAD,
            (true, true) => &general_purpose::URL_SAFE,
            (true, false) => &general_purpose::URL_SAFE_NO_PAD,
        }
    }
}

impl Encodable for Base64 {
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection> {
        match name {
            "alphabet" => {
                self.url_safe = match expect_str(value)? {
                    "standard" => false,
                    "url" => true,
                    other => {
                        return Err(PluginRejection::new(format!(
                            "unknown alphabet '{other}'"
                        )));
                    }
                };
            }
            "padding" => self.padding = expect_bool(value)?,
            _ => return Err(PluginRejection::unknown_param(name)),
        }
        Ok(())
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, PluginRejection> {
        Ok(self.engine().encode(data).into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Option<Result<Vec<u8>, PluginRejection>> {
        Some(
            self.engine()
                .decode(data)
                .map_err(|error| PluginRejection::new(format!("invalid base64: {error}"))),
        )
    }
}

#[derive(Debug, Default)]
struct Hex {
    upper: bool,
    escaped: bool,
}

impl Encodable for Hex {
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection> {
        match (name, expect_str(value)?) {
            ("case", "lower") => self.upper = false,
            ("case", "upper") => self.upper = true,
            ("style", "plain") => self.escaped = false,
            ("style", "escaped") => self.escaped = true,
            ("case" | "style", other) => {
                return Err(PluginRejection::new(format!("unknown {name} '{other}'")));
            }
            _ => return Err(PluginRejection::unknown_param(name)),
        }
        Ok(())
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, PluginRejection> {
        if !self.escaped {
            let digits = if self.upper {
                ::hex::encode_upper(data)
            } else {
                ::hex::encode(data)
            };
            return Ok(digits.into_bytes());
        }
        let mut out = String::with_capacity(data.len() * 4);
        for byte in data {
            let written = if self.upper {
                write!(out, "\\x{byte:02X}")
            } else {
                write!(out, "\\x{byte:02x}")
            };
            written.map_err(|error| PluginRejection::new(error.to_string()))?;
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Option<Result<Vec<u8>, PluginRejection>> {
        let decoded = std::str::from_utf8(data)
            .map_err(|error| PluginRejection::new(format!("invalid hex: {error}")))
            .and_then(|text| {
                let digits = if self.escaped {
                    text.replace("\\x", "")
                } else {
                    text.to_owned()
                };
                ::hex::decode(digits)
                    .map_err(|error| PluginRejection::new(format!("invalid hex: {error}")))
            });
        Some(decoded)
    }
}

#[derive(Debug, Default)]
struct Url {
    encode_all: bool,
}

impl Encodable for Url {
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection> {
        match name {
            "encode_all" => self.encode_all = expect_bool(value)?,
            _ => return Err(PluginRejection::unknown_param(name)),
        }
        Ok(())
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, PluginRejection> {
        if !self.encode_all {
            return Ok(percent_encoding::percent_encode(data, UNRESERVED)
                .to_string()
                .into_bytes());
        }
        let mut out = String::with_capacity(data.len() * 3);
        for byte in data {
            write!(out, "%{byte:02X}").map_err(|error| PluginRejection::new(error.to_string()))?;
        }
        Ok(out.into_bytes())
    }

    fn decode(&self, data: &[u8]) -> Option<Result<Vec<u8>, PluginRejection>> {
        Some(Ok(percent_encoding::percent_decode(data).collect()))
    }
}

#[derive(Debug, Default)]
struct Xor {
    key: Option<u8>,
}

impl Xor {
    fn apply(&self, data: &[u8]) -> Result<Vec<u8>, PluginRejection> {
        let key = self
            .key
            .ok_or_else(|| PluginRejection::new("key is not set"))?;
        Ok(data.iter().map(|byte| byte ^ key).collect())
    }
}

impl Encodable for Xor {
    fn assign(&mut self, name: &str, value: &ParamValue) -> Result<(), PluginRejection> {
        match name {
            "key" => {
                let key = expect_integer(value)?;
                let key = u8::try_from(key)
                    .map_err(|_| PluginRejection::new(format!("{key} does not fit in one byte")))?;
                self.key = Some(key);
            }
            _ => return Err(PluginRejection::unknown_param(name)),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), PluginRejection> {
        match self.key {
            None => Err(PluginRejection::new("key is not set")),
            Some(0) => Err(PluginRejection::new("key 0 leaves the data unchanged")),
            Some(_) => Ok(()),
        }
    }

    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, PluginRejection> {
        self.apply(data)
    }

    fn decode(&self, data: &[u8]) -> Option<Result<Vec<u8>, PluginRejection>> {
        Some(self.apply(data))
    }
}
