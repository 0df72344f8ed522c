//! Register-map documents.
//!
//! A document is a JSON object of register entries, generated in document order:
//!
//! ```json
//! {
//!     "// General configuration": "",
//!     "GCONF": {
//!         "address": "0x00",
//!         "def": "reserved:11 lock_gconf:10 shaft2:9 shaft1:8 test_mode:7 reserved:6:4 poscmp_enable:3 reserved:2:0"
//!     },
//!     "X_TARGET": {
//!         "address": ["0x2D", "0x4D"],
//!         "defs": ["xtarget:31:0"],
//!         "reg_n": 32
//!     }
//! }
//! ```
//!
//! Keys starting with `//` are comments and are copied to the output. Other entry members
//! override the generation options: `reg_t`, `reg_n`, `address_t`, `prefix`, `reserved_regex`
//! and `cpp`.

use crate::error::{DocumentSnafu, Error, Result};
use crate::gen::{self, Address, CodegenOptions, Dialect, Style};
use crate::json::{self, Value};
use crate::register::Register;
use crate::reserved::ReservedPattern;

const COMMENT_MARKER: &str = "//";

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Comment(String),
    Register(Entry),
}

/// One register of a document together with everything needed to generate it.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub register: Register,
    pub address: Address,
    pub options: CodegenOptions,
}

impl Entry {
    pub fn code(&self, style: Style) -> Result<String> {
        gen::render(&self.register, &self.address, &self.options, style)
    }
}

fn document_error(entry: &str, message: impl Into<String>) -> Error {
    DocumentSnafu {
        entry,
        message: message.into(),
    }
    .build()
}

/// Loads every entry of a document. `defaults` are the options entries start from.
pub fn load(text: &str, defaults: &CodegenOptions, comments: bool) -> Result<Vec<Item>> {
    let root = json::parse(text).map_err(|e| {
        let message = match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let consumed = &text[..text.len() - e.input.len()];
                format!(
                    "invalid JSON at line {}",
                    consumed.matches('\n').count() + 1
                )
            }
            nom::Err::Incomplete(_) => "truncated JSON".to_string(),
        };
        document_error("<document>", message)
    })?;
    let Value::Object(members) = root else {
        return Err(document_error(
            "<document>",
            "expected an object of register entries",
        ));
    };

    let mut items = Vec::new();
    for (key, body) in members {
        if key.trim().starts_with(COMMENT_MARKER) {
            if comments {
                items.push(Item::Comment(key));
            }
            continue;
        }
        if key.is_empty() || body.is_empty() {
            continue;
        }
        items.push(Item::Register(load_entry(&key, body, defaults)?));
    }
    Ok(items)
}

fn load_entry(key: &str, body: Value, defaults: &CodegenOptions) -> Result<Entry> {
    let Value::Object(members) = body else {
        return Err(document_error(key, "expected an object"));
    };

    let mut def = None;
    let mut defs = None;
    let mut address = None;
    let mut options = defaults.clone();
    for (name, value) in members {
        match name.as_str() {
            "def" => def = Some(string_option(key, &name, &value)?.to_string()),
            "defs" => {
                let Value::Array(parts) = &value else {
                    return Err(document_error(key, "`defs` must be an array of strings"));
                };
                let parts = parts
                    .iter()
                    .map(|part| string_option(key, &name, part))
                    .collect::<Result<Vec<_>>>()?;
                defs = Some(parts.join(" "));
            }
            "address" => address = Some(parse_address(key, &value)?),
            "reg_t" => options.integer_type = Some(string_option(key, &name, &value)?.to_string()),
            "reg_n" => {
                let width = value
                    .as_u64()
                    .and_then(|width| u32::try_from(width).ok())
                    .ok_or_else(|| document_error(key, "`reg_n` must be an integer"))?;
                options.integer_width = Some(width);
            }
            "address_t" => options.address_type = string_option(key, &name, &value)?.to_string(),
            "prefix" => options.prefix = string_option(key, &name, &value)?.to_string(),
            "reserved_regex" => {
                options.reserved = ReservedPattern::new(string_option(key, &name, &value)?)?
            }
            "cpp" => {
                let cpp = value
                    .as_bool()
                    .ok_or_else(|| document_error(key, "`cpp` must be a boolean"))?;
                options.dialect = if cpp { Dialect::Cpp } else { Dialect::C };
            }
            _ => log::warn!("entry {key:?}: ignoring unknown option {name:?}"),
        }
    }

    let spec = defs
        .or(def)
        .ok_or_else(|| document_error(key, "missing `def` or `defs`"))?;
    let address = address.ok_or_else(|| document_error(key, "missing `address`"))?;
    let register = Register::from_spec(&spec, key)?;
    Ok(Entry {
        register,
        address,
        options,
    })
}

fn string_option<'v>(key: &str, name: &str, value: &'v Value) -> Result<&'v str> {
    value
        .as_str()
        .ok_or_else(|| document_error(key, format!("`{name}` must be a string")))
}

fn parse_address(key: &str, value: &Value) -> Result<Address> {
    match value {
        Value::Array(values) => values
            .iter()
            .map(|value| parse_address_value(key, value))
            .collect::<Result<Vec<_>>>()
            .map(Address::Banked),
        value => parse_address_value(key, value).map(Address::Single),
    }
}

fn parse_address_value(key: &str, value: &Value) -> Result<u64> {
    let parsed = match value {
        Value::Number(_) => value.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => s.parse().ok(),
            }
        }
        _ => None,
    };
    parsed.ok_or_else(|| document_error(key, "`address` must be an integer or a list of integers"))
}
