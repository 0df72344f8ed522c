use std::fmt::{self, Display, Formatter};

use regex::Regex;

use crate::error::{InvalidReservedPatternSnafu, Result};

/// Decides which field names are reserved when generating code.
///
/// Reserved fields keep their bits in the generated layout but get no name and no accessors.
pub trait IsReserved {
    fn is_reserved(&self, name: &str) -> bool;
}

impl<F: Fn(&str) -> bool> IsReserved for F {
    fn is_reserved(&self, name: &str) -> bool {
        self(name)
    }
}

/// A regular expression matched at the start of a field name.
///
/// `rsvd[0-9]+|pad_` reserves `rsvd12` and `pad_x` but not `my_rsvd1`.
#[derive(Clone, Debug)]
pub struct ReservedPattern {
    source: String,
    regex: Regex,
}

impl ReservedPattern {
    pub const DEFAULT: &'static str = "reserved|RESERVED|_";

    pub fn new(pattern: &str) -> Result<Self> {
        match Regex::new(&format!("^(?:{pattern})")) {
            Ok(regex) => Ok(Self {
                source: pattern.to_string(),
                regex,
            }),
            Err(e) => InvalidReservedPatternSnafu {
                pattern,
                message: e.to_string(),
            }
            .fail(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for ReservedPattern {
    fn default() -> Self {
        Self::new(Self::DEFAULT).expect("the default reserved pattern compiles")
    }
}

impl PartialEq for ReservedPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ReservedPattern {}

impl Display for ReservedPattern {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl IsReserved for ReservedPattern {
    fn is_reserved(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}
