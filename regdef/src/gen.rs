//! C and C++ code generation.
//!
//! Two shapes are generated for a register. [`render_struct`] emits a bitfield struct with a raw
//! value accessor and a from-raw constructor. [`render_masks`] emits flat position and mask
//! constants, which stay portable where the layout of bitfields is implementation-defined.

use crate::error::Result;
use crate::register::{Field, Register};
use crate::reserved::{IsReserved, ReservedPattern};
use crate::width::{self, IntegerType};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Dialect {
    C,
    #[default]
    Cpp,
}

/// The address or addresses a register is mapped at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Address {
    Single(u64),
    /// A register repeated at several addresses, such as one per motor or channel.
    Banked(Vec<u64>),
}

impl From<u64> for Address {
    fn from(address: u64) -> Self {
        Self::Single(address)
    }
}

impl From<Vec<u64>> for Address {
    fn from(addresses: Vec<u64>) -> Self {
        Self::Banked(addresses)
    }
}

fn hex(address: u64) -> String {
    format!("{address:#04x}")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Register integer type, used verbatim. Takes priority over `integer_width`.
    pub integer_type: Option<String>,
    /// Register integer width; the narrowest fitting one when unset.
    pub integer_width: Option<u32>,
    /// Type of the address constants.
    pub address_type: String,
    /// Prepended to every generated symbol.
    pub prefix: String,
    pub reserved: ReservedPattern,
    pub dialect: Dialect,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            integer_type: None,
            integer_width: None,
            address_type: "uint8_t".to_string(),
            prefix: String::new(),
            reserved: ReservedPattern::default(),
            dialect: Dialect::default(),
        }
    }
}

impl CodegenOptions {
    fn integer_type(&self, register: &Register) -> Result<IntegerType> {
        width::resolve(
            register.name(),
            register.n_bits(),
            self.integer_type.as_deref(),
            self.integer_width,
        )
    }
}

fn ones(n: u32) -> String {
    "1".repeat(n as usize)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Style {
    #[default]
    Struct,
    Masks,
}

pub fn render(
    register: &Register,
    address: &Address,
    options: &CodegenOptions,
    style: Style,
) -> Result<String> {
    match style {
        Style::Struct => render_struct(register, address, options),
        Style::Masks => render_masks(register, address, options),
    }
}

/// Generates a bitfield struct using the options' reserved pattern.
pub fn render_struct(
    register: &Register,
    address: &Address,
    options: &CodegenOptions,
) -> Result<String> {
    render_struct_with(register, address, options, &options.reserved)
}

/// Generates flat position and mask constants using the options' reserved pattern.
pub fn render_masks(
    register: &Register,
    address: &Address,
    options: &CodegenOptions,
) -> Result<String> {
    render_masks_with(register, address, options, &options.reserved)
}

pub fn render_struct_with(
    register: &Register,
    address: &Address,
    options: &CodegenOptions,
    reserved: &dyn IsReserved,
) -> Result<String> {
    let reg_t = options.integer_type(register)?;
    let name = format!("{}{}", options.prefix, register.name());
    let n_bits = register.n_bits();
    let named: Vec<&Field> = register
        .fields()
        .iter()
        .filter(|field| !reserved.is_reserved(&field.name))
        .collect();

    let members: Vec<String> = register
        .fields()
        .iter()
        .map(|field| {
            let member = if reserved.is_reserved(&field.name) {
                ""
            } else {
                field.name.as_str()
            };
            format!("    {}:{};", [reg_t.name.as_str(), member].join(" "), field.length())
        })
        .collect();
    let from_raw: Vec<String> = named
        .iter()
        .map(|field| {
            let offset = field.offset();
            format!(
                ".{} = ((raw) & (0b{}U << {offset}U)) >> {offset}U",
                field.name,
                ones(field.length()),
            )
        })
        .collect();

    let mut lines = Vec::new();
    match options.dialect {
        Dialect::C => {
            match address {
                Address::Single(address) => {
                    lines.push(format!("#define {name}_ADDRESS   ({})", hex(*address)))
                }
                Address::Banked(addresses) => {
                    for (index, address) in addresses.iter().enumerate() {
                        lines.push(format!(
                            "#define {name}_ADDRESS_{index}   ({})",
                            hex(*address),
                        ));
                    }
                }
            }
            lines.push(format!("#define {name}_N_BITS    ({n_bits})"));
            if !named.is_empty() {
                let raw: Vec<String> = named
                    .iter()
                    .map(|field| format!("(reg.{} << {}U)", field.name, field.offset()))
                    .collect();
                lines.push(format!("#define {name}_RAW(reg)   ({})", raw.join(" | ")));
                lines.push(format!(
                    "#define {name}_FROM_RAW(raw) (({name}) {{ {} }})",
                    from_raw.join(", "),
                ));
            }
            lines.push(format!("typedef struct {name} {{"));
            lines.extend(members);
            lines.push(format!("}} {name};"));
        }
        Dialect::Cpp => {
            let address_t = &options.address_type;
            lines.push(format!("struct {name} {{"));
            lines.push(match address {
                Address::Single(address) => format!(
                    "    static constexpr {address_t} address = {};",
                    hex(*address),
                ),
                Address::Banked(addresses) => {
                    let list: Vec<String> = addresses.iter().copied().map(hex).collect();
                    format!(
                        "    static constexpr {address_t} address[{}] = {{{}}};",
                        addresses.len(),
                        list.join(", "),
                    )
                }
            });
            lines.push(format!("    static constexpr size_t n_bits = {n_bits};"));
            lines.push(String::new());
            if !named.is_empty() {
                let raw: Vec<String> = named
                    .iter()
                    .map(|field| format!("({} << {}U)", field.name, field.offset()))
                    .collect();
                lines.push(format!("    inline {} raw() {{", reg_t.name));
                lines.push(format!("        return {};", raw.join(" | ")));
                lines.push("    }".to_string());
                lines.push(String::new());
                lines.push(format!("    static {name} from_raw({} raw) {{", reg_t.name));
                lines.push("        return {".to_string());
                let initialisers: Vec<String> = from_raw
                    .iter()
                    .map(|initialiser| format!("            {initialiser}"))
                    .collect();
                lines.push(initialisers.join(",\n"));
                lines.push("        };".to_string());
                lines.push("    }".to_string());
                lines.push(String::new());
            }
            lines.extend(members);
            lines.push("};".to_string());
        }
    }
    Ok(lines.join("\n"))
}

pub fn render_masks_with(
    register: &Register,
    address: &Address,
    options: &CodegenOptions,
    reserved: &dyn IsReserved,
) -> Result<String> {
    let reg_t = options.integer_type(register)?;
    let name = format!("{}{}", options.prefix, register.name().to_uppercase());
    let address_t = &options.address_type;
    let n_bits = register.n_bits();
    let width = reg_t.width as usize;

    let mut lines = Vec::new();
    match (options.dialect, address) {
        (Dialect::C, Address::Single(address)) => lines.push(format!(
            "#define {name}_ADDRESS  (({address_t}) ({}U))",
            hex(*address),
        )),
        (Dialect::C, Address::Banked(addresses)) => {
            for (index, address) in addresses.iter().enumerate() {
                lines.push(format!(
                    "#define {name}_ADDRESS_{index}  (({address_t}) ({}U))",
                    hex(*address),
                ));
            }
        }
        (Dialect::Cpp, Address::Single(address)) => lines.push(format!(
            "constexpr {address_t} {name}_ADDRESS = {}U;",
            hex(*address),
        )),
        (Dialect::Cpp, Address::Banked(addresses)) => {
            let list: Vec<String> = addresses
                .iter()
                .map(|&address| format!("{}U", hex(address)))
                .collect();
            lines.push(format!(
                "constexpr {address_t} {name}_ADDRESS[{}] = {{{}}};",
                addresses.len(),
                list.join(", "),
            ));
        }
    }
    lines.push(match options.dialect {
        Dialect::C => format!("#define {name}_NBITS   ({n_bits}U)"),
        Dialect::Cpp => format!("constexpr size_t {name}_NBITS = {n_bits}U;"),
    });

    for field in register.fields() {
        if reserved.is_reserved(&field.name) {
            continue;
        }
        let symbol = format!("{name}_{}", field.name.to_uppercase());
        let offset = field.offset();
        let bits = format!("{:0>width$}", ones(field.length()));
        match options.dialect {
            Dialect::C => {
                lines.push(format!("#define {symbol}_POS   ({offset}U)"));
                lines.push(format!("#define {symbol}_MASK   (0b{bits}U << {symbol}_POS)"));
            }
            Dialect::Cpp => {
                let reg_t = &reg_t.name;
                lines.push(format!("constexpr {reg_t} {symbol}_POS = {offset}U;"));
                lines.push(format!("constexpr {reg_t} {symbol}_MASK = 0b{bits}U << {symbol}_POS;"));
            }
        }
    }
    Ok(lines.join("\n"))
}
