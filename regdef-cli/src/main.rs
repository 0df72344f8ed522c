mod logger;

use std::fs::read_to_string;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use regdef::doc::{self, Entry, Item};
use regdef::{Address, CodegenOptions, Dialect, Style};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Command {
    /// Print every register's address and field layout.
    Show,
    /// Generate register definitions.
    Code,
}

#[derive(Parser)]
#[command(name = "regdef", version, about)]
struct Args {
    command: Command,

    /// Register-map document.
    regdef: PathBuf,

    /// Generate C instead of C++.
    #[arg(short = 'C')]
    c: bool,

    /// Drop comment entries from the output.
    #[arg(short = 'c', long)]
    no_comments: bool,

    /// Prefix for every generated symbol.
    #[arg(short, long, default_value = "")]
    prefix: String,

    /// Register integer width.
    #[arg(short, long, default_value_t = 32)]
    n_bits: u32,

    /// Generate flat position and mask constants instead of bitfield structs.
    #[arg(long)]
    masks: bool,
}

impl Args {
    fn defaults(&self) -> CodegenOptions {
        CodegenOptions {
            integer_width: Some(self.n_bits),
            prefix: self.prefix.clone(),
            dialect: if self.c { Dialect::C } else { Dialect::Cpp },
            ..CodegenOptions::default()
        }
    }

    fn style(&self) -> Style {
        if self.masks {
            Style::Masks
        } else {
            Style::Struct
        }
    }
}

fn format_address(address: &Address) -> String {
    match address {
        Address::Single(address) => format!("{address:#04x}"),
        Address::Banked(addresses) => {
            let list: Vec<String> = addresses.iter().map(|a| format!("{a:#04x}")).collect();
            format!("[{}]", list.join(", "))
        }
    }
}

fn show(entry: &Entry) {
    println!("ADDRESS = {}", format_address(&entry.address));
    println!("{:#}", entry.register);
}

fn code(entry: &Entry, style: Style) -> Result<()> {
    let code = entry
        .code(style)
        .with_context(|| format!("generating register {}", entry.register.name()))?;
    println!("{code}");
    println!();
    Ok(())
}

fn main() -> Result<()> {
    logger::init();
    let args = Args::parse();

    let text = read_to_string(&args.regdef)
        .with_context(|| format!("reading {}", args.regdef.display()))?;
    let items = doc::load(&text, &args.defaults(), !args.no_comments)
        .with_context(|| format!("loading {}", args.regdef.display()))?;
    log::info!("loaded {} item(s) from {}", items.len(), args.regdef.display());

    for item in &items {
        match (item, args.command) {
            (Item::Comment(comment), _) => println!("{comment}"),
            (Item::Register(entry), Command::Show) => show(entry),
            (Item::Register(entry), Command::Code) => code(entry, args.style())?,
        }
    }
    Ok(())
}
