use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use twinprop::json::{JsonReader, JsonWriter, TokenKind};
use twinprop::{
    begin_component, begin_response_status, properties_version, MessageType, PropertiesOptions,
    PropertyIter, PropertyKind, TwinError,
};

#[derive(Parser, Debug)]
#[command(name = "twinprop", version, about = "Device twin property codec CLI")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every property of a twin document, one per line
    Walk {
        /// Registered component name (repeatable)
        #[arg(long = "component")]
        components: Vec<String>,
        /// JSON file with codec options
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = KindArg::Writable)]
        kind: KindArg,
        #[arg(long, value_enum, default_value_t = MessageArg::Patch)]
        message: MessageArg,
        /// Input file
        file: PathBuf,
    },
    /// Print the root $version of a twin document
    Version {
        #[arg(long, value_enum, default_value_t = MessageArg::Patch)]
        message: MessageArg,
        /// Input file
        file: PathBuf,
    },
    /// Print a writable-property acknowledgement
    Ack {
        /// Property being acknowledged
        #[arg(long)]
        name: String,
        /// Status code
        #[arg(long, allow_negative_numbers = true)]
        code: i32,
        /// Acknowledged $version
        #[arg(long, allow_negative_numbers = true)]
        version: i32,
        #[arg(long)]
        description: Option<String>,
        /// Acknowledged value as a JSON scalar
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },
    /// Print a component holding one string property
    Component {
        #[arg(long)]
        name: String,
        #[arg(long)]
        property: String,
        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
#[clap(rename_all = "lower")]
enum MessageArg {
    Full,
    Patch,
}

impl From<MessageArg> for MessageType {
    fn from(value: MessageArg) -> Self {
        match value {
            MessageArg::Full => MessageType::FullDocument,
            MessageArg::Patch => MessageType::WritablePatch,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug)]
#[clap(rename_all = "lower")]
enum KindArg {
    Writable,
    Reported,
}

impl From<KindArg> for PropertyKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Writable => PropertyKind::Writable,
            KindArg::Reported => PropertyKind::Reported,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Twin(#[from] TwinError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("value is not valid JSON: {0}")]
    ValueSyntax(#[source] serde_json::Error),
    #[error("value must be a JSON string, integer, boolean or null")]
    UnsupportedValue,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match cli.command {
        Commands::Walk {
            components,
            config,
            kind,
            message,
            file,
        } => cmd_walk(&file, config.as_deref(), components, kind, message),
        Commands::Version { message, file } => cmd_version(&file, message),
        Commands::Ack {
            name,
            code,
            version,
            description,
            value,
        } => cmd_ack(&name, code, version, description.as_deref(), &value),
        Commands::Component {
            name,
            property,
            value,
        } => cmd_component(&name, &property, &value),
    }
}

fn cmd_walk(
    path: &Path,
    config: Option<&Path>,
    components: Vec<String>,
    kind: KindArg,
    message: MessageArg,
) -> Result<(), CliError> {
    let mut options = match config {
        Some(config) => load_options(config)?,
        None => PropertiesOptions::default(),
    };
    options.components.extend(components);
    let registry = options.registry()?;
    tracing::debug!(components = registry.len(), path = %path.display(), "walking document");

    let bytes = fs::read(path)?;
    let mut reader = JsonReader::with_limits(&bytes, options.reader_limits()?);
    let mut iter = PropertyIter::new(&mut reader, message.into(), kind.into(), &registry)?;

    let mut stdout = io::stdout().lock();
    while let Some(property) = iter.next_property()? {
        let component = property.component().unwrap_or("-");
        let name = property.name_str()?;
        let value = property.value()?;
        match value.token_kind() {
            TokenKind::BeginObject => writeln!(stdout, "{component}\t{name}\t<object>")?,
            TokenKind::BeginArray => writeln!(stdout, "{component}\t{name}\t<array>")?,
            TokenKind::String => {
                writeln!(stdout, "{component}\t{name}\t\"{}\"", value.token_str()?)?
            }
            _ => writeln!(stdout, "{component}\t{name}\t{}", value.token_str()?)?,
        }
    }
    Ok(())
}

fn cmd_version(path: &Path, message: MessageArg) -> Result<(), CliError> {
    let bytes = fs::read(path)?;
    let reader = JsonReader::new(&bytes);
    println!("{}", properties_version(&reader, message.into())?);
    Ok(())
}

fn cmd_ack(
    name: &str,
    code: i32,
    version: i32,
    description: Option<&str>,
    value: &str,
) -> Result<(), CliError> {
    let value: serde_json::Value = serde_json::from_str(value).map_err(CliError::ValueSyntax)?;
    let capacity = 64 + 6 * (name.len() + description.map_or(0, str::len) + value.to_string().len());
    let mut buf = vec![0u8; capacity];
    let mut writer = JsonWriter::new(&mut buf);

    writer.begin_object()?;
    let mut ack = begin_response_status(&mut writer, name, code, version, description)?;
    match &value {
        serde_json::Value::String(text) => ack.string(text)?,
        serde_json::Value::Bool(flag) => ack.bool(*flag)?,
        serde_json::Value::Null => ack.null()?,
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(number) => ack.int64(number)?,
            None => return Err(CliError::UnsupportedValue),
        },
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            return Err(CliError::UnsupportedValue)
        }
    }
    ack.end()?;
    writer.end_object()?;
    println!("{}", writer.as_str());
    Ok(())
}

fn cmd_component(name: &str, property: &str, value: &str) -> Result<(), CliError> {
    let capacity = 64 + 6 * (name.len() + property.len() + value.len());
    let mut buf = vec![0u8; capacity];
    let mut writer = JsonWriter::new(&mut buf);

    writer.begin_object()?;
    let mut component = begin_component(&mut writer, name)?;
    component.property_name(property)?;
    component.string(value)?;
    component.end()?;
    writer.end_object()?;
    println!("{}", writer.as_str());
    Ok(())
}

fn load_options(path: &Path) -> Result<PropertiesOptions, CliError> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|source| CliError::Config {
        path: path.to_path_buf(),
        source,
    })
}
