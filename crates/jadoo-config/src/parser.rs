//! KDL configuration parser

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, InvalidSymbolInfo};
use crate::model::*;

/// Load the configuration at `path`, falling back to defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        tracing::info!(
            "No configuration at {}, using built-in defaults",
            path.display()
        );
        return Ok(Config::default());
    }
    parse_config(path)
}

/// Parse a configuration file from the given path
pub fn parse_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config_str(&content)
}

/// Parse configuration from a string
pub fn parse_config_str(content: &str) -> Result<Config, ConfigError> {
    let doc: kdl::KdlDocument = content.parse().map_err(|e: kdl::KdlError| {
        // kdl uses an older miette version, so rebuild the span from offset/len
        let span = miette::SourceSpan::from((e.span.offset(), e.span.len()));
        ConfigError::ParseError {
            src: content.to_string(),
            span,
            source: e,
        }
    })?;

    let mut config = Config::default();
    let mut invalid_symbols = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "global" => {
                config.global = parse_global(node)?;
            }
            "sequence" => {
                config.sequence = parse_sequence(node, content, &mut invalid_symbols)?;
            }
            "ambient" => {
                config.ambient = first_string(node, "ambient")?
                    .parse()
                    .map_err(|message| ConfigError::Invalid { message })?;
            }
            "sounds" => {
                config.sounds = parse_sounds(node, content, &mut invalid_symbols)?;
            }
            name => {
                tracing::warn!("Unknown top-level node: {}", name);
            }
        }
    }

    if !invalid_symbols.is_empty() {
        return Err(ConfigError::InvalidSymbols { invalid_symbols });
    }

    Ok(config)
}

/// First string argument of a node, required.
fn first_string<'a>(node: &'a kdl::KdlNode, field: &str) -> Result<&'a str, ConfigError> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .ok_or_else(|| ConfigError::MissingField {
            field: format!("{} value (e.g., `{} \"...\"`)", field, field),
        })
}

fn parse_global(node: &kdl::KdlNode) -> Result<GlobalConfig, ConfigError> {
    let mut global = GlobalConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "log-level" => {
                    let val = first_string(child, "log-level")?;
                    global.log_level = val
                        .parse()
                        .map_err(|message| ConfigError::Invalid { message })?;
                }
                name => {
                    tracing::warn!("Unknown global config option: {}", name);
                }
            }
        }
    }

    Ok(global)
}

/// Read one symbol argument; digits may be written bare (`sequence 1 2`).
fn entry_symbol(
    entry: &kdl::KdlEntry,
    context: &str,
    source: &str,
    invalid_symbols: &mut Vec<InvalidSymbolInfo>,
) -> Option<Symbol> {
    let text = match (entry.value().as_string(), entry.value().as_i64()) {
        (Some(s), _) => s.to_string(),
        (None, Some(n)) => n.to_string(),
        _ => entry.value().to_string(),
    };

    match text.parse::<Symbol>() {
        Ok(symbol) => Some(symbol),
        Err(_) => {
            invalid_symbols.push(InvalidSymbolInfo {
                symbol: text,
                context: context.to_string(),
                src: source.to_string(),
                span: miette::SourceSpan::from((entry.span().offset(), entry.span().len())),
            });
            None
        }
    }
}

fn parse_sequence(
    node: &kdl::KdlNode,
    source: &str,
    invalid_symbols: &mut Vec<InvalidSymbolInfo>,
) -> Result<Vec<Symbol>, ConfigError> {
    let rejected_before = invalid_symbols.len();
    let sequence: Vec<Symbol> = node
        .entries()
        .iter()
        .filter(|entry| entry.name().is_none())
        .filter_map(|entry| entry_symbol(entry, "sequence", source, invalid_symbols))
        .collect();

    if sequence.is_empty() && invalid_symbols.len() == rejected_before {
        return Err(ConfigError::Invalid {
            message: "`sequence` needs at least one symbol".to_string(),
        });
    }

    Ok(sequence)
}

fn parse_sounds(
    node: &kdl::KdlNode,
    source: &str,
    invalid_symbols: &mut Vec<InvalidSymbolInfo>,
) -> Result<SoundConfig, ConfigError> {
    let mut sounds = SoundConfig::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "directory" => {
                    let val = first_string(child, "directory")?;
                    sounds.directory = shellexpand::tilde(val).into_owned().into();
                }
                "player" => {
                    let val = first_string(child, "player")?;
                    if val.trim().is_empty() {
                        return Err(ConfigError::Invalid {
                            message: "`player` must name a program".to_string(),
                        });
                    }
                    sounds.player = val.to_string();
                }
                "key" => {
                    let entries = child.entries();
                    let (Some(symbol_entry), Some(file)) =
                        (entries.first(), entries.get(1).and_then(|e| e.value().as_string()))
                    else {
                        return Err(ConfigError::MissingField {
                            field: "key binding (e.g., `key \"B\" \"b.wav\"`)".to_string(),
                        });
                    };
                    if let Some(symbol) = entry_symbol(symbol_entry, "sounds", source, invalid_symbols)
                    {
                        let path: PathBuf = shellexpand::tilde(file).into_owned().into();
                        sounds.keys.insert(symbol, path);
                    }
                }
                "receiving" => {
                    let val = first_string(child, "receiving")?;
                    sounds.receiving = shellexpand::tilde(val).into_owned().into();
                }
                name => {
                    tracing::warn!("Unknown sounds option: {}", name);
                }
            }
        }
    }

    Ok(sounds)
}
