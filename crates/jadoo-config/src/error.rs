use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Failed to parse KDL")]
    #[diagnostic(code(jadoo::config::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        #[source]
        source: kdl::KdlError,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(jadoo::config::invalid))]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    #[diagnostic(code(jadoo::config::missing_field))]
    MissingField { field: String },

    #[error("{} invalid symbol(s) in configuration", .invalid_symbols.len())]
    #[diagnostic(
        code(jadoo::config::invalid_symbol),
        help("symbols are single letters or digits, e.g. \"B\" or \"7\"")
    )]
    InvalidSymbols {
        #[related]
        invalid_symbols: Vec<InvalidSymbolInfo>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One rejected symbol, with the place it was written.
#[derive(Error, Diagnostic, Debug)]
#[error("invalid symbol '{symbol}' in {context}")]
pub struct InvalidSymbolInfo {
    pub symbol: String,
    /// Node the symbol appeared in (e.g. `sequence`)
    pub context: String,
    #[source_code]
    pub src: String,
    #[label("not a single letter or digit")]
    pub span: miette::SourceSpan,
}
