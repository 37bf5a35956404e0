//! Minimal CLI parsing for the schema tool.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Default, PartialEq)]
pub struct CliOptions {
    /// Overrides `COLLECTIONS_PATH`
    pub collections: Option<PathBuf>,
    pub expose_query_language: bool,
    /// Print the schema SDL instead of running a query
    pub print_sdl: bool,
    /// Query text; read from stdin when absent
    pub query: Option<String>,
    /// Variables as a JSON object
    pub variables: Option<String>,
}

impl CliOptions {
    pub fn from_args() -> Self {
        Self::parse(env::args().skip(1))
    }

    pub fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--expose-query-language" => options.expose_query_language = true,
                "--sdl" => options.print_sdl = true,
                "--collections" => options.collections = args.next().map(PathBuf::from),
                "--query" => options.query = args.next(),
                "--variables" => options.variables = args.next(),
                _ if arg.contains('=') => {
                    if let Some((flag, value)) = arg.split_once('=') {
                        match flag {
                            "--collections" => options.collections = Some(value.into()),
                            "--query" => options.query = Some(value.to_string()),
                            "--variables" => options.variables = Some(value.to_string()),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        options
    }
}
