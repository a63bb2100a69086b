//! Java parsing, symbol resolution and the per-project scoring pipeline

pub mod languages;
pub mod parser_pool;
pub mod resolver;
pub mod runner;


pub use languages::{LanguageExtractor, get_extractor};
pub use parser_pool::{IndexError, ParseRequest, ParseResult, ParserPool, create_parser_pool};
pub use resolver::SymbolResolver;
pub use runner::{ParseStats, ProjectIndex, ProjectRunner, ProjectScore, project_name};
