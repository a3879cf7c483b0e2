pub mod cli;
pub mod config;
pub mod executor;
pub mod parser;


// Re-export the engine surface
pub use config::{ConfigError, EngineConfig, MissingVariablePolicy};
pub use executor::{
    resolve_expression, FunctionRegistry, NativeFn, NoVariables, Resolution, ResolveError,
    Resolver, VariableProvider,
};
pub use executor::types::{Node, Value};
pub use parser::{
    find_referenced_variables, fixup_expression, parse_expression, ExpressionParser,
    SourcePosition, SyntaxError,
};
