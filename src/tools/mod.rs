//! Tool system for function calling.

pub mod arguments;
pub mod dispatch;
pub mod hallucinate;
pub mod normalize;
pub mod schema;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use dispatch::ToolDispatcher;
pub use hallucinate::{HallucinatedCall, HallucinatedTool};
pub use normalize::to_jsonable;
pub use schema::{build_function_tools, FunctionToolDeclaration, ParametersSchema};
pub use tool::{FunctionTool, RunContext, Tool, ToolContext};
pub use types::{ParamSpec, Signature};
