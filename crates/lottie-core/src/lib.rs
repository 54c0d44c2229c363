pub mod animatable;
pub mod color;
pub mod errors;
pub mod expressions;
pub mod instance;
pub mod path;
pub mod properties;

pub use errors::{EvalError, LoadError, PathError};
pub use expressions::{compile, matching_templates, CompiledExpression, ExprValue, TemplateKind};
pub use instance::AnimationInstance;
pub use path::{AddressingPath, ParamTarget, PathStep};
pub use properties::{discover, reset, write, ParamKind, ParameterDescriptor, Scope};
