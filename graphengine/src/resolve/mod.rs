//! The resolver engine: directive-aware selection-set traversal, typed
//! argument/result conversions, and the top-level request pipeline.

pub mod directives;
pub mod modifiers;
pub mod object;
pub mod request;

pub use directives::DirectiveState;
pub use modifiers::{FromArgumentValue, ModifiedArgument, ModifiedResult, ToResultValue};
pub use object::{FieldContext, FieldResolverFn, FragmentMap, Object, SelectionContext};
pub use request::{resolve, OperationRoots, ResolveMode, Response};
