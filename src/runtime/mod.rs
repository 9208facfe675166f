pub mod environment;
pub mod macros;
pub mod value;

pub use self::environment::{
    global_of, shared, Binding, DeriveScope, Environment, FindResult, GcShared,
};
pub use self::macros::Macro;
pub use self::value::{Builtin, Lambda, NativeFn, Number, Procedure, Value, LINE_END_SYMBOL};
