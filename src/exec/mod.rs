pub mod exec_fn;
pub mod executor;

pub use exec_fn::ExecFn;
pub use executor::{ExecRef, Execute};
