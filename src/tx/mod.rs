//! Transaction construction.
//!
//! - [`builders`] turn typed arguments into a [`TxPlan`] without I/O
//! - [`args`] parses tagged Move call arguments
//! - [`lower`] resolves objects, gas and price into `TransactionData`
//! - [`submit`] signs and executes, dry-runs or dev-inspects

pub mod args;
pub mod builders;
pub mod lower;
pub mod plan;
pub mod submit;

pub use args::{parse_tagged_arg, parse_tagged_args, TaggedArg};
pub use lower::{lower, lower_kind, GasConfig, ResolvedObject};
pub use plan::{PlanArg, PlanBuilder, PlanCommand, PlanInput, TxPlan};
pub use submit::{dev_inspect, dry_run, execute, GasEstimate};
