//! # tsetlink API
//!
//! Local proxies for a dataflow engine running in another process.
//!
//! ```rust,no_run
//! use tsetlink_api::config::EnvironmentOptions;
//! use tsetlink_api::environment::Environment;
//! use tsetlink_core::function::FunctionDescriptor;
//!
//! let env = Environment::init(EnvironmentOptions::named("sum")).unwrap();
//! let numbers = env.parallelize_list(vec![1, 2, 3], 2).unwrap();
//! let total = numbers
//!     .reduce(&FunctionDescriptor::reduce("sum"))
//!     .unwrap()
//!     .cache()
//!     .unwrap();
//! for partition in total.partitions().unwrap() {
//!     println!("{}", partition.first_or_default(0i64).unwrap());
//! }
//! ```
//!
//! - [`environment`] — [`Environment`](environment::Environment): connects,
//!   submits on the bootstrap leg, creates datasets on the session leg.
//! - [`tset`] — [`TSet`](tset::TSet) and [`KeyedTSet`](tset::KeyedTSet)
//!   dataset proxies.
//! - [`partition`] — [`DataPartition`](partition::DataPartition) and its
//!   lazy consumer.
//! - [`config`] — gateway settings and submission options.

pub mod config;
pub mod environment;
pub mod functions;
pub mod partition;
pub mod tset;

pub use tsetlink_core;
