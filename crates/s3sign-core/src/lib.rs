//! Core types, configuration, and name generation for s3sign.
//!
//! This crate holds the pieces shared by the signing library, the command
//! line front end, and the integration harness: the environment-driven
//! [`SignerConfig`], the [`AwsRegion`] newtype, and [`NameGenerator`], an
//! explicitly owned generator for unique bucket and object names.

mod config;
mod error;
mod names;
mod types;

pub use config::SignerConfig;
pub use error::{CoreError, CoreResult};
pub use names::NameGenerator;
pub use types::AwsRegion;
