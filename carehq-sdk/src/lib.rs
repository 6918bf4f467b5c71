//! SDK for the CareHQ REST API.
//!
//! * [`params`] – the multi-valued parameter container used for query
//!   strings, form bodies and signatures.
//! * [`signature`] – request signing.
//! * [`error`] – mapping of failed responses onto [`ApiErrorKind`].
//! * [`config`] – credentials and connection settings.
//! * [`client`] – the HTTP client itself (feature `client`).

pub mod config;
pub mod error;
pub mod params;
pub mod signature;

#[cfg(feature = "client")]
pub mod client;

pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ApiErrorKind, ArgErrors};
pub use params::{MultiValueDict, ParamValue};

#[cfg(feature = "client")]
pub use client::{ApiClient, ClientError, RateLimit};
#[cfg(feature = "client")]
pub use reqwest::Method;
