//! Tenant context resolution for multi-organization apps: reconcile explicit query choices,
//! cached hints, and live membership lists into exactly one active organization per session.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod directory;
pub mod error;
pub mod memo;
pub mod obs;
pub mod org;
pub mod policy;
pub mod publisher;
pub mod resolver;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
