//! Configuration module for azsubsyn.
//!
//! This module handles all configuration-related functionality:
//! - Reading the `AZSUBSYN_*` environment variables into a [`SyncConfig`]
//! - Loading an optional `.env` file
//! - Cloud endpoint overrides for sovereign clouds

mod parser;
mod spec;

pub use parser::{ConfigParser, DEFAULT_ENV_FILE, ENV_PREFIX, load_dotenv, side_var_name};
pub use spec::{
    AzureEndpoints, DEFAULT_AUTHORITY_HOST, DEFAULT_RESOURCE_MANAGER_ENDPOINT, Side,
    SubscriptionConfig, SyncConfig,
};
