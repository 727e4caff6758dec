pub mod chain_file;
pub mod config;
pub mod dnssec;
pub mod error;

pub use chain_file::ChainFile;
pub use config::ValidatorConfig;
pub use dnssec::{DnsSecError, DnsSecValidator, TrustAnchorStore, TrustChain, ValidationResult};
pub use error::ConfigError;
