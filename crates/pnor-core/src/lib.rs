//! pnor-core - Host firmware management for static-layout PNOR flash
//!
//! This crate discovers the version of the single host firmware image
//! stored on a PNOR, publishes it as one activatable entity, and clears
//! partitions on factory reset while the flash access mediator is
//! suspended.
//!
//! All flash access goes through an external tool (see [`tool::FlashTool`])
//! and the mediator is reached through [`mediator::AccessMediator`], so both
//! can be replaced for testing.
//!
//! # Example
//!
//! ```ignore
//! use pnor_core::config::Config;
//! use pnor_core::mediator::HiomapdMediator;
//! use pnor_core::tool::{PflashTool, Pnor};
//! use pnor_core::{ActivationEngine, ResetEngine};
//!
//! let config = Config::default();
//! let tool = PflashTool::from_config(&config.tool);
//!
//! let mut activation = ActivationEngine::new(Pnor::new(&tool), &config);
//! if let Some(id) = activation.process_image().id() {
//!     println!("Host firmware {}", id);
//! }
//!
//! let mediator = HiomapdMediator::new(config.mediator.clone());
//! let mut reset = ResetEngine::new(Pnor::new(&tool), mediator, &config);
//! let report = reset.factory_reset();
//! println!("{} partition(s) failed", report.failed().count());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod activation;
pub mod config;
pub mod error;
pub mod inventory;
pub mod mediator;
pub mod reset;
pub mod tool;
pub mod version;

pub use activation::ActivationEngine;
pub use error::{Error, Result};
pub use reset::ResetEngine;
