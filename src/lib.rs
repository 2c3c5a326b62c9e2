//! # metapack
//!
//! Housekeeping for the `.meta` side-car files that sit next to every asset in
//! a project tree.
//!
//! ## Key Modules
//!
//! - [`clean`]: deletes every `.meta` file under the working root.
//! - [`archive`]: bundles copies of the `.meta` files into `MetaFilesCompressed.zip`.
//! - [`restore`]: extracts that archive back into the tree.
//! - [`config`]: the working root and run options threaded through every operation.
//! - [`walk`]: the directory walk and suffix filter the operations share.
//!
//! ## Examples
//!
//! ```no_run
//! use metapack::{archive, Config};
//!
//! let report = archive::compress(&Config::new("/path/to/project"))?;
//! println!("archived {} files", report.files.len());
//! # Ok::<(), metapack::MetaError>(())
//! ```

pub mod archive;
pub mod clean;
pub mod cli;
pub mod cli_runner;
pub mod config;
pub mod error;
pub mod logging;
pub mod restore;
pub mod walk;

pub use config::Config;
pub use error::{ErrorClass, MetaError};
