//! Path classification, normalization and cross-host resolution.
//!
//! Recorded link paths may come from a machine with a different path
//! grammar than the one recreating them. This module converts between the
//! four grammars a record can carry:
//!
//! - **POSIX**: `/home/me/file`
//! - **Windows-local**: `C:\Users\me\file`
//! - **Windows-UNC**: `\\server\share\file`
//! - **Windows mapped drive**: `Z:\file` where `Z:` maps to a share
//!
//! # Key Concepts
//!
//! ## Normalization
//!
//! [`normalize`] is lexical: separators are unified, `.` and redundant
//! `..` segments are removed and drive letters are upper-cased. It never
//! consults the filesystem, so it works on paths from other machines.
//!
//! ## Portable form
//!
//! [`to_portable`] writes every path with forward slashes and expands
//! mapped drives to their share.
//!
//! ## Host resolution
//!
//! [`to_local`] maps a recorded path onto the current host using an
//! explicit [`HostContext`] snapshot and an optional [`PrefixRewrite`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use symkeep::path::{HostContext, PathFlavor, PathResolver};
//!
//! let host = HostContext::windows().with_drive('Z', r"\\server\share").unwrap();
//! let resolver = PathResolver::new(Arc::new(host));
//!
//! let flavor = resolver.classify(r"Z:\reports\q3.xlsx");
//! assert_eq!(flavor, PathFlavor::WindowsMappedDrive);
//! assert_eq!(
//!     resolver.to_portable(r"Z:\reports\q3.xlsx", flavor).unwrap(),
//!     "//server/share/reports/q3.xlsx"
//! );
//! ```

pub mod flavor;
pub mod host;
pub mod local;
pub mod parts;
pub mod rebase;
pub mod resolver;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

pub use flavor::{classify, classify_native, PathFlavor};
pub use host::{HostContext, HostPlatform, PathPreference, SharedHostContext};
pub use parts::{normalize, Anchor, PathParts};
pub use rebase::{rebase, PrefixRewrite, RebaseDirection};
pub use resolver::{to_local, to_portable, PathResolver};
