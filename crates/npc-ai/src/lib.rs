//! Umbrella crate that re-exports the `npc-*` building blocks.
//!
//! Enable only the pieces you need with `default-features = false` and the `core`, `tools`,
//! `htn` or `nav` features.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use npc_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use npc_tools as tools;

#[cfg(feature = "htn")]
#[cfg_attr(docsrs, doc(cfg(feature = "htn")))]
pub use npc_htn as htn;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use npc_nav as nav;
