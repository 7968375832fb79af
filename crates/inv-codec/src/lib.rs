//! Markup codec for the element inventory.
//!
//! Reads configuration documents into [`Element`](inv_types::Element) trees,
//! writes trees back out with stable indentation, and evaluates the
//! path-like selection expressions (`/LayoutInventory/*`) that pick the
//! managed elements out of a document.

pub mod error;
pub mod selection;
pub mod xml;

pub use error::{CodecError, CodecResult};
pub use selection::{Selection, Step};
pub use xml::{load_file, parse_document, save_file, write_document};
