//! Caption themes: abstract paint specs, the theme table and the style resolver.

pub(crate) mod color;
pub(crate) mod resolve;
pub(crate) mod spec;
pub(crate) mod table;
