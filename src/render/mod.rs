//! CPU frame renderer: source frame scaling plus animated caption boxes.

pub(crate) mod blur;
pub(crate) mod caption;
pub(crate) mod composite;
pub(crate) mod frame;
pub(crate) mod text;
