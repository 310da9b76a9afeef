//! Data types for the report model.

mod address;
mod cell;
mod grid;
mod merge;
mod selection;
mod workbook;

pub use address::*;
pub use cell::*;
pub use grid::*;
pub use merge::*;
pub use selection::*;
pub use workbook::*;

pub(crate) use merge::offset_index;
