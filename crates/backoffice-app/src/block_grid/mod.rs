//! Block grid entries
//!
//! Each entry consumes the enclosing [`BlockGridEntriesContext`] and keeps
//! its layout fitted to its block type and the grid's column count.
//!
//! # Usage
//!
//! ```rust,ignore
//! root.provide(&BLOCK_GRID_ENTRIES_CONTEXT, Arc::new(BlockGridEntriesContext::new(Some(12))))?;
//! let entry = BlockGridEntryContext::new(&root, Arc::new(SnapToOptions))?;
//! entry.set_block_type(Some(block_type));
//! entry.set_layout(Some(layout));
//! entry.set_column_span(5);
//! ```

mod entry;
mod scale;

pub use entry::{
    BlockGridAreaType, BlockGridEntriesContext, BlockGridEntryContext, BlockGridLayout, BlockGridLayoutArea,
    BlockGridType, ColumnSpanOption, BLOCK_GRID_ENTRIES_CONTEXT,
};
pub use scale::{
    calc_column_span, clamp_row_span, closest_column_span_option, relevant_column_span_options, ScaleStrategy,
    SnapToOptions,
};
