//! Block grid entry state and the constraints it is kept within.

use std::sync::{Arc, Weak};

use backoffice_core::observable::frozen::append_to_frozen_array;
use backoffice_core::{
    observe_multiple, BooleanState, ContextError, ContextToken, ControllerHost, Observable, State,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::scale::{relevant_column_span_options, ScaleStrategy};

// =============================================================================
// Models
// =============================================================================

/// An allowed column span of a block type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpanOption {
    /// Columns
    pub column_span: u32,
}

/// An area a block type defines inside itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockGridAreaType {
    /// Unique key
    pub key: String,
    /// Alias
    pub alias: String,
    /// Columns the area spans inside the block
    #[serde(default)]
    pub column_span: Option<u32>,
    /// Rows the area spans inside the block
    #[serde(default)]
    pub row_span: Option<u32>,
}

/// Configuration of one block type in a grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockGridType {
    /// Element type of the block content
    pub content_element_type_key: String,
    /// Allowed column spans
    pub column_span_options: Vec<ColumnSpanOption>,
    /// Smallest row span, 1 when unset
    pub row_min_span: Option<u32>,
    /// Largest row span, 1 when unset
    pub row_max_span: Option<u32>,
    /// Columns of the grid inside the block, the layout's when unset
    pub area_grid_columns: Option<u32>,
    /// Areas inside the block
    pub areas: Vec<BlockGridAreaType>,
    /// Edit content inline instead of in an overlay
    pub inline_editing: bool,
    /// Never open the content editor overlay
    pub force_hide_content_editor_in_overlay: bool,
}

/// Items placed in one area of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockGridLayoutArea {
    /// Area type key
    pub key: String,
    /// Nested entries
    #[serde(default)]
    pub items: Vec<BlockGridLayout>,
}

/// Layout of one entry in the grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockGridLayout {
    /// Key of the block content
    pub content_key: String,
    /// Columns spanned
    #[serde(default)]
    pub column_span: Option<u32>,
    /// Rows spanned
    #[serde(default)]
    pub row_span: Option<u32>,
    /// Nested areas
    #[serde(default)]
    pub areas: Vec<BlockGridLayoutArea>,
}

// =============================================================================
// Entries context
// =============================================================================

/// Context token of the enclosing entries collection.
pub const BLOCK_GRID_ENTRIES_CONTEXT: ContextToken<BlockGridEntriesContext> =
    ContextToken::new("UmbBlockGridEntriesContext");

/// The collection an entry sits in: a grid root or an area of a parent block.
#[derive(Debug)]
pub struct BlockGridEntriesContext {
    layout_columns: State<Option<u32>>,
}

impl BlockGridEntriesContext {
    /// Entries laid out on `layout_columns` columns.
    pub fn new(layout_columns: Option<u32>) -> Self {
        Self {
            layout_columns: State::new(layout_columns),
        }
    }

    /// Column count of the grid.
    pub fn layout_columns(&self) -> Observable<Option<u32>> {
        self.layout_columns.as_observable()
    }

    /// Current column count.
    pub fn get_layout_columns(&self) -> Option<u32> {
        self.layout_columns.get_value()
    }

    /// Change the column count. Entries re-fit themselves.
    pub fn set_layout_columns(&self, columns: Option<u32>) -> bool {
        self.layout_columns.set_value(columns)
    }
}

// =============================================================================
// Entry context
// =============================================================================

/// One entry of a block grid.
///
/// Once an enclosing [`BlockGridEntriesContext`] is found, the entry keeps
/// its layout inside the constraints of its block type: the column span
/// snaps to a relevant option, the row span stays within the type's range,
/// and the layout's areas follow the type's areas.
pub struct BlockGridEntryContext {
    host: ControllerHost,
    scale: Arc<dyn ScaleStrategy>,
    layout: State<Option<BlockGridLayout>>,
    block_type: State<Option<BlockGridType>>,
    relevant_column_span_options: State<Vec<u32>>,
    can_scale: BooleanState,
    area_grid_columns: State<Option<u32>>,
    entries: Mutex<Option<Arc<BlockGridEntriesContext>>>,
}

impl BlockGridEntryContext {
    /// Create the entry under `parent`, sizing it with `scale`.
    pub fn new(parent: &ControllerHost, scale: Arc<dyn ScaleStrategy>) -> Result<Arc<Self>, ContextError> {
        let host = parent.create_child("block-grid-entry")?;
        let context = Arc::new(Self {
            host: host.clone(),
            scale,
            layout: State::new(None),
            block_type: State::new(None),
            relevant_column_span_options: State::new(Vec::new()),
            can_scale: BooleanState::new(false),
            area_grid_columns: State::new(None),
            entries: Mutex::new(None),
        });
        let weak: Weak<Self> = Arc::downgrade(&context);
        host.consume(&BLOCK_GRID_ENTRIES_CONTEXT, move |entries| {
            if let Some(context) = weak.upgrade() {
                context.got_entries(entries);
            }
        })?;
        Ok(context)
    }

    /// The entry's own host.
    pub fn host(&self) -> &ControllerHost {
        &self.host
    }

    /// Set the layout being edited.
    pub fn set_layout(&self, layout: Option<BlockGridLayout>) -> bool {
        self.layout.set_value(layout)
    }

    /// Set the block type configuration.
    pub fn set_block_type(&self, block_type: Option<BlockGridType>) -> bool {
        self.block_type.set_value(block_type)
    }

    /// The layout.
    pub fn layout(&self) -> Observable<Option<BlockGridLayout>> {
        self.layout.as_observable()
    }

    /// Snapshot of the layout.
    pub fn get_layout(&self) -> Option<BlockGridLayout> {
        self.layout.get_value()
    }

    /// Column span of the layout.
    pub fn column_span(&self) -> Observable<Option<u32>> {
        self.layout
            .as_observable_part(|l| l.as_ref().and_then(|l| l.column_span))
    }

    /// Row span of the layout.
    pub fn row_span(&self) -> Observable<Option<u32>> {
        self.layout.as_observable_part(|l| l.as_ref().and_then(|l| l.row_span))
    }

    /// Areas stored in the layout.
    pub fn layout_areas(&self) -> Observable<Option<Vec<BlockGridLayoutArea>>> {
        self.layout.as_observable_part(|l| l.as_ref().map(|l| l.areas.clone()))
    }

    /// Column spans the block type allows, unfiltered.
    pub fn column_span_options(&self) -> Observable<Vec<u32>> {
        self.block_type.as_observable_part(|t| {
            t.as_ref()
                .map(|t| t.column_span_options.iter().map(|o| o.column_span).collect())
                .unwrap_or_default()
        })
    }

    /// Area grid columns configured on the block type.
    pub fn area_type_grid_columns(&self) -> Observable<Option<u32>> {
        self.block_type
            .as_observable_part(|t| t.as_ref().and_then(|t| t.area_grid_columns))
    }

    /// Area types of the block type.
    pub fn areas(&self) -> Observable<Vec<BlockGridAreaType>> {
        self.block_type
            .as_observable_part(|t| t.as_ref().map(|t| t.areas.clone()).unwrap_or_default())
    }

    /// `(min, max)` row span of the block type.
    pub fn min_max_row_span(&self) -> Observable<Option<(u32, u32)>> {
        self.block_type.as_observable_part(|t| t.as_ref().map(min_max_of))
    }

    /// Current `(min, max)` row span.
    pub fn get_min_max_row_span(&self) -> Option<(u32, u32)> {
        self.block_type.with(|t| t.as_ref().map(min_max_of))
    }

    /// Whether content is edited inline.
    pub fn inline_editing_mode(&self) -> Observable<bool> {
        self.block_type
            .as_observable_part(|t| t.as_ref().is_some_and(|t| t.inline_editing))
    }

    /// Whether the content editor is offered.
    pub fn show_content_edit(&self) -> Observable<bool> {
        self.block_type
            .as_observable_part(|t| !t.as_ref().is_some_and(|t| t.force_hide_content_editor_in_overlay))
    }

    /// Column span options that fit the layout, ascending.
    pub fn relevant_column_span_options(&self) -> Observable<Vec<u32>> {
        self.relevant_column_span_options.as_observable()
    }

    /// Snapshot of the relevant column span options.
    pub fn get_relevant_column_span_options(&self) -> Vec<u32> {
        self.relevant_column_span_options.get_value()
    }

    /// Whether the entry can be resized at all.
    pub fn can_scale(&self) -> Observable<bool> {
        self.can_scale.as_observable()
    }

    /// Column count of the grid inside this entry's areas.
    pub fn area_grid_columns(&self) -> Observable<Option<u32>> {
        self.area_grid_columns.as_observable()
    }

    /// Items placed in area `area_key`.
    pub fn layouts_of_area(&self, area_key: &str) -> Observable<Option<Vec<BlockGridLayout>>> {
        let area_key = area_key.to_string();
        self.layout.as_observable_part(move |l| {
            l.as_ref()?
                .areas
                .iter()
                .find(|a| a.key == area_key)
                .map(|a| a.items.clone())
        })
    }

    /// Type of area `area_key`.
    pub fn area_type(&self, area_key: &str) -> Observable<Option<BlockGridAreaType>> {
        let area_key = area_key.to_string();
        self.block_type.as_observable_part(move |t| {
            t.as_ref()?.areas.iter().find(|a| a.key == area_key).cloned()
        })
    }

    /// Replace the items of area `area_key`, adding the area if missing.
    pub fn set_layouts_of_area(&self, area_key: &str, layouts: Vec<BlockGridLayout>) -> bool {
        self.layout.patch(|layout| {
            layout.areas = append_to_frozen_array(
                &layout.areas,
                BlockGridLayoutArea {
                    key: area_key.to_string(),
                    items: layouts,
                },
                |a| a.key.clone(),
            );
        })
    }

    /// Resize to `requested` columns, snapped by the scale strategy.
    ///
    /// No-op until the entry knows its grid's column count.
    pub fn set_column_span(&self, requested: u32) -> bool {
        let Some(layout_columns) = self.entries.lock().as_ref().and_then(|e| e.get_layout_columns()) else {
            return false;
        };
        let relevant = self.get_relevant_column_span_options();
        let span = self.scale.column_span(requested, &relevant, layout_columns);
        if Some(span) == self.get_column_span() {
            return false;
        }
        tracing::debug!(requested, span, "block grid entry column span set");
        self.layout.patch(|layout| layout.column_span = Some(span))
    }

    /// Current column span.
    pub fn get_column_span(&self) -> Option<u32> {
        self.layout.with(|l| l.as_ref().and_then(|l| l.column_span))
    }

    /// Resize to `requested` rows, limited to the block type's range.
    ///
    /// No-op until the block type is known.
    pub fn set_row_span(&self, requested: u32) -> bool {
        let Some((min, max)) = self.get_min_max_row_span() else {
            return false;
        };
        let span = self.scale.row_span(requested, min, max);
        if Some(span) == self.get_row_span() {
            return false;
        }
        self.layout.patch(|layout| layout.row_span = Some(span))
    }

    /// Current row span.
    pub fn get_row_span(&self) -> Option<u32> {
        self.layout.with(|l| l.as_ref().and_then(|l| l.row_span))
    }

    /// Destroy the entry's host and complete its state.
    pub fn destroy(&self) {
        self.host.destroy();
        self.entries.lock().take();
        self.layout.complete();
        self.block_type.complete();
        self.relevant_column_span_options.complete();
        self.can_scale.complete();
        self.area_grid_columns.complete();
    }

    fn got_entries(&self, entries: Arc<BlockGridEntriesContext>) {
        *self.entries.lock() = Some(Arc::clone(&entries));
        if let Err(err) = self.observe_constraints(&entries) {
            tracing::warn!(error = %err, "block grid entry could not observe its entries");
        }
    }

    /// Register the observers keeping this entry within its constraints.
    /// Labels are fixed, so a replacing entries context replaces them.
    fn observe_constraints(&self, entries: &BlockGridEntriesContext) -> Result<(), ContextError> {
        let layout_columns = entries.layout_columns();

        let relevant = self.relevant_column_span_options.clone();
        let can_scale = self.can_scale.clone();
        self.host.observe(
            &observe_multiple((self.min_max_row_span(), self.column_span_options(), layout_columns.clone())),
            move |(min_max, options, columns)| {
                let (Some(columns), Some((min, max))) = (columns, min_max) else {
                    return;
                };
                let options = relevant_column_span_options(options, *columns);
                let scalable = options.len() > 1 || min != max;
                relevant.set_value(options);
                can_scale.set_value(scalable);
            },
            Some("observeScaleOptions"),
        )?;

        let area_grid_columns = self.area_grid_columns.clone();
        self.host.observe(
            &observe_multiple((self.area_type_grid_columns(), layout_columns.clone())),
            move |(area_columns, columns)| {
                area_grid_columns.set_value(area_columns.or(*columns));
            },
            Some("observeAreaGridColumns"),
        )?;

        let layout = self.layout.clone();
        let block_type = self.block_type.clone();
        self.host.observe(
            &observe_multiple((self.areas(), self.layout_areas())),
            move |(areas, layout_areas)| {
                let Some(layout_areas) = layout_areas else {
                    return;
                };
                if block_type.with(Option::is_none) {
                    return;
                }
                let fitted: Vec<BlockGridLayoutArea> = areas
                    .iter()
                    .map(|area| {
                        layout_areas
                            .iter()
                            .find(|a| a.key == area.key)
                            .cloned()
                            .unwrap_or_else(|| BlockGridLayoutArea {
                                key: area.key.clone(),
                                items: Vec::new(),
                            })
                    })
                    .collect();
                if &fitted != layout_areas {
                    layout.patch(|l| l.areas = fitted);
                }
            },
            Some("observeAreaValidation"),
        )?;

        let layout = self.layout.clone();
        let block_type = self.block_type.clone();
        let scale = Arc::clone(&self.scale);
        self.host.observe(
            &observe_multiple((
                self.layout(),
                self.column_span(),
                self.relevant_column_span_options(),
                layout_columns,
            )),
            move |(current, span, relevant, columns)| {
                let (Some(_), Some(columns)) = (current, columns) else {
                    return;
                };
                if block_type.with(Option::is_none) {
                    return;
                }
                let fitted = scale.column_span(span.unwrap_or(*columns), relevant, *columns);
                if Some(fitted) != *span {
                    layout.patch(|l| l.column_span = Some(fitted));
                }
            },
            Some("observeColumnSpanValidation"),
        )?;

        let layout = self.layout.clone();
        let scale = Arc::clone(&self.scale);
        self.host.observe(
            &observe_multiple((self.min_max_row_span(), self.row_span())),
            move |(min_max, span)| {
                let Some((min, max)) = min_max else {
                    return;
                };
                let fitted = scale.row_span(span.unwrap_or(1), *min, *max);
                if Some(fitted) != *span {
                    layout.patch(|l| l.row_span = Some(fitted));
                }
            },
            Some("observeRowSpanValidation"),
        )?;

        Ok(())
    }
}

fn min_max_of(block_type: &BlockGridType) -> (u32, u32) {
    (
        block_type.row_min_span.unwrap_or(1),
        block_type.row_max_span.unwrap_or(1),
    )
}

impl std::fmt::Debug for BlockGridEntryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockGridEntryContext")
            .field("host", &self.host.id())
            .field("column_span", &self.get_column_span())
            .field("row_span", &self.get_row_span())
            .finish()
    }
}
