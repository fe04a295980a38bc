//! Paged and infinite lists: the cursor state machine, its async driver and
//! the worker combobox built on both.

pub mod controller;
pub mod cursor;
pub mod picker;

pub use controller::{InfiniteList, PageSource};
pub use cursor::{
    CursorState, PageCursor, PageRequest, PagedFetchController, RequestKind, Resolution,
    ScrollEdge,
};
pub use picker::{WorkerPicker, WorkersSource};
