//! Debounced search: the timing primitive, the coordinator that dispatches
//! settled terms, and the query-string filter of list screens.

pub mod coordinator;
pub mod debounce;
pub mod table;

pub use coordinator::{SearchCallback, SearchCoordinator, SearchOptions, SearchState};
pub use debounce::{Debounce, Debouncer};
pub use table::{TableFilter, TableQuery};
