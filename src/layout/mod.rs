//! Layout-to-page-flow reconstruction.
//!
//! Raw rendered nodes pass through three stages, each consuming the output
//! of the previous one:
//!
//! 1. [`extract`] filters invisible text and computes vertical gaps.
//! 2. [`paginate`] assigns every item to one fixed-height page by its center.
//! 3. [`composite`] pairs each page with its background and converts pixel
//!    geometry into paragraph spacing and indentation.

pub mod composite;
pub mod extract;
pub mod paginate;

pub use composite::{build_frames, compose, compose_page};
pub use extract::{extract, GapCursor, Rejection};
pub use paginate::{page_count, total_content_height, PageSlice, Pagination};
