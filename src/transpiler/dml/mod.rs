//! SQL skeleton assembly for the four DML shapes.

pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use self::delete::build_delete;
pub use self::insert::build_insert;
pub use self::select::build_select;
pub use self::update::build_update;
