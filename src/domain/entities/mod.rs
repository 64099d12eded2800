pub mod collection;
pub mod item;
pub mod trash_entry;
