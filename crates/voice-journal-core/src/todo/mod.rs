mod item;
mod store;

pub use {
    item::{Todo, TodoFilter, TodoId},
    store::TodoStore,
};
