pub mod adapter;

pub use adapter::ShikimoriAdapter;
