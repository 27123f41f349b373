pub mod anime;
pub mod data_import;
pub mod provider;
