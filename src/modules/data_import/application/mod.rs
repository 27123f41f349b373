pub mod service;

pub use service::{ImportBackends, MassImportService, PosterRefreshReport};
