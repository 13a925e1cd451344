// Adapters layer: concrete implementations of the domain ports (CSV records, local color table store).

pub mod csv_source;
pub mod local_store;

pub use csv_source::CsvRecordSource;
pub use local_store::LocalStore;
