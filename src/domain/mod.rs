pub mod catalog;
pub mod record;

pub use catalog::{CatalogEntry, CountryProviderCatalog};
pub use record::{
    release_window, DetailField, DetailFields, FieldResult, FieldUnavailable,
    NormalizedMovieRecord, RawMovieRecord, ReleaseDate, TitleLink,
};
