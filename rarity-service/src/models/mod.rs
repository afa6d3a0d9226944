pub mod inaturalist;
pub mod query;
pub mod responses;
pub mod species;
