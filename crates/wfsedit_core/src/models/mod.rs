//! Data models for features, geometries and collections.

pub mod collection;
pub mod feature;
pub mod geometry;


pub use collection::CollectionRef;
pub use feature::{Feature, FeatureCollectionSnapshot, FeaturePage, Properties};
pub use geometry::{Bounds, Coord, Geometry};
