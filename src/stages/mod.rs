//! Individual analysis stages, in pipeline order. Graph stages take a
//! `RegionGraph` by value and hand back a new one.

pub mod skeleton;
pub mod prune;
pub mod simplify;
pub mod classify;
pub mod merge;
pub mod choke_sides;
pub mod regions;
pub mod closest;
pub mod clustering;
pub mod placement;
pub mod properties;
