//! Desktop implementations of the location service boundaries: a
//! file-backed consent store, scripted position sources, and reverse
//! geocoding over HTTP.

pub mod consent;
pub mod nominatim;
pub mod simulated;
