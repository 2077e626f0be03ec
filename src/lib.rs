/// Decoded HAM/VHAM records and the collaborator traits the editor uses
pub mod data;
/// Editor databases for base and expansion files
pub mod edit;
/// Error definitions
pub mod error;
/// Game concept types (fixed-point vectors, AI types, drop contents)
pub mod game_types;
/// Polygon model editing: guns, animation and texture tables
pub mod models;
/// Generic wrapper for values that may or may not match a known variant.
pub mod recognized;

#[cfg(test)]
mod test_support;
