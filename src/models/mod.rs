/// Gun transfer between robot, reactor and ship records and their models
pub mod guns;
/// Robot joint runs and model animation matrices
pub mod joints;
/// Object-bitmap table generation and texture-name reconstruction
pub mod obj_bitmaps;
/// Polygon model records and their editor-side data
pub mod polymodel;
