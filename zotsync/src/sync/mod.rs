pub mod library;
pub mod model;
pub mod paths;
pub mod remote;
pub mod transfer;
pub mod tree;
pub mod walker;
