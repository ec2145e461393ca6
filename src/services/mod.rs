pub mod access;
pub mod catalog;
pub mod gallery;
pub mod image;
pub mod qr;
pub mod storage;
pub mod upload;
pub mod validate;
