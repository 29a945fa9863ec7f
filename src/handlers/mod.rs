//! HTTP handlers

pub mod health;
pub mod form;
pub mod detect;
pub mod vocabulary;
