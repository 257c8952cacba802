/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/10/26
******************************************************************************/

//! # FerroFix Dictionary
//!
//! Data dictionary for the FerroFix engine.
//!
//! This crate provides:
//! - **Schema definitions**: Field, message, and repeating group definitions
//! - **Built-in dictionary**: Session layer plus basic order flow per version
//! - **Runtime validation**: Message validation against dictionary rules

pub mod builtin;
pub mod schema;
pub mod validation;

pub use schema::{
    Dictionary, FieldDef, FieldRef, FieldType, GroupDef, MessageCategory, MessageDef, Version,
};
pub use validation::{ValidationError, ValidationOptions, Validator};
