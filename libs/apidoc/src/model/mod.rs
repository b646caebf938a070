//! Author-side building blocks of a document: the values route declarations
//! and top-level metadata are made of.

mod content;
mod info;
mod parameter;
mod response;
mod server;
mod tag;

pub use content::{media_type, Content};
pub use info::{Contact, Info, InfoObject, License};
pub use parameter::{ParamLocation, Parameter};
pub use response::{RequestBody, Response};
pub use server::{Server, ServerVariable};
pub use tag::{ExternalDocs, Tag};
