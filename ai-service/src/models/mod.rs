pub mod facts;

pub use facts::{FactSet, GenerateDescriptionRequest, GenerateDescriptionResponse};
