//! Value types shared by CareCall services.

pub mod id;
pub mod language;
pub mod pagination;
pub mod phone;
