pub mod instrument;
pub mod position;
pub mod price;
pub mod transaction;
