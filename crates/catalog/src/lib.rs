pub mod schema;
pub mod lookup;

pub use schema::*;
pub use lookup::*;
