pub mod diagnosis;
pub mod patient;
pub mod symptom;

pub use diagnosis::*;
pub use patient::*;
pub use symptom::*;
