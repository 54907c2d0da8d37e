mod model;

pub use model::RunInputs;
