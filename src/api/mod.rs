pub mod blueprints;
pub mod compositions;
pub mod generate;
pub mod health;
pub mod settings;

mod io;
