pub mod browse;
pub mod dispatcher;
pub mod main_types;
pub mod terminal;
