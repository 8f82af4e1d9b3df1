pub mod form;
pub mod midi;
pub mod net;
pub mod progress;
