pub mod ascii;
pub mod frame_rate;
pub mod human_input;
pub mod options;
