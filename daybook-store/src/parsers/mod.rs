pub mod duration;
pub mod side_channel;
