pub mod compare;
pub mod describe;
pub mod prompts;
pub mod stage;
