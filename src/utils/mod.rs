pub mod amount;
pub mod password;
pub mod token;
pub mod token_generator;
