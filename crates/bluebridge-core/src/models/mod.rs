mod enums;
mod from_row;
mod structs;

pub use enums::*;
pub use structs::*;

#[cfg(test)]
mod tests;
