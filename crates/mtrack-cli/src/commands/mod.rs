pub mod split;
pub mod upgrade;
pub mod versions;
