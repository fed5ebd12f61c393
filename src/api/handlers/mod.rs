pub mod health;
pub mod r2;
