pub mod cart;
pub mod company;
pub mod product;
pub mod reservation;
pub mod zone;
