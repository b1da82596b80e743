pub mod enrollment;
pub mod member;
pub mod promo;
