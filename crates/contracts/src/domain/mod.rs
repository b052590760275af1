pub mod a025_product;
pub mod a026_category;
