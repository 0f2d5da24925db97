pub mod filter;
pub mod normalize;
