mod markup;
mod wrap;

pub use markup::decode_markup;
pub use wrap::{wrap, WRAP_MARGIN_PX};
