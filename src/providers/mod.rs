pub mod bcb_ptax;
pub mod util;

pub use bcb_ptax::PtaxProvider;
