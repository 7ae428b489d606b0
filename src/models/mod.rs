pub mod bar;
pub mod decision;
pub mod draw;
pub mod overlay;

pub use bar::{Bar, BarSeries};
pub use decision::*;
pub use draw::*;
pub use overlay::*;
