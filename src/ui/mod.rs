pub mod overview;
pub mod panels;
pub mod plot;
pub mod reference;
