pub mod batch;
pub mod cut_paste;
