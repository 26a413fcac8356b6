pub mod envfilter;
